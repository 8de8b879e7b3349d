//! Lifecycle glue between a session host and the audit components
//!
//! `ReportingService` owns the ledger, replay table, assembler and
//! dispatcher. Hosts either call the `on_*` handlers from their own
//! callbacks or push [`HostEvent`]s into a channel drained by
//! [`ReportingService::run_events`].

use crate::access::{self, ClientConfigSection};
use crate::artifact::ArtifactStore;
use crate::assembler::AuditLogAssembler;
use crate::config::AuditConfig;
use crate::dispatcher::{ReportDispatcher, ReportHandle};
use crate::error::Result;
use crate::host::{HostEvent, SessionClient, SessionHost};
use crate::ledger::EventLedger;
use crate::replay::ReplayTable;
use crate::transport::{HttpWebhookTransport, ReportTransport};
use crate::types::{now_millis, AuditClient, AuditEvent, AuditLog, ClientId, Replay, ReplayId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Builder for [`ReportingService`]
pub struct ReportingServiceBuilder {
    config: AuditConfig,
    host: Arc<dyn SessionHost>,
    transport: Option<Arc<dyn ReportTransport>>,
}

impl ReportingServiceBuilder {
    /// Deliver through `transport` instead of the HTTP webhook client
    ///
    /// Only used when `webhookUrl` is configured; without it reporting
    /// stays disabled.
    pub fn transport(mut self, transport: Arc<dyn ReportTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate config, prepare the artifact directory and advertise the
    /// upload endpoint to clients
    pub fn build(self) -> Result<ReportingService> {
        let Self {
            config,
            host,
            transport,
        } = self;

        config.validate()?;
        let artifacts = ArtifactStore::open(&config.artifact_dir)?;

        let transport = match (&config.webhook_url, transport) {
            (Some(_), Some(transport)) => Some(transport),
            (Some(url), None) => Some(Arc::new(HttpWebhookTransport::new(
                url.as_str(),
                config.request_timeout(),
            )?) as Arc<dyn ReportTransport>),
            (None, Some(_)) => {
                tracing::debug!("Transport supplied without webhookUrl, reporting disabled");
                None
            }
            (None, None) => None,
        };

        let dispatcher = ReportDispatcher::new(
            transport,
            &config.server_name,
            config.profile_url_template.clone(),
            artifacts,
        )?;

        let ledger = Arc::new(EventLedger::new(config.retention()));
        let assembler = AuditLogAssembler::new(Arc::clone(&ledger), Arc::clone(&host));
        let access_key = access::access_key();

        match host.public_address() {
            Some((ip, port)) => {
                let section = ClientConfigSection::new(ip, port, access_key, config.clip_duration_secs);
                host.append_client_config(&section.render());
                tracing::info!(
                    address = %ip,
                    port,
                    duration_secs = config.clip_duration_secs,
                    "Replay upload endpoint advertised"
                );
            }
            None => {
                tracing::warn!("Public address unknown, replay upload endpoint not advertised");
            }
        }

        tracing::info!(
            reporting = dispatcher.is_enabled(),
            retention_secs = config.retention_secs,
            artifact_dir = %config.artifact_dir.display(),
            "Reporting service started"
        );

        Ok(ReportingService {
            config,
            ledger,
            replays: ReplayTable::new(),
            assembler,
            dispatcher,
            access_key,
        })
    }
}

/// Audit trail plus report delivery for one session host
pub struct ReportingService {
    config: AuditConfig,
    ledger: Arc<EventLedger>,
    replays: ReplayTable,
    assembler: AuditLogAssembler,
    dispatcher: ReportDispatcher,
    access_key: &'static str,
}

impl ReportingService {
    pub fn builder(config: AuditConfig, host: Arc<dyn SessionHost>) -> ReportingServiceBuilder {
        ReportingServiceBuilder {
            config,
            host,
            transport: None,
        }
    }

    // ─── Host notifications ──────────────────────────────────────

    /// Client received its first data frame
    ///
    /// Raw connects are not recorded; clients that never get this far
    /// never show up in the audit trail.
    pub fn on_client_active(&self, client: &dyn SessionClient) {
        if let Some(client) = capture(client, "connected") {
            self.ledger.record(AuditEvent::connected(client));
        }
    }

    /// Client left; also forgets its latest replay
    pub fn on_client_disconnected(&self, client: &dyn SessionClient) {
        if let Some(client) = capture(client, "disconnected") {
            self.replays.remove(client.account_id);
            self.ledger.record(AuditEvent::disconnected(client));
        }
    }

    /// Client sent a chat line
    pub fn on_chat_message(&self, client: &dyn SessionClient, text: &str) {
        if let Some(client) = capture(client, "chat") {
            self.ledger.record(AuditEvent::chat(client, text));
        }
    }

    /// Apply one pushed notification
    pub fn handle_event(&self, event: HostEvent) {
        match event {
            HostEvent::ClientActive(client) => self.on_client_active(&client),
            HostEvent::ClientDisconnected(client) => self.on_client_disconnected(&client),
            HostEvent::ChatMessage { client, text } => self.on_chat_message(&client, &text),
        }
    }

    /// Drain host notifications until every sender is dropped
    pub async fn run_events(&self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        tracing::debug!("Host event channel closed");
    }

    // ─── Report trigger / capture side ───────────────────────────

    pub fn get_last_replay(&self, client: ClientId) -> Option<Arc<Replay>> {
        self.replays.get_latest(client)
    }

    pub fn set_last_replay(&self, client: ClientId, replay: impl Into<Arc<Replay>>) {
        self.replays.set_latest(client, replay);
    }

    /// Snapshot the audit trail as of `now` (Unix milliseconds)
    pub fn get_audit_log(&self, now: u64) -> AuditLog {
        self.assembler.build_audit_log(now)
    }

    /// Register a freshly captured clip for `client` with the current
    /// audit trail embedded
    pub fn register_replay(&self, client: ClientId, id: ReplayId) -> Arc<Replay> {
        let replay = Arc::new(Replay::new(id, self.get_audit_log(now_millis())));
        self.replays.set_latest(client, Arc::clone(&replay));
        replay
    }

    pub fn submit_report(&self, client: &AuditClient, replay: &Replay, reason: &str) -> ReportHandle {
        self.dispatcher.submit_report(client, replay, reason)
    }

    /// Report `client` using its latest replay; `None` if it has none
    pub fn report_client(&self, client: &AuditClient, reason: &str) -> Option<ReportHandle> {
        let replay = self.replays.get_latest(client.account_id)?;
        Some(self.dispatcher.submit_report(client, &replay, reason))
    }

    /// Stop accepting reports and wait for in-flight sends
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        tracing::info!("Reporting service stopped");
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn replays(&self) -> &ReplayTable {
        &self.replays
    }

    pub fn dispatcher(&self) -> &ReportDispatcher {
        &self.dispatcher
    }

    pub fn access_key(&self) -> &str {
        self.access_key
    }
}

/// Snapshot a live client, or log and give up
fn capture(client: &dyn SessionClient, event: &'static str) -> Option<AuditClient> {
    match client.audit_client() {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(event, error = %e, "Dropping audit event");
            None
        }
    }
}
