//! Report dispatch
//!
//! Turns (client, replay, reason) into a sanitized webhook message with
//! the replay's artifacts attached and hands it to a transport on a
//! background task. The caller gets a [`ReportHandle`] it may await for
//! the outcome or drop to fire and forget.

use crate::artifact::ArtifactStore;
use crate::config::PROFILE_ID_PLACEHOLDER;
use crate::error::{AuditError, Result};
use crate::payload::{rfc3339_millis, Embed, EmbedAuthor, EmbedFooter, WebhookMessage};
use crate::sanitize::{escape_markup, normalize_display_name};
use crate::transport::ReportTransport;
use crate::types::{AuditClient, Replay};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

pub const REPORT_TITLE: &str = "Player Report";
pub const REPORT_FOOTER: &str = "Replay attached";
pub const REPORT_COLOR: u32 = 0xE7_4C_3C;

/// How a report submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Transport accepted the message
    Delivered,

    /// Reporting is not configured; nothing was sent
    Skipped,
}

/// Pending result of [`ReportDispatcher::submit_report`]
#[derive(Debug)]
pub struct ReportHandle {
    inner: HandleInner,
}

#[derive(Debug)]
enum HandleInner {
    Ready(Result<ReportOutcome>),
    Spawned(JoinHandle<Result<ReportOutcome>>),
}

impl ReportHandle {
    fn ready(result: Result<ReportOutcome>) -> Self {
        Self {
            inner: HandleInner::Ready(result),
        }
    }

    /// Wait for the send to finish
    pub async fn outcome(self) -> Result<ReportOutcome> {
        match self.inner {
            HandleInner::Ready(result) => result,
            HandleInner::Spawned(task) => task
                .await
                .map_err(|e| AuditError::Task(e.to_string()))?,
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.inner {
            HandleInner::Ready(_) => true,
            HandleInner::Spawned(task) => task.is_finished(),
        }
    }
}

/// Builds and sends player reports
///
/// Stateless per call. Whether a transport is configured is fixed at
/// construction; without one every submission is a silent no-op.
pub struct ReportDispatcher {
    transport: Option<Arc<dyn ReportTransport>>,
    runtime: Option<Handle>,
    sender_name: String,
    profile_url_template: String,
    artifacts: ArtifactStore,
    tracker: TaskTracker,
    // Held across the closed check plus spawn, and across close(), so no
    // task can be spawned once shutdown has started waiting.
    admission: Mutex<()>,
}

impl ReportDispatcher {
    /// Create a dispatcher
    ///
    /// With a transport, this must run inside a tokio runtime; sends are
    /// spawned on that runtime even when later submissions come from
    /// plain host threads.
    pub fn new(
        transport: Option<Arc<dyn ReportTransport>>,
        server_name: &str,
        profile_url_template: impl Into<String>,
        artifacts: ArtifactStore,
    ) -> Result<Self> {
        let runtime = match &transport {
            Some(_) => Some(Handle::try_current().map_err(|e| {
                AuditError::Config(format!("Report dispatch needs a tokio runtime: {}", e))
            })?),
            None => None,
        };

        Ok(Self {
            transport,
            runtime,
            sender_name: normalize_display_name(server_name),
            profile_url_template: profile_url_template.into(),
            artifacts,
            tracker: TaskTracker::new(),
            admission: Mutex::new(()),
        })
    }

    /// Whether reports go anywhere
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Sender name, normalized once at construction
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Report `client` with `replay` as evidence
    ///
    /// Never blocks on I/O. Transport failures surface through the
    /// returned handle.
    pub fn submit_report(&self, client: &AuditClient, replay: &Replay, reason: &str) -> ReportHandle {
        let (transport, runtime) = match (&self.transport, &self.runtime) {
            (Some(transport), Some(runtime)) => (Arc::clone(transport), runtime),
            _ => return ReportHandle::ready(Ok(ReportOutcome::Skipped)),
        };

        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        if self.tracker.is_closed() {
            tracing::warn!(client = %client.account_id, "Report rejected, dispatcher shutting down");
            return ReportHandle::ready(Err(AuditError::ShuttingDown));
        }

        let message = self.build_message(client, replay, reason);
        let attachments = self.artifacts.attachments(&replay.id);
        let client_id = client.account_id;
        let replay_id = replay.id.clone();

        let task = self.tracker.spawn_on(
            async move {
                match transport.send(&message, &attachments).await {
                    Ok(()) => {
                        tracing::info!(client = %client_id, replay = %replay_id, "Report sent");
                        Ok(ReportOutcome::Delivered)
                    }
                    Err(e) => {
                        tracing::warn!(
                            client = %client_id,
                            replay = %replay_id,
                            transport = transport.name(),
                            error = %e,
                            "Report delivery failed"
                        );
                        Err(e)
                    }
                }
            },
            runtime,
        );

        ReportHandle {
            inner: HandleInner::Spawned(task),
        }
    }

    /// The message `submit_report` would send
    pub fn build_message(&self, client: &AuditClient, replay: &Replay, reason: &str) -> WebhookMessage {
        let profile_url = self
            .profile_url_template
            .replace(PROFILE_ID_PLACEHOLDER, &client.account_id.to_string());

        WebhookMessage {
            username: self.sender_name.clone(),
            embeds: vec![Embed {
                title: Some(REPORT_TITLE.to_string()),
                description: Some(escape_markup(reason)),
                color: Some(REPORT_COLOR),
                timestamp: rfc3339_millis(replay.triggered_at()),
                author: Some(EmbedAuthor {
                    name: escape_markup(client.name.as_str()),
                    url: Some(profile_url),
                }),
                footer: Some(EmbedFooter {
                    text: REPORT_FOOTER.to_string(),
                }),
            }],
        }
    }

    /// Stop accepting reports and wait for in-flight sends to finish
    pub async fn shutdown(&self) {
        {
            let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
            self.tracker.close();
        }
        let in_flight = self.tracker.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight reports");
        }
        self.tracker.wait().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.tracker.is_closed()
    }
}
