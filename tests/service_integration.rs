//! Reporting service integration tests
//!
//! End-to-end tests wiring `ReportingService` to an in-memory session host
//! and the in-memory transport. Covers startup injection, lifecycle
//! recording, replay association, report delivery and shutdown.

use session_audit::{
    AuditClient, AuditConfig, AuditError, AuditEventKind, ClientId, HostEvent, MemoryTransport,
    ReportOutcome, ReportingService, SessionClient, SessionHost,
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

/// Session host double: a roster plus the options blob clients receive
#[derive(Default)]
struct FakeHost {
    roster: Mutex<Vec<AuditClient>>,
    client_config: Mutex<String>,
    address: Option<(IpAddr, u16)>,
}

impl FakeHost {
    fn with_address() -> Self {
        Self {
            address: Some((IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)), 27015)),
            ..Default::default()
        }
    }

    fn join(&self, client: &AuditClient) {
        self.roster.lock().unwrap().push(client.clone());
    }

    fn leave(&self, client: &AuditClient) {
        self.roster.lock().unwrap().retain(|c| c.account_id != client.account_id);
    }
}

impl SessionHost for FakeHost {
    fn connected_clients(&self) -> Vec<AuditClient> {
        self.roster.lock().unwrap().clone()
    }

    fn public_address(&self) -> Option<(IpAddr, u16)> {
        self.address
    }

    fn append_client_config(&self, payload: &str) {
        self.client_config.lock().unwrap().push_str(payload);
    }
}

/// A client whose session state is already gone
struct TornDownClient;

impl SessionClient for TornDownClient {
    fn audit_client(&self) -> session_audit::Result<AuditClient> {
        Err(AuditError::ClientState("pawn destroyed".to_string()))
    }
}

fn temp_config(webhook: bool) -> AuditConfig {
    AuditConfig {
        server_name: "EU #1 | discord.gg/xyz".to_string(),
        artifact_dir: std::env::temp_dir()
            .join(format!("session-audit-it-{}", uuid::Uuid::new_v4()))
            .join("reports"),
        webhook_url: webhook.then(|| "https://hooks.example.com/api/webhooks/1/t".to_string()),
        ..Default::default()
    }
}

fn cleanup(config: &AuditConfig) {
    if let Some(root) = config.artifact_dir.parent() {
        let _ = std::fs::remove_dir_all(root);
    }
}

fn alice() -> AuditClient {
    AuditClient::new("alice", 76561198000000001)
}

// ─── Startup ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_startup_creates_artifact_dir_and_advertises_upload() {
    let config = temp_config(false);
    let host = Arc::new(FakeHost::with_address());

    let service = ReportingService::builder(config.clone(), host.clone())
        .build()
        .unwrap();

    assert!(config.artifact_dir.is_dir());

    let blob = host.client_config.lock().unwrap().clone();
    assert!(blob.starts_with("\"ReplayReport\"\n{\n"));
    assert!(blob.contains(&format!(
        "\"UPLOAD_URL\"\t\"http://203.0.113.7:27015/replay/upload/{}\"",
        service.access_key()
    )));
    assert!(blob.contains("\"DURATION\"\t\"30\""));

    cleanup(&config);
}

#[tokio::test]
async fn test_startup_without_address_skips_injection() {
    let config = temp_config(false);
    let host = Arc::new(FakeHost::default());

    ReportingService::builder(config.clone(), host.clone())
        .build()
        .unwrap();

    assert!(host.client_config.lock().unwrap().is_empty());
    cleanup(&config);
}

#[tokio::test]
async fn test_startup_rejects_invalid_config() {
    let mut config = temp_config(false);
    config.retention_secs = 0;

    let result = ReportingService::builder(config.clone(), Arc::new(FakeHost::default())).build();
    assert!(matches!(result, Err(AuditError::Config(_))));
    cleanup(&config);
}

// ─── Audit trail ─────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_chat_disconnect_end_to_end() {
    let config = temp_config(false);
    let host = Arc::new(FakeHost::default());
    let service = ReportingService::builder(config.clone(), host.clone())
        .build()
        .unwrap();
    let alice = alice();

    host.join(&alice);
    service.on_client_active(&alice);
    service.on_chat_message(&alice, "hello");

    let before = service.get_audit_log(session_audit::types::now_millis());
    assert!(before.has_client(alice.account_id));
    assert_eq!(before.events.len(), 2);

    host.leave(&alice);
    service.on_client_disconnected(&alice);

    let after = service.get_audit_log(session_audit::types::now_millis());
    assert!(!after.has_client(alice.account_id));
    assert_eq!(after.events.len(), 3);
    assert!(matches!(after.events[0].kind, AuditEventKind::PlayerConnected { .. }));
    assert!(matches!(
        after.events[1].kind,
        AuditEventKind::ChatMessage { ref text, .. } if text == "hello"
    ));
    assert!(matches!(after.events[2].kind, AuditEventKind::PlayerDisconnected { .. }));

    cleanup(&config);
}

#[tokio::test]
async fn test_torn_down_client_is_dropped() {
    let config = temp_config(false);
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .build()
        .unwrap();

    service.on_client_active(&TornDownClient);
    service.on_chat_message(&TornDownClient, "ghost");
    service.on_client_disconnected(&TornDownClient);
    service.on_client_active(&alice());

    assert_eq!(service.ledger().snapshot().len(), 1);
    cleanup(&config);
}

#[tokio::test]
async fn test_host_event_channel() {
    let config = temp_config(false);
    let service = Arc::new(
        ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
            .build()
            .unwrap(),
    );

    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let runner = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.run_events(rx).await })
    };

    tx.send(HostEvent::ClientActive(alice())).await.unwrap();
    tx.send(HostEvent::ChatMessage {
        client: alice(),
        text: "via channel".to_string(),
    })
    .await
    .unwrap();
    tx.send(HostEvent::ClientDisconnected(alice())).await.unwrap();
    drop(tx);
    runner.await.unwrap();

    assert_eq!(service.ledger().snapshot().len(), 3);
    cleanup(&config);
}

#[tokio::test]
async fn test_concurrent_producers() {
    let config = temp_config(false);
    let service = Arc::new(
        ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..16u64 {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            let client = AuditClient::new(format!("p{}", i), i);
            service.on_client_active(&client);
            for n in 0..50 {
                service.on_chat_message(&client, &format!("msg {}", n));
            }
            service.on_client_disconnected(&client);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(service.ledger().snapshot().len(), 16 * 52);
    cleanup(&config);
}

// ─── Replays ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_replay_cleared_on_disconnect() {
    let config = temp_config(false);
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .build()
        .unwrap();
    let alice = alice();

    service.on_client_active(&alice);
    let replay = service.register_replay(alice.account_id, "clip-1".into());
    assert_eq!(replay.audit_log.events.len(), 1);
    assert_eq!(
        service.get_last_replay(alice.account_id).unwrap().id.as_str(),
        "clip-1"
    );

    // Reporting does not consume the association
    service.register_replay(alice.account_id, "clip-2".into());
    assert_eq!(
        service.get_last_replay(alice.account_id).unwrap().id.as_str(),
        "clip-2"
    );

    service.on_client_disconnected(&alice);
    assert!(service.get_last_replay(alice.account_id).is_none());
    assert!(service.get_last_replay(ClientId(12345)).is_none());

    cleanup(&config);
}

// ─── Reports ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_report_delivered_with_sanitized_payload() {
    let config = temp_config(true);
    let transport = Arc::new(MemoryTransport::new());
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .transport(transport.clone())
        .build()
        .unwrap();

    let suspect = AuditClient::new("@everyone", 76561198000000002);
    service.on_client_active(&suspect);
    let replay = service.register_replay(suspect.account_id, "clip-9".into());

    let outcome = service
        .report_client(&suspect, "**wallhack** <@123>")
        .expect("replay registered")
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, ReportOutcome::Delivered);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0].message;
    assert_eq!(message.username, "EU #1 | *******.gg/xyz");

    let embed = &message.embeds[0];
    let author = embed.author.as_ref().unwrap();
    assert_eq!(author.name, "\\@everyone");
    assert_eq!(
        author.url.as_deref(),
        Some("https://steamcommunity.com/profiles/76561198000000002")
    );
    assert_eq!(
        embed.description.as_deref(),
        Some("\\*\\*wallhack\\*\\* \\<\\@123\\>")
    );
    assert_eq!(
        embed.timestamp,
        session_audit::payload::rfc3339_millis(replay.triggered_at())
    );

    let names: Vec<&str> = sent[0].attachments.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, vec!["clip-9.zip", "clip-9.json"]);
    assert!(sent[0].attachments[0].path.starts_with(&config.artifact_dir));

    cleanup(&config);
}

#[tokio::test]
async fn test_report_without_webhook_is_noop() {
    let config = temp_config(false);
    let spy = Arc::new(MemoryTransport::new());
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .transport(spy.clone())
        .build()
        .unwrap();

    let alice = alice();
    let replay = service.register_replay(alice.account_id, "clip-1".into());
    let outcome = service
        .submit_report(&alice, &replay, "griefing")
        .outcome()
        .await
        .unwrap();

    assert_eq!(outcome, ReportOutcome::Skipped);
    assert_eq!(spy.attempts(), 0);
    assert!(!service.dispatcher().is_enabled());

    cleanup(&config);
}

#[tokio::test]
async fn test_report_failure_surfaces_to_caller() {
    let config = temp_config(true);
    let transport = Arc::new(MemoryTransport::failing("connection reset"));
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .transport(transport.clone())
        .build()
        .unwrap();

    let alice = alice();
    let replay = service.register_replay(alice.account_id, "clip-1".into());
    let result = service.submit_report(&alice, &replay, "griefing").outcome().await;

    match result {
        Err(AuditError::Transport(reason)) => assert_eq!(reason, "connection reset"),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert_eq!(transport.attempts(), 1);

    cleanup(&config);
}

#[tokio::test]
async fn test_report_client_without_replay() {
    let config = temp_config(true);
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .transport(Arc::new(MemoryTransport::new()))
        .build()
        .unwrap();

    assert!(service.report_client(&alice(), "afk").is_none());
    cleanup(&config);
}

#[tokio::test]
async fn test_shutdown_stops_new_reports() {
    let config = temp_config(true);
    let transport = Arc::new(MemoryTransport::new());
    let service = ReportingService::builder(config.clone(), Arc::new(FakeHost::default()))
        .transport(transport.clone())
        .build()
        .unwrap();

    let alice = alice();
    let replay = service.register_replay(alice.account_id, "clip-1".into());
    let in_flight = service.submit_report(&alice, &replay, "first");

    service.shutdown().await;
    assert_eq!(in_flight.outcome().await.unwrap(), ReportOutcome::Delivered);

    let late = service.submit_report(&alice, &replay, "second").outcome().await;
    assert!(matches!(late, Err(AuditError::ShuttingDown)));
    assert_eq!(transport.sent().len(), 1);

    cleanup(&config);
}
