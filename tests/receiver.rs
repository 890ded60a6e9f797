//! End-to-end tests for the trap-receiving endpoint over real UDP sockets.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use trapsink::{
    SecurityLevel, SecurityModelRegistry, TrapConfig, TrapEngine, TrapEvent, TrapReceiver,
    TrapResponder, UdpEngine, Version,
};

/// Responder that forwards events into a channel for assertions.
struct ChannelResponder(mpsc::UnboundedSender<TrapEvent>);

impl TrapResponder for ChannelResponder {
    fn on_trap(&self, event: TrapEvent) {
        let _ = self.0.send(event);
    }
}

fn loopback_config(version: Version, security_level: SecurityLevel) -> TrapConfig {
    TrapConfig {
        version,
        security_level,
        listen_addr: "127.0.0.1:0".into(),
        ..TrapConfig::default()
    }
}

fn write_users_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "trapsink-it-{}-{}.json",
        std::process::id(),
        name
    ));
    std::fs::write(&path, content).unwrap();
    path
}

async fn isolated_receiver(
    config: TrapConfig,
    users_file: impl Into<PathBuf>,
) -> (TrapReceiver<UdpEngine>, Arc<SecurityModelRegistry>) {
    let engine = UdpEngine::create(&config).await.unwrap();
    let registry = Arc::new(SecurityModelRegistry::new());
    let receiver = TrapReceiver::with_engine(engine, config, users_file, registry.clone());
    (receiver, registry)
}

#[tokio::test]
async fn v2c_trap_reaches_responder() {
    let config = loopback_config(Version::V2c, SecurityLevel::NoAuthNoPriv);
    let (mut receiver, _registry) = isolated_receiver(config, "/nonexistent/users.json").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    receiver.start(Arc::new(ChannelResponder(tx))).unwrap();
    let target = receiver.local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let payload = b"\x30\x26\x02\x01\x01trap-bytes";
    sender.send_to(payload, target).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for trap event")
        .expect("responder channel closed");

    assert_eq!(&event.payload[..], payload);
    assert_eq!(event.source, sender.local_addr().unwrap());

    receiver.close().unwrap();
}

#[tokio::test]
async fn traps_before_start_are_counted_and_dropped() {
    let config = loopback_config(Version::V2c, SecurityLevel::NoAuthNoPriv);
    let (receiver, _registry) = isolated_receiver(config, "/nonexistent/users.json").await;
    let target = receiver.local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"early trap", target).await.unwrap();

    // Poll until the dispatch task has seen the datagram.
    tokio::time::timeout(Duration::from_secs(5), async {
        while receiver.engine().received() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("engine never received the datagram");

    assert_eq!(receiver.engine().dropped(), 1);
}

#[tokio::test]
async fn v3_auth_priv_scenario() {
    // Spec scenario: one authPriv user with SHA auth and AES privacy.
    let users_file = write_users_file(
        "alice",
        r#"[{"securityName":"alice","authProtocol":"SHA","authPassphrase":"pw12345678",
             "privProtocol":"AES","privPassphrase":"pw87654321"}]"#,
    );
    let config = loopback_config(Version::V3, SecurityLevel::AuthPriv);
    let (mut receiver, registry) = isolated_receiver(config, &users_file).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    receiver.start(Arc::new(ChannelResponder(tx))).unwrap();
    assert!(receiver.is_started());

    let model = receiver.engine().usm().unwrap();
    assert_eq!(model.user_count(), 1);
    let alice = model.user("alice").unwrap();
    assert_eq!(alice.auth_protocol, Some(trapsink::AuthProtocol::Sha1));
    assert_eq!(alice.priv_protocol, Some(trapsink::PrivProtocol::Aes128));
    assert!(registry.contains(model.engine_id()));

    receiver.close().unwrap();
    assert_eq!(model.user_count(), 0);
    assert!(registry.is_empty());

    std::fs::remove_file(&users_file).unwrap();
}

#[tokio::test]
async fn v3_auth_no_priv_drops_privacy_from_file() {
    // Same file, lower level: privacy fields parse but do not reach the user.
    let users_file = write_users_file(
        "alice-nopriv",
        r#"[{"securityName":"alice","authProtocol":"SHA","authPassphrase":"pw12345678",
             "privProtocol":"AES","privPassphrase":"pw87654321"}]"#,
    );
    let config = loopback_config(Version::V3, SecurityLevel::AuthNoPriv);
    let (mut receiver, _registry) = isolated_receiver(config, &users_file).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    receiver.start(Arc::new(ChannelResponder(tx))).unwrap();

    let alice = receiver.engine().usm().unwrap().user("alice").unwrap();
    assert!(alice.auth_key.is_some());
    assert!(alice.priv_protocol.is_none());
    assert!(alice.priv_key.is_none());

    receiver.close().unwrap();
    std::fs::remove_file(&users_file).unwrap();
}

#[tokio::test]
async fn v3_missing_credentials_file_fails_start() {
    let config = loopback_config(Version::V3, SecurityLevel::AuthPriv);
    let (mut receiver, registry) = isolated_receiver(config, "/nonexistent/users.json").await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = receiver.start(Arc::new(ChannelResponder(tx))).unwrap_err();
    assert!(matches!(err, trapsink::Error::CredentialsFileNotFound { .. }));
    assert!(!receiver.is_started());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn two_receivers_keep_distinct_registrations() {
    let users_file = write_users_file(
        "pair",
        r#"[{"securityName":"alice","authProtocol":"SHA","authPassphrase":"pw12345678"}]"#,
    );
    let registry = Arc::new(SecurityModelRegistry::new());

    let mut receivers = Vec::new();
    for _ in 0..2 {
        let config = loopback_config(Version::V3, SecurityLevel::AuthNoPriv);
        let engine = UdpEngine::create(&config).await.unwrap();
        let mut receiver =
            TrapReceiver::with_engine(engine, config, &users_file, registry.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        receiver.start(Arc::new(ChannelResponder(tx))).unwrap();
        receivers.push(receiver);
    }

    assert_eq!(registry.len(), 2);

    // Closing one receiver leaves the other's registration intact.
    receivers[0].close().unwrap();
    assert_eq!(registry.len(), 1);
    let survivor = receivers[1].engine().usm().unwrap();
    assert!(registry.contains(survivor.engine_id()));

    receivers[1].close().unwrap();
    assert!(registry.is_empty());

    std::fs::remove_file(&users_file).unwrap();
}

#[tokio::test]
async fn close_races_inflight_traps_without_fault() {
    let config = loopback_config(Version::V2c, SecurityLevel::NoAuthNoPriv);
    let (mut receiver, _registry) = isolated_receiver(config, "/nonexistent/users.json").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    receiver.start(Arc::new(ChannelResponder(tx))).unwrap();
    let target = receiver.local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for _ in 0..16 {
        sender.send_to(b"burst", target).await.unwrap();
    }

    // Close while datagrams may still be in flight; late deliveries are
    // dropped, nothing panics.
    receiver.close().unwrap();
    rx.close();
    assert!(!receiver.is_started());
}
