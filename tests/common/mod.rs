//! Shared utilities for integration tests.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use admission_gate::config::GateConfig;
use admission_gate::{GateServer, Shutdown};

/// Base config with a signing secret; tests tweak the rest.
pub fn gate_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.build_token.secret = "integration-test-secret".to_string();
    config
}

/// Boot the gate on an ephemeral loopback port.
pub async fn spawn_gate(config: GateConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = GateServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
