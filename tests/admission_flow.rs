//! End-to-end admission tests against a running gate.

use std::time::Duration;

use admission_gate::config::BanNetworkConfig;
use admission_gate::security::BuildTokenVerifier;

mod common;

#[tokio::test]
async fn test_banned_network_gets_403_but_version_stays_open() {
    let mut config = common::gate_config();
    config.ban_networks.push(BanNetworkConfig {
        cidr: "127.0.0.0/8".to_string(),
        message: "local tests".to_string(),
    });

    let (addr, shutdown) = common::spawn_gate(config).await;
    let client = common::client();

    let blocked = client
        .get(format!("http://{addr}/build/gh/o/r/main"))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status(), 403);
    assert_eq!(
        blocked.text().await.unwrap(),
        "Requests from local tests are not allowed"
    );

    // The version endpoint is enumerated as exempt from network blocking
    // and is CORS-open by default.
    let version = client
        .get(format!("http://{addr}/version"))
        .send()
        .await
        .unwrap();
    assert_eq!(version.status(), 200);
    assert_eq!(
        version.headers()["access-control-allow-origin"],
        "*"
    );
    let body: serde_json::Value = version.json().await.unwrap();
    assert!(body["builder"].is_string());
    assert!(body["version"].is_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limit_headers_and_429() {
    let mut config = common::gate_config();
    config.rate_limit.limit = 2;
    config.rate_limit.period_secs = 3600;

    let (addr, shutdown) = common::spawn_gate(config).await;
    let client = common::client();
    let url = format!("http://{addr}/build/gh/o/r/main");

    for expected_remaining in ["1", "0"] {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["x-ratelimit-remaining"], expected_remaining);
        assert_eq!(res.headers()["x-ratelimit-limit"], "2");
    }

    let limited = client.get(&url).send().await.unwrap();
    assert_eq!(limited.status(), 429);
    assert_eq!(limited.headers()["x-ratelimit-remaining"], "0");
    assert!(limited.headers().contains_key("retry-after"));
    assert_eq!(
        limited.text().await.unwrap(),
        "Rate limit exceeded. Try again in 60 minutes"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_build_token_bypasses_rate_limit() {
    let mut config = common::gate_config();
    config.rate_limit.limit = 1;
    let secret = config.build_token.secret.clone();

    let (addr, shutdown) = common::spawn_gate(config).await;
    let client = common::client();

    // Token bound to the spec and to the Host-derived origin.
    let verifier = BuildTokenVerifier::new(&secret, Duration::from_secs(300), true);
    let token = verifier
        .issue("gh/o/r/main", &addr.to_string())
        .unwrap();

    for _ in 0..4 {
        let res = client
            .get(format!("http://{addr}/build/gh/o/r/main?build_token={token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        // Exempt requests are not counted, so no rate headers are attached.
        assert!(!res.headers().contains_key("x-ratelimit-remaining"));

        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["build_token"], true);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_build_token_gets_403() {
    let (addr, shutdown) = common::spawn_gate(common::gate_config()).await;
    let client = common::client();

    let res = client
        .get(format!(
            "http://{addr}/build/gh/o/r/main?build_token=not-a-real-token"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // A token for a different spec is just as invalid.
    let verifier = BuildTokenVerifier::new(
        "integration-test-secret",
        Duration::from_secs(300),
        true,
    );
    let wrong_spec = verifier.issue("gh/other/repo", &addr.to_string()).unwrap();
    let res = client
        .get(format!(
            "http://{addr}/build/gh/o/r/main?build_token={wrong_spec}"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    shutdown.trigger();
}

#[tokio::test]
async fn test_authenticated_identity_bypasses_rate_limit() {
    let mut config = common::gate_config();
    config.auth.enabled = true;
    config.rate_limit.limit = 1;

    let (addr, shutdown) = common::spawn_gate(config).await;
    let client = common::client();
    let url = format!("http://{addr}/build/gh/o/r/main");

    for _ in 0..3 {
        let res = client
            .get(&url)
            .header("x-forwarded-user", "ada")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["identity"], "ada");
    }

    // Unauthenticated callers still count against the limit.
    assert_eq!(client.get(&url).send().await.unwrap().status(), 200);
    assert_eq!(client.get(&url).send().await.unwrap().status(), 429);

    shutdown.trigger();
}

#[tokio::test]
async fn test_spec_keeps_percent_encoding() {
    let (addr, shutdown) = common::spawn_gate(common::gate_config()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{addr}/build/gh/owner%2Frepo/HEAD"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["spec"], "gh/owner%2Frepo/HEAD");

    shutdown.trigger();
}

#[tokio::test]
async fn test_allowed_hosts_cors_echo() {
    let mut config = common::gate_config();
    config.cors.allowed_hosts.push("site.example.org".to_string());
    config
        .cors
        .default_headers
        .insert("x-gate".to_string(), "admission".to_string());

    let (addr, shutdown) = common::spawn_gate(config).await;
    let client = common::client();
    let url = format!("http://{addr}/build/gh/o/r/main");

    let allowed = client
        .get(&url)
        .header("origin", "https://site.example.org:8443")
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "https://site.example.org:8443"
    );
    assert_eq!(allowed.headers()["access-control-allow-headers"], "cache-control");
    assert_eq!(allowed.headers()["x-gate"], "admission");

    let denied = client
        .get(&url)
        .header("origin", "https://evil.example.org")
        .send()
        .await
        .unwrap();
    assert!(!denied
        .headers()
        .contains_key("access-control-allow-origin"));

    shutdown.trigger();
}
