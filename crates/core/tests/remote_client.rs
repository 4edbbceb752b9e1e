use chrono::{TimeZone, Utc};
use coach_core::{ChatTurn, CoachApi, CoachError, Depth, PhaseId, RemoteCoachClient, Sentiment};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn chat_posts_message_and_phase() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "message": "We fought again",
            "phase": "dynamics"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Let's explore that.",
            "alert": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RemoteCoachClient::new(server.uri()).unwrap();
    let reply = client.chat("We fought again", PhaseId::Dynamics).await.unwrap();

    assert_eq!(reply.response_text, "Let's explore that.");
    assert!(reply.alert);
}

#[tokio::test]
async fn chat_without_alert_field_is_not_flagged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Hi." })),
        )
        .mount(&server)
        .await;

    // Trailing slash on the base address must not produce `//chat`.
    let client = RemoteCoachClient::new(format!("{}/", server.uri())).unwrap();
    let reply = client.chat("hello", PhaseId::Reflection).await.unwrap();

    assert_eq!(reply.response_text, "Hi.");
    assert!(!reply.alert);
}

#[tokio::test]
async fn analyze_decodes_labels() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(serde_json::json!({ "message": "We fought again" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sentiment": "NEGATIVE",
            "depth": "deep"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RemoteCoachClient::new(server.uri()).unwrap();
    let analysis = client.analyze("We fought again").await.unwrap();

    assert_eq!(analysis.sentiment, Sentiment::Negative);
    assert_eq!(analysis.depth, Depth::Deep);
}

#[tokio::test]
async fn summarize_sends_history_in_order() {
    let server = MockServer::start().await;
    let at = Utc.with_ymd_and_hms(2024, 2, 14, 20, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .and(body_json(serde_json::json!({
            "history": [
                {
                    "user": "We fought again",
                    "ai": "Let's explore that.",
                    "phase": "dynamics",
                    "timestamp": "2024-02-14T20:00:00Z",
                    "sentiment": "NEGATIVE",
                    "depth": "deep"
                },
                {
                    "user": "We made up",
                    "ai": "That's wonderful.",
                    "phase": "dual_reflection",
                    "timestamp": "2024-02-14T20:00:00Z",
                    "sentiment": null,
                    "depth": null
                }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "summary": "A rough evening, then repair." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        ChatTurn::with_timestamp(
            "We fought again",
            "Let's explore that.",
            PhaseId::Dynamics,
            at,
            Some(Sentiment::Negative),
            Some(Depth::Deep),
        ),
        ChatTurn::with_timestamp(
            "We made up",
            "That's wonderful.",
            PhaseId::DualReflection,
            at,
            None,
            None,
        ),
    ];

    let client = RemoteCoachClient::new(server.uri()).unwrap();
    let summary = client.summarize(&history).await.unwrap();

    assert_eq!(summary, "A rough evening, then repair.");
}

#[tokio::test]
async fn non_success_status_is_remote_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("waking up"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RemoteCoachClient::new(server.uri()).unwrap();
    let err = client.chat("hello", PhaseId::Onboarding).await.unwrap_err();

    assert!(matches!(err, CoachError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn undecodable_body_is_remote_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = RemoteCoachClient::new(server.uri()).unwrap();
    let err = client.summarize(&[]).await.unwrap_err();

    assert!(matches!(err, CoachError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "sentiment": "NEUTRAL", "depth": "shallow" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client =
        RemoteCoachClient::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
    let err = client.analyze("hello").await.unwrap_err();

    assert!(matches!(err, CoachError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn unreachable_backend_is_remote_unavailable() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = RemoteCoachClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2))
        .unwrap();
    let err = client.chat("hello", PhaseId::Onboarding).await.unwrap_err();

    assert!(matches!(err, CoachError::RemoteUnavailable(_)));
}
