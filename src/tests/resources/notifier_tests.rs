use crate::{MonitorConfig, NotifyError, ShutdownNotifier, WebhookNotifier};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn create_notifier(mock_server: &MockServer) -> WebhookNotifier {
    let config = MonitorConfig::builder()
        .host("https://pve.local:8006")
        .node("pve1")
        .vm_id("100")
        .token("monitor@pve!idle", "secret-value")
        .webhook_url(format!("{}/hooks/shutdown", mock_server.uri()))
        .webhook_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    WebhookNotifier::new(&config).unwrap()
}

#[tokio::test]
async fn test_notify_posts_once() {
    let mock_server = MockServer::start().await;
    let notifier = create_notifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/hooks/shutdown"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    notifier.notify().await.unwrap();
}

#[tokio::test]
async fn test_notify_failure_is_not_retried() {
    let mock_server = MockServer::start().await;
    let notifier = create_notifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/hooks/shutdown"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = notifier.notify().await;
    match result {
        Err(NotifyError::Status { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_notify_timeout() {
    let mock_server = MockServer::start().await;
    let notifier = create_notifier(&mock_server);

    Mock::given(method("POST"))
        .and(path("/hooks/shutdown"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let result = notifier.notify().await;
    assert!(matches!(result, Err(NotifyError::Timeout(_))));
}
