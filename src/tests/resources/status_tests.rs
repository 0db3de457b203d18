use crate::{ApiError, HypervisorApi, HypervisorClient, MonitorConfig};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const STATUS_PATH: &str = "/api2/json/nodes/pve1/qemu/100/status/current";
const START_PATH: &str = "/api2/json/nodes/pve1/qemu/100/status/start";
const AUTH_HEADER: &str = "PVEAPIToken=monitor@pve!idle=secret-value";

fn create_test_config(server_url: &str) -> MonitorConfig {
    MonitorConfig::builder()
        .host(server_url)
        .node("pve1")
        .vm_id("100")
        .token("monitor@pve!idle", "secret-value")
        .webhook_url(format!("{}/hook", server_url))
        .connect_timeout(Duration::from_millis(200))
        .read_timeout(Duration::from_millis(300))
        .build()
        .unwrap()
}

fn create_client(mock_server: &MockServer) -> HypervisorClient {
    HypervisorClient::new(&create_test_config(&mock_server.uri())).unwrap()
}

#[tokio::test]
async fn test_check_status_running() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(header("Authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "status": "running",
                "name": "android",
                "cpu": 0.0425,
                "mem": 4294967296_i64,
                "uptime": 123456,
                "qmpstatus": "running",
                "maxmem": 8589934592_i64
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sample = client.check_status().await.unwrap();
    assert!(sample.vm_running);
    assert!((sample.cpu_usage_percent - 4.25).abs() < 1e-9);
    assert_eq!(sample.uptime_seconds, 123456.0);
}

#[tokio::test]
async fn test_check_status_stopped() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "stopped", "cpu": 0, "uptime": 0}
        })))
        .mount(&mock_server)
        .await;

    let sample = client.check_status().await.unwrap();
    assert!(!sample.vm_running);
    assert_eq!(sample.cpu_usage_percent, 0.0);
}

#[tokio::test]
async fn test_multi_vcpu_usage_above_hundred_percent() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "running", "cpu": 2.5, "uptime": 60}
        })))
        .mount(&mock_server)
        .await;

    let sample = client.check_status().await.unwrap();
    assert_eq!(sample.cpu_usage_percent, 250.0);
}

#[tokio::test]
async fn test_check_status_server_error() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("proxy loop"))
        .mount(&mock_server)
        .await;

    let result = client.check_status().await;
    match result {
        Err(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "proxy loop");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_status_unauthorized() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result = client.check_status().await;
    assert!(matches!(result, Err(ApiError::Status { status: 401, .. })));
}

#[tokio::test]
async fn test_check_status_missing_field() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"status": "running", "uptime": 10}
        })))
        .mount(&mock_server)
        .await;

    let result = client.check_status().await;
    assert!(matches!(result, Err(ApiError::Payload(_))));
}

#[tokio::test]
async fn test_check_status_not_json() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let result = client.check_status().await;
    assert!(matches!(result, Err(ApiError::Payload(_))));
}

#[tokio::test]
async fn test_check_status_timeout() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "data": {"status": "running", "cpu": 0.01, "uptime": 10}
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = client.check_status().await;
    assert!(matches!(result, Err(ApiError::Timeout(_))));
}

#[tokio::test]
async fn test_check_status_connection_refused() {
    // Reserve a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HypervisorClient::new(&create_test_config(&uri)).unwrap();

    let result = client.check_status().await;
    assert!(
        matches!(result, Err(ApiError::Transport(_))),
        "unexpected result for {}: {:?}",
        uri,
        result
    );
}

#[tokio::test]
async fn test_start_vm_success() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("POST"))
        .and(path(START_PATH))
        .and(header("Authorization", AUTH_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": "UPID:pve1:00001234:00ABCDEF:5F5E5D5C:qmstart:100:monitor@pve!idle:"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client.start_vm().await.unwrap();
}

#[tokio::test]
async fn test_start_vm_rejected() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("POST"))
        .and(path(START_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&mock_server)
        .await;

    let result = client.start_vm().await;
    assert!(matches!(result, Err(ApiError::Status { status: 403, .. })));
}
