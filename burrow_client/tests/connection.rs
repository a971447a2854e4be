use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use burrow::{BaseConfig, ProcessorBuilder, ProcessorHandle};
use burrow_client::{
    CallResult, ClientBuilder, ClientChannel, ClientConfig, ClientError, Condition, Data,
    HandlerFuture, Record,
};

const SECRET: &str = "testing-secret";
const PROJECT: &str = "testing";

async fn start_base(data_path: &Path) -> ProcessorHandle {
    let config = BaseConfig {
        project: PROJECT.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        data_path: data_path.display().to_string(),
        secret: SECRET.to_string(),
    };
    let mut pb = ProcessorBuilder::new();
    pb.config(config);
    pb.start_processor().await.expect("failed to start base")
}

fn connect(addr: SocketAddr, role: &str) -> ClientChannel {
    let mut config = ClientConfig::new(PROJECT, addr.to_string());
    config.secret = Some(SECRET.to_string());

    let mut builder = ClientBuilder::new(config);
    let issuer = builder.token_issuer().expect("config has no secret");
    let mut claims = Record::new();
    claims.insert("role".to_string(), Data::from(role));
    let token = issuer.sign(&claims).expect("failed to sign claims");
    builder.set_token(token);
    builder.start()
}

/// Call a service, waiting out the window between the provider starting
/// and its registration reaching the base.
async fn call_service(channel: &ClientChannel, name: &str, params: Record) -> CallResult {
    for _ in 0..50 {
        let result = channel
            .call(name, params.clone())
            .await
            .expect("client processor is gone");
        if result.status() != 404 {
            return result;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("service {} never became available", name);
}

#[tokio::test]
async fn insert_and_get_one() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;
    let channel = connect(base.local_addr(), "device");

    let mut reading = Record::new();
    reading.insert("id".to_string(), Data::from(1));
    reading.insert("value".to_string(), Data::from(17));
    let result = channel
        .insert("sensors", reading)
        .await
        .expect("client processor is gone");
    assert!(result.is_success());

    let result = channel
        .get_one("sensors", Condition::eq("id", 1))
        .await
        .expect("client processor is gone");
    assert!(result.is_success());
    let payload = result.payload().expect("success carried no payload");
    assert_eq!(payload.get_property("value").as_int(), Some(17));

    let result = channel
        .get_one("sensors", Condition::eq("id", 2))
        .await
        .expect("client processor is gone");
    assert!(!result.is_success());
    assert_eq!(result.status(), 404);
}

#[tokio::test]
async fn bad_token_fails_in_band() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;

    let mut config = ClientConfig::new(PROJECT, base.local_addr().to_string());
    config.secret = Some("not-the-base-secret".to_string());
    let mut builder = ClientBuilder::new(config);
    let issuer = builder.token_issuer().expect("config has no secret");
    let token = issuer.sign(&Record::new()).expect("failed to sign claims");
    builder.set_token(token);
    let channel = builder.start();

    let result = channel
        .insert("sensors", Record::new())
        .await
        .expect("client processor is gone");
    assert!(!result.is_success());
    assert_eq!(result.status(), 401);
    let message = result.message().expect("failure carried no message");
    assert!(message.contains("token rejected"), "message: {}", message);
}

#[tokio::test]
async fn wrong_project_is_turned_away() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;

    let mut config = ClientConfig::new("some-other-project", base.local_addr().to_string());
    config.secret = Some(SECRET.to_string());
    let mut builder = ClientBuilder::new(config);
    let issuer = builder.token_issuer().expect("config has no secret");
    let token = issuer.sign(&Record::new()).expect("failed to sign claims");
    builder.set_token(token);
    let channel = builder.start();

    let result = channel
        .insert("sensors", Record::new())
        .await
        .expect("client processor is gone");
    assert_eq!(result.status(), 401);
    let message = result.message().expect("failure carried no message");
    assert!(message.contains("project mismatch"), "message: {}", message);
}

#[tokio::test]
async fn service_call_round_trip() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;

    let provider = connect(base.local_addr(), "service");
    provider
        .register(
            "echo",
            |_client: ClientChannel, params: Record, auth: Record| -> HandlerFuture {
                Box::pin(async move {
                    let mut reply = params;
                    if let Some(role) = auth.get("role").and_then(Data::as_str) {
                        reply.insert("caller_role".to_string(), Data::from(role));
                    }
                    reply
                })
            },
        )
        .await
        .expect("client processor is gone");

    let caller = connect(base.local_addr(), "caller");
    let mut params = Record::new();
    params.insert("ping".to_string(), Data::from("pong"));
    let result = call_service(&caller, "echo", params).await;

    assert!(result.is_success());
    let payload = result.payload().expect("success carried no payload");
    assert_eq!(payload.get_property("ping").as_str(), Some("pong"));
    // the base attached the caller's verified claims
    assert_eq!(payload.get_property("caller_role").as_str(), Some("caller"));
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;
    let channel = connect(base.local_addr(), "caller");

    let result = channel
        .call("nobody-home", Record::new())
        .await
        .expect("client processor is gone");
    assert_eq!(result.status(), 404);
}

#[tokio::test]
async fn terminate_stops_the_client() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let base = start_base(dir.path()).await;
    let channel = connect(base.local_addr(), "device");

    channel.terminate().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = channel.insert("sensors", Record::new()).await;
    assert!(matches!(result, Err(ClientError::ProcessorGone)));
}
