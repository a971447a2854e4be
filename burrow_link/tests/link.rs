use burrow_link::{
    message::{Introduction, Message, QueryMessage},
    CallResult, Data, Link, LinkError, LinkListener, Record,
};

fn intro() -> Introduction {
    Introduction {
        project: "greenhouse".to_string(),
        token: "opaque-credential".to_string(),
    }
}

#[tokio::test]
async fn introduce_and_exchange() {
    let mut listener = LinkListener::bind("127.0.0.1:0").await.expect("failed to bind");
    let addr = listener.local_addr().expect("listener has no local addr");

    let connect = tokio::spawn(Link::connect(addr, intro()));

    let pending = listener.accept().await.expect("failed to accept");
    assert_eq!(pending.introduction().project, "greenhouse");
    assert_eq!(pending.introduction().token, "opaque-credential");
    let mut base_side = pending.accept().await.expect("failed to finish handshake");

    let mut client_side = connect
        .await
        .expect("connect task panicked")
        .expect("failed to connect to listener");

    // client to base
    let mut record = Record::new();
    record.insert("device".to_string(), Data::from("probe-1"));
    let msg = Message::Query(QueryMessage::Insert {
        seq: 1,
        table: "sensors".to_string(),
        record: record.clone(),
    });
    client_side.send(msg).await.expect("link closed");

    match base_side.recv().await.expect("link closed") {
        Message::Query(QueryMessage::Insert { seq, table, record: got }) => {
            assert_eq!(seq, 1);
            assert_eq!(table, "sensors");
            assert_eq!(got, record);
        }
        other => panic!("incorrect message recieved: {:?}", other),
    }

    // base to client
    let msg = Message::Result {
        seq: 1,
        result: CallResult::ok(None),
    };
    base_side.send(msg).await.expect("link closed");

    match client_side.recv().await.expect("link closed") {
        Message::Result { seq, result } => {
            assert_eq!(seq, 1);
            assert!(result.is_success());
        }
        other => panic!("incorrect message recieved: {:?}", other),
    }
}

#[tokio::test]
async fn denied_introduction() {
    let mut listener = LinkListener::bind("127.0.0.1:0").await.expect("failed to bind");
    let addr = listener.local_addr().expect("listener has no local addr");

    let connect = tokio::spawn(Link::connect(addr, intro()));

    let pending = listener.accept().await.expect("failed to accept");
    pending.deny("token rejected").await;

    match connect.await.expect("connect task panicked") {
        Err(LinkError::Denied(reason)) => assert_eq!(reason, "token rejected"),
        Ok(_) => panic!("connection should have been denied"),
        Err(other) => panic!("incorrect error: {:?}", other),
    }
}

#[tokio::test]
async fn recv_none_after_peer_drops() {
    let mut listener = LinkListener::bind("127.0.0.1:0").await.expect("failed to bind");
    let addr = listener.local_addr().expect("listener has no local addr");

    let connect = tokio::spawn(Link::connect(addr, intro()));
    let pending = listener.accept().await.expect("failed to accept");
    let base_side = pending.accept().await.expect("failed to finish handshake");

    let mut client_side = connect
        .await
        .expect("connect task panicked")
        .expect("failed to connect to listener");

    drop(base_side);
    assert!(client_side.recv().await.is_none());
}
