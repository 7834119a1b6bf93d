//! End-to-end coverage for the binary-framed RPC transport: a real
//! listener on an ephemeral port, real `TcpStream` clients speaking the
//! length-prefixed wire format, spec.md §8 scenarios exercised over the
//! wire instead of through `handle_connection` directly.

use std::time::Duration;

use sims_core::RegistryConfig;
use sims_protocol::{ConnectRequest, Event, EventKind, EventsRequest, Header, UnicastRequest};
use sims_rpc::frame;
use sims_rpc::rpc::{RpcRequest, RpcResponse};
use sims_rpc::{SimsRpcConfig, SimsRpcServer};
use tokio::net::TcpStream;
use tokio::sync::watch;

fn header(user_id: &str) -> Header {
    Header {
        user_id: user_id.to_owned(),
        request_id: None,
    }
}

async fn connect_request(client: &mut TcpStream, user_id: &str) {
    frame::write_message(
        client,
        &RpcRequest::Connect(ConnectRequest {
            header: Some(header(user_id)),
        }),
    )
    .await
    .unwrap();
    let response: RpcResponse = frame::read_message(client).await.unwrap().unwrap();
    assert!(matches!(response, RpcResponse::Ok));
}

#[tokio::test]
async fn unicast_is_delivered_over_the_wire_to_a_live_events_stream() {
    let server = SimsRpcServer::bind(SimsRpcConfig {
        bind_addr: "127.0.0.1:0".to_owned(),
        registry: RegistryConfig::default(),
    })
    .await
    .unwrap();
    let addr = server.listener_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let serve_task = tokio::spawn(server.serve(shutdown_rx));

    let mut control = TcpStream::connect(addr).await.unwrap();
    connect_request(&mut control, "alice").await;

    let mut events_client = TcpStream::connect(addr).await.unwrap();
    frame::write_message(
        &mut events_client,
        &RpcRequest::Events(EventsRequest {
            header: Some(header("alice")),
        }),
    )
    .await
    .unwrap();
    // Give the server's Events handler a moment to park in `stream.recv()`.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut publish_client = TcpStream::connect(addr).await.unwrap();
    frame::write_message(
        &mut publish_client,
        &RpcRequest::Unicast(UnicastRequest {
            user_id: "alice".to_owned(),
            event: Some(Event {
                kind: EventKind::text(),
                data: b"hello over the rpc wire".to_vec(),
                selector: None,
            }),
            user_selector: None,
        }),
    )
    .await
    .unwrap();
    let response: RpcResponse = frame::read_message(&mut publish_client).await.unwrap().unwrap();
    assert!(matches!(response, RpcResponse::Ok));

    let pushed: RpcResponse =
        tokio::time::timeout(Duration::from_secs(2), frame::read_message(&mut events_client))
            .await
            .expect("timed out waiting for pushed event")
            .unwrap()
            .unwrap();
    match pushed {
        RpcResponse::Event(event) => {
            assert_eq!(event.data, b"hello over the rpc wire");
        }
        other => panic!("expected RpcResponse::Event, got {other:?}"),
    }

    shutdown_tx.send(true).unwrap();
    serve_task.await.unwrap();
}

#[tokio::test]
async fn graceful_shutdown_ends_a_live_events_stream_cleanly() {
    let server = SimsRpcServer::bind(SimsRpcConfig {
        bind_addr: "127.0.0.1:0".to_owned(),
        registry: RegistryConfig::default(),
    })
    .await
    .unwrap();
    let addr = server.listener_addr().unwrap();
    let registry = server.registry();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let serve_task = tokio::spawn(server.serve(shutdown_rx));

    let mut control = TcpStream::connect(addr).await.unwrap();
    connect_request(&mut control, "bob").await;

    let mut events_client = TcpStream::connect(addr).await.unwrap();
    frame::write_message(
        &mut events_client,
        &RpcRequest::Events(EventsRequest {
            header: Some(header("bob")),
        }),
    )
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    registry.close();

    let ended: RpcResponse =
        tokio::time::timeout(Duration::from_secs(2), frame::read_message(&mut events_client))
            .await
            .expect("events stream did not end within the timeout")
            .unwrap()
            .unwrap();
    assert!(matches!(ended, RpcResponse::EventsEnd));

    shutdown_tx.send(true).unwrap();
    serve_task.await.unwrap();
}
