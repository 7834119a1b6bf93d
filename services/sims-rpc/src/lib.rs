//! sims-rpc: the binary-framed RPC transport binding. Owns a
//! `sims_core::Registry` and dispatches each connection's framed requests
//! to `Hub`/`Streamer`/`Publisher`. Accept-loop shape grounded on this
//! repository's own TCP listener worker.

pub mod frame;
pub mod rpc;

use std::sync::Arc;

use sims_core::{Hub, Publisher, Registry, RegistryConfig, Streamer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};

use rpc::{RpcRequest, RpcResponse};

pub struct SimsRpcConfig {
    pub bind_addr: String,
    pub registry: RegistryConfig,
}

pub struct SimsRpcServer {
    registry: Arc<Registry>,
    listener: TcpListener,
}

impl SimsRpcServer {
    pub async fn bind(config: SimsRpcConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!(addr = %config.bind_addr, "sims-rpc listening");
        Ok(SimsRpcServer {
            registry: Arc::new(Registry::new(config.registry)),
            listener,
        })
    }

    pub fn listener_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until `shutdown` fires. Each connection is
    /// handled on its own task so one slow/misbehaving peer can't stall
    /// others.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, peer)) => {
                            let registry = Arc::clone(&self.registry);
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(socket, registry).await {
                                    warn!(%peer, error = %err, "connection ended with error");
                                }
                            });
                        }
                        Err(err) => warn!(error = %err, "accept failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("sims-rpc: shutting down accept loop");
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream, registry: Arc<Registry>) -> std::io::Result<()> {
    let Some(request) = frame::read_message::<_, RpcRequest>(&mut socket).await? else {
        return Ok(());
    };

    let hub = Hub::new(&registry);
    let publisher = Publisher::new(&registry);

    match request {
        RpcRequest::Connect(req) => {
            let response = to_response(hub.connect(req.header.as_ref()).map(|()| RpcResponse::Ok));
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::Heartbeat(req) => {
            let response = to_response(hub.heartbeat(req.header.as_ref()).map(|()| RpcResponse::Ok));
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::Disconnect(req) => {
            let response = to_response(hub.disconnect(req.header.as_ref()).map(|()| RpcResponse::Ok));
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::List => {
            let response = RpcResponse::List(sims_protocol::ListResponse { channels: hub.list() });
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::Unicast(req) => {
            let response = to_response(
                publisher
                    .unicast(&req.user_id, req.event, req.user_selector)
                    .map(|()| RpcResponse::Ok),
            );
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::Multicast(req) => {
            let response = match publisher.multicast(&req.user_ids, req.event, req.user_selector) {
                Ok(resp) => RpcResponse::Multicast(resp),
                Err(err) => RpcResponse::Err(err.code()),
            };
            frame::write_message(&mut socket, &response).await
        }
        RpcRequest::Events(req) => {
            let streamer = Streamer::new(&registry);
            match streamer.events(req.header.as_ref()) {
                Ok(stream) => {
                    loop {
                        match stream.recv().await {
                            Some(event) => {
                                frame::write_message(&mut socket, &RpcResponse::Event(event)).await?;
                            }
                            None => {
                                frame::write_message(&mut socket, &RpcResponse::EventsEnd).await?;
                                break;
                            }
                        }
                    }
                    Ok(())
                }
                Err(err) => {
                    frame::write_message(&mut socket, &RpcResponse::Err(err.code())).await
                }
            }
        }
    }
}

fn to_response(result: Result<RpcResponse, sims_protocol::SimsError>) -> RpcResponse {
    match result {
        Ok(response) => response,
        Err(err) => RpcResponse::Err(err.code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sims_protocol::{ConnectRequest, Header};

    async fn bound_server() -> SimsRpcServer {
        SimsRpcServer::bind(SimsRpcConfig {
            bind_addr: "127.0.0.1:0".to_owned(),
            registry: RegistryConfig::default(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn connect_over_the_wire_creates_a_channel() {
        let server = bound_server().await;
        let addr = server.listener.local_addr().unwrap();
        let registry = server.registry();
        let (tx, rx) = watch::channel(false);
        let serve_task = tokio::spawn(server.serve(rx));

        let mut client = TcpStream::connect(addr).await.unwrap();
        let request = RpcRequest::Connect(ConnectRequest {
            header: Some(Header {
                user_id: "alice".to_owned(),
                request_id: None,
            }),
        });
        frame::write_message(&mut client, &request).await.unwrap();
        let response: RpcResponse = frame::read_message(&mut client).await.unwrap().unwrap();
        assert!(matches!(response, RpcResponse::Ok));

        let key = sims_core::key_from_header(Some(&Header {
            user_id: "alice".to_owned(),
            request_id: None,
        }))
        .unwrap();
        assert!(registry.find_channel(&key).is_some());

        tx.send(true).unwrap();
        serve_task.await.unwrap();
    }
}
