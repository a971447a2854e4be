use std::net::SocketAddr;

use burrow_link::{LinkError, LinkListener, TokenIssuer};
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error};

use crate::config::BaseConfig;

use super::message::ProcessorMessage;

/// Accepts connections, checks their introductions, and pumps messages
/// from every accepted link into the processor.
pub(crate) struct Listener {
    local_addr: SocketAddr,
    acceptor: JoinHandle<()>,
}

impl Listener {
    pub(crate) async fn start(
        config: &BaseConfig,
        sender: Sender<ProcessorMessage>,
    ) -> Result<Self, LinkError> {
        let mut listener = LinkListener::bind(config.listen_addr.as_str()).await?;
        let local_addr = listener.local_addr()?;
        let issuer = TokenIssuer::new(config.secret.as_bytes());
        let project = config.project.clone();

        let acceptor = tokio::spawn(async move {
            let mut next_id: u64 = 0;
            loop {
                let pending = match listener.accept().await {
                    Ok(pending) => pending,
                    Err(e) => {
                        error!("listener failed to accept: {}", e);
                        break;
                    }
                };

                let introduction = pending.introduction();
                if introduction.project != project {
                    debug!(
                        "turned away connection for project {:?}",
                        introduction.project
                    );
                    pending.deny("project mismatch").await;
                    continue;
                }
                let auth = match issuer.verify(&introduction.token) {
                    Ok(claims) => claims,
                    Err(e) => {
                        debug!("turned away connection: {}", e);
                        pending.deny("token rejected").await;
                        continue;
                    }
                };

                let mut link = match pending.accept().await {
                    Ok(link) => link,
                    Err(e) => {
                        debug!("connection lost while accepting: {}", e);
                        continue;
                    }
                };

                let id = next_id;
                next_id += 1;
                let msg = ProcessorMessage::NewConnection {
                    id,
                    handle: link.handle(),
                    auth,
                };
                if sender.send(msg).await.is_err() {
                    break; // processor is gone, stop accepting
                }

                let pump = sender.clone();
                tokio::spawn(async move {
                    while let Some(message) = link.recv().await {
                        let msg = ProcessorMessage::RemoteMessage { id, message };
                        if pump.send(msg).await.is_err() {
                            return;
                        }
                    }
                    pump.send(ProcessorMessage::ConnectionClosed { id }).await.ok();
                });
            }
        });

        Ok(Self {
            local_addr,
            acceptor,
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}
