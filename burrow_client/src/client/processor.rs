use std::{collections::HashMap, time::Duration};

use burrow_link::{
    message::{Introduction, Message, QueryMessage, ServiceMessage},
    result::{CallResult, STATUS_UNAUTHORIZED, STATUS_UNAVAILABLE},
    Link, LinkError,
};
use tokio::{
    select, spawn,
    sync::{
        mpsc::{channel, Receiver},
        oneshot,
    },
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, warn};

use crate::{config::ClientConfig, service::ServiceRegistry};

use super::{channel::ClientChannel, ClientControl};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub(crate) struct ClientProcessor {
    config: ClientConfig,
    terminate: bool,
    denied: Option<String>,
    client_channel: ClientChannel,
    receiver: Receiver<ClientControl>,
    link: Option<Link>,
    next_seq: u64,
    pending: HashMap<u64, oneshot::Sender<CallResult>>,
    services: ServiceRegistry,
}

impl ClientProcessor {
    pub(crate) fn start(config: ClientConfig) -> (ClientChannel, JoinHandle<()>) {
        let (sender, receiver) = channel(50);
        let client_channel = ClientChannel::new(config.project.clone(), sender);

        let mut processor = Self {
            config,
            terminate: false,
            denied: None,
            client_channel: client_channel.clone(),
            receiver,
            link: None,
            next_seq: 0,
            pending: HashMap::new(),
            services: ServiceRegistry::new(),
        };

        let handle = spawn(async move {
            // if the processor is disconnected, attempt to connect
            // if the processor is connected, process requests and messages
            while !processor.terminate {
                match processor.link {
                    Some(ref mut link) => {
                        select! {
                            msg = processor.receiver.recv() => {
                                match msg {
                                    Some(msg) => {
                                        processor.process_control(msg).await;
                                    },
                                    // every channel handle has been dropped
                                    None => break,
                                }
                            },
                            msg = link.recv() => {
                                match msg {
                                    Some(msg) => {
                                        processor.process_remote(msg).await;
                                    },
                                    None => {
                                        // became disconnected; in-flight
                                        // requests can no longer complete
                                        processor.link = None;
                                        processor.fail_pending(STATUS_UNAVAILABLE, "connection lost");
                                    },
                                }
                            }
                        }
                    }
                    None if processor.denied.is_some() => {
                        // denial is terminal; keep answering requests, but
                        // stop trying to reconnect
                        match processor.receiver.recv().await {
                            Some(msg) => processor.process_control(msg).await,
                            None => break,
                        }
                    }
                    None => {
                        processor.connect().await;
                    }
                }
            }

            processor.fail_pending(STATUS_UNAVAILABLE, "client terminated");
        });
        (client_channel, handle)
    }

    async fn connect(&mut self) {
        let introduction = Introduction {
            project: self.config.project.clone(),
            token: self.config.token.clone().unwrap_or_default(),
        };
        match Link::connect(self.config.host.as_str(), introduction).await {
            Ok(link) => {
                debug!("connected to base at {}", self.config.host);
                self.link = Some(link);

                // re-establish service registrations on the new connection
                for name in self.services.names() {
                    let msg = Message::Service(ServiceMessage::Register { name });
                    if self.link_send(msg).await.is_err() {
                        return; // couldnt send, need to reconnect
                    }
                }
            }
            Err(LinkError::Denied(reason)) => {
                warn!("base denied the connection: {}", reason);
                self.denied = Some(reason);
            }
            Err(e) => {
                warn!(
                    "failed to connect to base at {}: {}",
                    self.config.host, e
                );
                sleep(RECONNECT_DELAY).await;
            }
        }
    }

    async fn process_control(&mut self, msg: ClientControl) {
        match msg {
            ClientControl::Insert {
                table,
                record,
                resp,
            } => {
                self.request(resp, |seq| QueryMessage::Insert { seq, table, record })
                    .await;
            }
            ClientControl::GetOne { table, find, resp } => {
                self.request(resp, |seq| QueryMessage::GetOne { seq, table, find })
                    .await;
            }
            ClientControl::Call {
                service,
                params,
                resp,
            } => {
                self.request(resp, |seq| QueryMessage::Call {
                    seq,
                    service,
                    params,
                })
                .await;
            }
            ClientControl::Register { name, handler } => {
                self.services.bind(name.clone(), handler);
                let msg = Message::Service(ServiceMessage::Register { name });
                self.link_send(msg).await.ok();
            }
            ClientControl::Reply { call, payload } => {
                let msg = Message::Service(ServiceMessage::Reply { call, payload });
                self.link_send(msg).await.ok();
            }
            ClientControl::Terminate => {
                self.terminate = true;
            }
        }
    }

    /// Assign the next sequence number, send the query, and remember where
    /// the result should go.
    async fn request<F>(&mut self, resp: oneshot::Sender<CallResult>, build: F)
    where
        F: FnOnce(u64) -> QueryMessage,
    {
        if let Some(reason) = &self.denied {
            let result = CallResult::failure(
                STATUS_UNAUTHORIZED,
                format!("connection denied: {}", reason),
            );
            resp.send(result).ok();
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        match self.link_send(Message::Query(build(seq))).await {
            Ok(_) => {
                self.pending.insert(seq, resp);
            }
            Err(_) => {
                let result = CallResult::failure(STATUS_UNAVAILABLE, "not connected to base");
                resp.send(result).ok();
            }
        }
    }

    async fn process_remote(&mut self, msg: Message) {
        match msg {
            Message::Result { seq, result } => match self.pending.remove(&seq) {
                Some(resp) => {
                    resp.send(result).ok();
                }
                None => {
                    warn!("recieved result for unknown request {}", seq);
                }
            },
            Message::Service(ServiceMessage::Invoke {
                call,
                service,
                params,
                auth,
            }) => match self.services.get(&service) {
                Some(handler) => {
                    let channel = self.client_channel.clone();
                    spawn(async move {
                        let payload = handler.call(channel.clone(), params, auth).await;
                        // the reply is owed to the base whatever the
                        // handler produced
                        channel.reply(call, payload).await;
                    });
                }
                None => {
                    // the base routed a call to a name we never registered;
                    // still owe it a reply so the caller is not left waiting
                    warn!("invoked unregistered service: {}", service);
                    let mut payload = burrow_link::Record::new();
                    payload.insert(
                        "error".to_string(),
                        burrow_link::Data::from("unknown service"),
                    );
                    let msg = Message::Service(ServiceMessage::Reply { call, payload });
                    self.link_send(msg).await.ok();
                }
            },
            Message::Service(_) => {
                warn!("unexpected service message from base");
            }
            Message::Query(_) => {
                warn!("base should not issue queries to a client");
            }
        }
    }

    fn fail_pending(&mut self, status: u16, message: &str) {
        for (_, resp) in self.pending.drain() {
            resp.send(CallResult::failure(status, message)).ok();
        }
    }

    async fn link_send(&mut self, msg: Message) -> Result<(), LinkError> {
        if let Some(link) = &self.link {
            match link.send(msg).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    // Clear link so it will reconnect
                    self.link = None;
                    self.fail_pending(STATUS_UNAVAILABLE, "connection lost");
                    Err(e)
                }
            }
        } else {
            Err(LinkError::Closed)
        }
    }
}
