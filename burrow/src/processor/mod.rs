use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::Path;

use burrow_link::{
    data::{Data, Record},
    message::{Message, QueryMessage, ServiceMessage},
    result::{CallResult, STATUS_ERROR, STATUS_NOT_FOUND},
    LinkError, LinkHandle,
};
use thiserror::Error;
use tokio::{
    sync::mpsc::{channel, Receiver},
    task::{JoinError, JoinHandle},
};
use tracing::{info, warn};

use crate::config::BaseConfig;

mod listener;
use listener::Listener;

mod message;
use message::ProcessorMessage;

mod services;
use services::ServiceRouter;

mod store;
use store::TableStore;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("no configuration provided")]
    NoConfig,
    #[error("failed to read configuration: {0}")]
    Config(#[from] io::Error),
    #[error("failed to start listener: {0}")]
    Listen(#[from] LinkError),
}

pub struct ProcessorBuilder {
    config: Option<BaseConfig>,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(&mut self, config: BaseConfig) {
        self.config = Some(config);
    }

    pub fn config_file(&mut self, config_path: &Path) -> Result<(), ProcessorError> {
        let config = BaseConfig::from_file(config_path)?;
        self.config = Some(config);
        Ok(())
    }

    pub async fn start_processor(self) -> Result<ProcessorHandle, ProcessorError> {
        let config = self.config.ok_or(ProcessorError::NoConfig)?;
        Processor::start(config).await
    }
}

struct Connection {
    handle: LinkHandle,
    auth: Record,
}

struct Processor {
    receiver: Receiver<ProcessorMessage>,
    connections: HashMap<u64, Connection>,
    store: TableStore,
    services: ServiceRouter,
}

impl Processor {
    async fn start(config: BaseConfig) -> Result<ProcessorHandle, ProcessorError> {
        let (sender, receiver) = channel(50);

        let listener = Listener::start(&config, sender.clone()).await?;
        let local_addr = listener.local_addr();
        let store = TableStore::new(&config.data_path, &config.project);

        let mut processor = Self {
            receiver,
            connections: HashMap::new(),
            store,
            services: ServiceRouter::new(),
        };

        let handle = tokio::spawn(async move {
            // the acceptor lives exactly as long as the processing loop
            let _listener = listener;
            loop {
                let message = match processor.receiver.recv().await {
                    Some(message) => message,
                    None => break,
                };
                processor.process(message).await;
            }
        });

        Ok(ProcessorHandle { local_addr, handle })
    }

    async fn process(&mut self, message: ProcessorMessage) {
        match message {
            ProcessorMessage::NewConnection { id, handle, auth } => {
                info!("connection {} joined", id);
                self.connections.insert(id, Connection { handle, auth });
            }
            ProcessorMessage::ConnectionClosed { id } => {
                info!("connection {} left", id);
                self.connections.remove(&id);
                for orphan in self.services.connection_closed(id) {
                    let result =
                        CallResult::failure(STATUS_ERROR, "service provider disconnected");
                    self.respond(orphan.caller, orphan.seq, result).await;
                }
            }
            ProcessorMessage::RemoteMessage { id, message } => match message {
                Message::Query(query) => self.process_query(id, query).await,
                Message::Service(service) => self.process_service(id, service).await,
                Message::Result { .. } => {
                    warn!("connection {} sent a result frame", id);
                }
            },
        }
    }

    async fn process_query(&mut self, id: u64, query: QueryMessage) {
        match query {
            QueryMessage::Insert { seq, table, record } => {
                let result = self.store.insert(&table, record).await;
                self.respond(id, seq, result).await;
            }
            QueryMessage::GetOne { seq, table, find } => {
                let result = self.store.get_one(&table, &find).await;
                self.respond(id, seq, result).await;
            }
            QueryMessage::Call {
                seq,
                service,
                params,
            } => {
                let provider_id = match self.services.provider_of(&service) {
                    Some(provider_id) => provider_id,
                    None => {
                        let result = CallResult::failure(STATUS_NOT_FOUND, "service not found");
                        self.respond(id, seq, result).await;
                        return;
                    }
                };
                let provider = match self.connections.get(&provider_id) {
                    Some(connection) => connection.handle.clone(),
                    None => {
                        let result =
                            CallResult::failure(STATUS_ERROR, "service provider disconnected");
                        self.respond(id, seq, result).await;
                        return;
                    }
                };
                // the caller's verified claims ride along as the handler's
                // auth context
                let auth = self
                    .connections
                    .get(&id)
                    .map(|connection| connection.auth.clone())
                    .unwrap_or_default();

                let call = self.services.begin_call(id, seq, provider_id);
                let msg = Message::Service(ServiceMessage::Invoke {
                    call,
                    service,
                    params,
                    auth,
                });
                if provider.send(msg).await.is_err() {
                    self.services.finish_call(call);
                    let result =
                        CallResult::failure(STATUS_ERROR, "service provider disconnected");
                    self.respond(id, seq, result).await;
                }
            }
        }
    }

    async fn process_service(&mut self, id: u64, service: ServiceMessage) {
        match service {
            ServiceMessage::Register { name } => {
                info!("connection {} registered service {:?}", id, name);
                self.services.register(name, id);
            }
            ServiceMessage::Reply { call, payload } => match self.services.finish_call(call) {
                Some(pending) if pending.provider == id => {
                    let result = CallResult::ok(Some(Data::Map(payload)));
                    self.respond(pending.caller, pending.seq, result).await;
                }
                Some(_) => {
                    warn!("connection {} answered someone else's call", id);
                }
                None => {
                    warn!("connection {} answered an unknown call", id);
                }
            },
            ServiceMessage::Invoke { .. } => {
                warn!("connection {} tried to invoke a service directly", id);
            }
        }
    }

    async fn respond(&mut self, id: u64, seq: u64, result: CallResult) {
        let connection = match self.connections.get(&id) {
            Some(connection) => connection,
            None => return, // the caller is already gone
        };
        let msg = Message::Result { seq, result };
        // a send failure means the link is down; its pump will report the
        // close shortly
        connection.handle.send(msg).await.ok();
    }
}

pub struct ProcessorHandle {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ProcessorHandle {
    /// The address the base is actually listening on. Useful when the
    /// configured listen address leaves the port to the system.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn join(self) -> Result<(), JoinError> {
        self.handle.await
    }
}
