use std::fmt::Debug;

use burrow_link::{data::Record, result::CallResult, Condition};
use thiserror::Error;
use tokio::sync::{mpsc::Sender, oneshot};

use crate::service::ServiceHandler;

use super::ClientControl;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The processor task behind this channel has stopped.
    #[error("client processor is gone")]
    ProcessorGone,
}

/// A ClientChannel is a handle onto a running client. Remote calls are
/// issued through it and each resolves to a single [`CallResult`]; remote
/// failures (including auth failures) arrive in-band as `Failure` results,
/// never as an `Err`. The channel is cheap to clone and every clone talks
/// to the same connection.
pub struct ClientChannel {
    project: String,
    sender: Sender<ClientControl>,
}

impl ClientChannel {
    pub(super) fn new(project: String, sender: Sender<ClientControl>) -> Self {
        Self { project, sender }
    }

    /// The project this client was configured for.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Submit one record for storage in the named table.
    pub async fn insert<T>(&self, table: T, record: Record) -> Result<CallResult, ClientError>
    where
        T: Into<String>,
    {
        let (resp, rx) = oneshot::channel();
        self.send(ClientControl::Insert {
            table: table.into(),
            record,
            resp,
        })
        .await?;
        rx.await.map_err(|_| ClientError::ProcessorGone)
    }

    /// Fetch at most one record matching the condition. Zero matches is a
    /// failure result, not an empty success.
    pub async fn get_one<T>(&self, table: T, find: Condition) -> Result<CallResult, ClientError>
    where
        T: Into<String>,
    {
        let (resp, rx) = oneshot::channel();
        self.send(ClientControl::GetOne {
            table: table.into(),
            find,
            resp,
        })
        .await?;
        rx.await.map_err(|_| ClientError::ProcessorGone)
    }

    /// Call a named service registered by some member of the project.
    pub async fn call<S>(&self, service: S, params: Record) -> Result<CallResult, ClientError>
    where
        S: Into<String>,
    {
        let (resp, rx) = oneshot::channel();
        self.send(ClientControl::Call {
            service: service.into(),
            params,
            resp,
        })
        .await?;
        rx.await.map_err(|_| ClientError::ProcessorGone)
    }

    /// Register a handler under a name, making it callable by the rest of
    /// the project. The registration survives reconnection.
    pub async fn register<S, H>(&self, name: S, handler: H) -> Result<(), ClientError>
    where
        S: Into<String>,
        H: ServiceHandler + 'static,
    {
        self.send(ClientControl::Register {
            name: name.into(),
            handler: std::sync::Arc::new(handler),
        })
        .await
    }

    /// Request that the connection be terminated.
    pub async fn terminate(&self) {
        self.send(ClientControl::Terminate).await.ok();
    }

    pub(crate) async fn reply(&self, call: u64, payload: Record) {
        self.send(ClientControl::Reply { call, payload }).await.ok();
    }

    async fn send(&self, msg: ClientControl) -> Result<(), ClientError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| ClientError::ProcessorGone)
    }
}

impl Clone for ClientChannel {
    fn clone(&self) -> Self {
        Self {
            project: self.project.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl Debug for ClientChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientChannel")
            .field("project", &self.project)
            .field("sender", &"<Sender channel>")
            .finish()
    }
}
