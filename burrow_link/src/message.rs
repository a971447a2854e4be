use serde::{Deserialize, Serialize};

use crate::{condition::Condition, data::Record, result::CallResult};

/// The opening frame of every connection: which project the caller belongs
/// to, and the bearer credential that proves it may join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Introduction {
    pub project: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Protocol {
    Introduction(Introduction),
    Accepted,
    Denied(String),
    Message(Message),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    Query(QueryMessage),
    Result { seq: u64, result: CallResult },
    Service(ServiceMessage),
}

/// Requests into the base. Each carries a client-chosen sequence number;
/// the base answers every one with a single `Message::Result` echoing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryMessage {
    Insert {
        seq: u64,
        table: String,
        record: Record,
    },
    GetOne {
        seq: u64,
        table: String,
        find: Condition,
    },
    Call {
        seq: u64,
        service: String,
        params: Record,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServiceMessage {
    /// Bind a service name to the sending connection.
    Register { name: String },
    /// Base to provider: run the named handler. `auth` is the caller's
    /// verified claims, attached by the base.
    Invoke {
        call: u64,
        service: String,
        params: Record,
        auth: Record,
    },
    /// Provider to base: the handler's reply payload.
    Reply { call: u64, payload: Record },
}
