use std::sync::Arc;

use burrow_link::{data::Record, result::CallResult, Condition};
use tokio::sync::oneshot;

use crate::service::ServiceHandler;

pub(crate) enum ClientControl {
    Insert {
        table: String,
        record: Record,
        resp: oneshot::Sender<CallResult>,
    },
    GetOne {
        table: String,
        find: Condition,
        resp: oneshot::Sender<CallResult>,
    },
    Call {
        service: String,
        params: Record,
        resp: oneshot::Sender<CallResult>,
    },
    Register {
        name: String,
        handler: Arc<dyn ServiceHandler>,
    },
    Reply {
        call: u64,
        payload: Record,
    },
    Terminate,
}
