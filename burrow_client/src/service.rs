use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use burrow_link::data::Record;

use crate::ClientChannel;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Record> + Send>>;

/// A named function other members of the project can call through the base.
///
/// A handler receives the caller's params and the caller's verified claims,
/// and returns the reply payload. Delivery of the reply belongs to the
/// processor, which sends it exactly once per invocation; a handler has no
/// way to reply twice or not at all. This also means a handler can be
/// tested by simply asserting on the record it returns.
///
/// The channel passed in is the handler's own client, for issuing further
/// remote calls while it runs.
pub trait ServiceHandler: Send + Sync {
    fn call(&self, client: ClientChannel, params: Record, auth: Record) -> HandlerFuture;
}

impl<F> ServiceHandler for F
where
    F: Fn(ClientChannel, Record, Record) -> HandlerFuture + Send + Sync,
{
    fn call(&self, client: ClientChannel, params: Record, auth: Record) -> HandlerFuture {
        (self)(client, params, auth)
    }
}

pub(crate) struct ServiceRegistry {
    handlers: HashMap<String, Arc<dyn ServiceHandler>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind a handler to a name. Binding a name again replaces the
    /// previous handler.
    pub fn bind(&mut self, name: String, handler: Arc<dyn ServiceHandler>) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ServiceHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}
