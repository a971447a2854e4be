use std::collections::HashMap;

/// Routing state for named services: which connection provides each name,
/// and which calls are waiting on a provider's reply.
pub(crate) struct ServiceRouter {
    providers: HashMap<String, u64>,
    pending: HashMap<u64, PendingCall>,
    next_call: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingCall {
    pub caller: u64,
    pub seq: u64,
    pub provider: u64,
}

impl ServiceRouter {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            pending: HashMap::new(),
            next_call: 0,
        }
    }

    /// Bind a name to the providing connection. Returns the previous
    /// provider when the name was already bound; the newest binding wins.
    pub fn register(&mut self, name: String, provider: u64) -> Option<u64> {
        self.providers.insert(name, provider)
    }

    pub fn provider_of(&self, name: &str) -> Option<u64> {
        self.providers.get(name).copied()
    }

    /// Record a call in flight to a provider, returning the call id to
    /// route the reply by.
    pub fn begin_call(&mut self, caller: u64, seq: u64, provider: u64) -> u64 {
        let call = self.next_call;
        self.next_call += 1;
        self.pending.insert(
            call,
            PendingCall {
                caller,
                seq,
                provider,
            },
        );
        call
    }

    pub fn finish_call(&mut self, call: u64) -> Option<PendingCall> {
        self.pending.remove(&call)
    }

    /// Drop all state tied to a closed connection. Names it provided are
    /// unbound, and calls waiting on it are returned so the callers can be
    /// failed. Calls *from* it are simply dropped; there is no one left to
    /// answer.
    pub fn connection_closed(&mut self, id: u64) -> Vec<PendingCall> {
        self.providers.retain(|_, provider| *provider != id);

        let orphaned: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, call)| call.provider == id || call.caller == id)
            .map(|(call_id, _)| *call_id)
            .collect();

        let mut failed = Vec::new();
        for call_id in orphaned {
            if let Some(call) = self.pending.remove(&call_id) {
                if call.provider == id && call.caller != id {
                    failed.push(call);
                }
            }
        }
        failed
    }
}
