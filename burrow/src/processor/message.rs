use burrow_link::{data::Record, message::Message, LinkHandle};

#[derive(Debug)]
pub(crate) enum ProcessorMessage {
    /// A connection completed its handshake. `auth` is the verified claims
    /// map from its token.
    NewConnection {
        id: u64,
        handle: LinkHandle,
        auth: Record,
    },
    RemoteMessage {
        id: u64,
        message: Message,
    },
    ConnectionClosed {
        id: u64,
    },
}
