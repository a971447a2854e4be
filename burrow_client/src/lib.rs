pub use burrow_link::{
    message, CallResult, Condition, Data, Introduction, Op, Record, TokenError, TokenIssuer,
};

mod client;
pub use client::{ClientBuilder, ClientChannel, ClientError};

mod config;
pub use config::ClientConfig;

mod service;
pub use service::{HandlerFuture, ServiceHandler};
