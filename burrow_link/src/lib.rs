pub mod condition;
pub mod data;
pub mod link;
pub mod message;
pub mod result;
pub mod token;

pub use condition::{Condition, Op};
pub use data::{Data, Record};
pub use link::{Link, LinkError, LinkHandle, LinkListener, PendingLink};
pub use message::{Introduction, Message, QueryMessage, ServiceMessage};
pub use result::CallResult;
pub use token::{TokenError, TokenIssuer};
