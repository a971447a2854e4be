pub mod config;
pub use config::BaseConfig;

pub mod processor;
pub use processor::{ProcessorBuilder, ProcessorError, ProcessorHandle};
