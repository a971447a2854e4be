//! The burrow application serves as the base for a project.
//!
//! It owns the project's tables and answers the queries that members of
//! the project issue against them. It also keeps the project's service
//! directory: any member may register a named service, and calls to that
//! name from other members are carried through the base to the provider
//! and their replies carried back. Members authenticate by presenting a
//! token signed with the project's shared secret when they connect.

use std::{env, io, path::Path};

use tracing::info;
use tracing_subscriber::EnvFilter;

use burrow::{BaseConfig, ProcessorBuilder};

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    // command line arguments: <filename>
    // filename is name of config file, defaults to burrow_config.json

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    info!("starting base for project {:?}", config.project);

    let mut pb = ProcessorBuilder::new();
    pb.config(config);

    let processor_handle = pb
        .start_processor()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    info!("listening on {}", processor_handle.local_addr());

    processor_handle.join().await.ok();
    Ok(())
}

fn load_config() -> Result<BaseConfig, io::Error> {
    let mut args = env::args().skip(1);
    let path_str = args.next().unwrap_or("burrow_config.json".to_string());
    let config_path = Path::new(&path_str);
    BaseConfig::from_file(config_path)
}
