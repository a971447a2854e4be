//! The credential service: registers the `login` and `register` handlers
//! with the base, then sits and serves calls until interrupted.

use std::{env, io, path::Path};

use tracing::info;
use tracing_subscriber::EnvFilter;

use burrow_apps::creds;
use burrow_client::{ClientBuilder, Data, Record};

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    // command line arguments: <filename>
    // filename is name of client config file, defaults to credsvc_config.json

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let path_str = args.next().unwrap_or("credsvc_config.json".to_string());
    let mut builder = ClientBuilder::load(Path::new(&path_str))?;

    // the service both presents a credential and issues them, so the
    // signing secret is not optional here
    let issuer = builder.token_issuer().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "config has no signing secret")
    })?;

    let mut claims = Record::new();
    claims.insert("role".to_string(), Data::from("service"));
    let token = issuer
        .sign(&claims)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    builder.set_token(token);

    let channel = builder.start();
    creds::attach(&channel, issuer)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    info!("credential service registered, serving calls");

    tokio::signal::ctrl_c().await?;
    channel.terminate().await;
    Ok(())
}
