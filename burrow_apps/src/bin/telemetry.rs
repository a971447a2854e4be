//! Simulates a sensor device: connects to the base and submits a fixed
//! run of readings to the `sensors` table, one every couple of seconds.

use std::{env, io, path::Path};

use tracing::info;
use tracing_subscriber::EnvFilter;

use burrow_apps::telemetry;
use burrow_client::{ClientBuilder, Data, Record};

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    // command line arguments: <filename>
    // filename is name of client config file, defaults to telemetry_config.json

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let path_str = args.next().unwrap_or("telemetry_config.json".to_string());
    let mut builder = ClientBuilder::load(Path::new(&path_str))?;

    // mint the device credential from the configured secret
    if let Some(issuer) = builder.token_issuer() {
        let mut claims = Record::new();
        claims.insert("device".to_string(), Data::from("sensor-1"));
        claims.insert("role".to_string(), Data::from("device"));
        let token = issuer
            .sign(&claims)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        builder.set_token(token);
    }

    let channel = builder.start();
    let sent = telemetry::run(
        &channel,
        "sensor-1",
        telemetry::READINGS,
        telemetry::READING_INTERVAL,
    )
    .await;
    info!("submitted {} of {} readings", sent, telemetry::READINGS);

    channel.terminate().await;
    Ok(())
}
