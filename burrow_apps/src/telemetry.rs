use std::time::Duration;

use burrow_client::{ClientChannel, Data, Record};
use rand::Rng;
use tracing::{error, info};

pub const SENSORS_TABLE: &str = "sensors";

/// How many readings one run submits.
pub const READINGS: u32 = 10;
/// Reading ids start here and count up by one per reading.
pub const BASE_READING_ID: i64 = 100;
/// Delay between consecutive readings.
pub const READING_INTERVAL: Duration = Duration::from_secs(2);

const VALUE_MIN: i64 = 11;
const VALUE_MAX: i64 = 20;

/// Submit `readings` readings, one every `interval`. Each iteration builds
/// a fresh record and inserts it; an acknowledged insert is logged as sent,
/// a failed one logs the store's error and is otherwise forgotten. Returns
/// the number of acknowledged inserts.
pub async fn run(
    client: &ClientChannel,
    device: &str,
    readings: u32,
    interval: Duration,
) -> u32 {
    let mut sent = 0;
    for i in 0..readings {
        let id = BASE_READING_ID + i as i64;
        let reading = build_reading(device, id);

        match client.insert(SENSORS_TABLE, reading).await {
            Ok(result) => {
                if result.is_success() {
                    info!("Sent reading {} for {}", id, device);
                    sent += 1;
                } else {
                    error!(
                        "failed to send reading {}: {}",
                        id,
                        result.message().unwrap_or("unknown error")
                    );
                }
            }
            Err(e) => {
                error!("failed to send reading {}: {}", id, e);
            }
        }

        if i + 1 < readings {
            tokio::time::sleep(interval).await;
        }
    }
    sent
}

fn build_reading(device: &str, id: i64) -> Record {
    let value = rand::thread_rng().gen_range(VALUE_MIN..=VALUE_MAX);
    let mut reading = Record::new();
    reading.insert("id".to_string(), Data::from(id));
    reading.insert("device".to_string(), Data::from(device));
    reading.insert("value".to_string(), Data::from(value));
    reading
}
