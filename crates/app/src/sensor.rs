//! Sensor polling loops.
//!
//! Each sensor runs in its own tokio task: read, publish onto the shared
//! reading queue, sleep, repeat. Publishing uses a bounded send with a
//! timeout so a wedged orchestrator drops readings instead of freezing the
//! producer. A read error terminates the loop for good; the sensor stays
//! visible in queries with no current value.

use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use brewhub_domain::state::SensorReading;

use crate::device::Sensor;
use crate::logger::Logger;

/// How long a publish may wait on a full reading queue before the reading
/// is dropped.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Publish one reading, dropping it with a warning if the queue stays full
/// past [`PUBLISH_TIMEOUT`].
pub async fn publish_reading(
    tx: &mpsc::Sender<SensorReading>,
    reading: SensorReading,
    log: &Logger,
) {
    let name = reading.name.clone();
    if tx.send_timeout(reading, PUBLISH_TIMEOUT).await.is_err() {
        log.warning(format!("reading from '{name}' dropped, queue full"));
    }
}

/// Drive one sensor until cancellation, a closed reading queue, or a read
/// error.
///
/// Notifications arriving on `notify_rx` are forwarded to the sensor's
/// [`Sensor::handle_notification`] hook between polls.
pub async fn run_sensor(
    mut sensor: Box<dyn Sensor>,
    tx: mpsc::Sender<SensorReading>,
    mut notify_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
    log: Logger,
) {
    let name = sensor.name().to_string();
    loop {
        match sensor.on_read().await {
            Ok(value) => {
                publish_reading(&tx, SensorReading::new(name.clone(), value), &log).await;
            }
            Err(err) => {
                log.error(format!("sensor '{name}' failed, polling stopped: {err}"));
                break;
            }
        }
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(sensor.poll_interval()) => {}
            text = notify_rx.recv() => {
                if let Some(text) = text {
                    sensor.handle_notification(&text);
                }
            }
        }
    }
    if let Err(err) = sensor.on_stop() {
        log.warning(format!("sensor '{name}' stop failed: {err}"));
    }
}
