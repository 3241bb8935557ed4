//! Forwarding loop
//!
//! Reads records from the serial side and hands complete readings to a
//! [`RecordSink`]. The blocking read runs on tokio's blocking pool; the reader
//! is moved there and back each cycle so it keeps a single owner. Each read
//! gives up after [`READ_SLICE`], so a silent device never holds up shutdown
//! for longer than that.

use crate::forwarder::RecordSink;
use anyhow::Result;
use radarlink_core::DecodeStats;
use radarlink_serial::{LineSource, RecordReader};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest a single blocking read may wait for a line
pub const READ_SLICE: Duration = Duration::from_millis(100);

/// Counters reported when the loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySummary {
    /// Readings delivered to the sink
    pub forwarded: u64,
    /// Records skipped (empty or missing fields)
    pub skipped: u64,
    /// Decoder counters as of the last completed read
    pub decode: DecodeStats,
}

/// Forwarding loop configuration
pub struct Relay<K: RecordSink> {
    sink: K,
    cycle_delay: Duration,
    max_records: Option<u64>,
}

impl<K: RecordSink> Relay<K> {
    pub fn new(sink: K, cycle_delay: Duration) -> Self {
        Self {
            sink,
            cycle_delay,
            max_records: None,
        }
    }

    /// Stop after this many forwarded readings
    pub fn with_max_records(mut self, max_records: u64) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run until `shutdown` resolves, the device is lost, or delivery fails.
    ///
    /// On shutdown the in-flight read is awaited (at most [`READ_SLICE`])
    /// and the device is closed before this returns.
    pub async fn run<S, F>(&self, mut reader: RecordReader<S>, shutdown: F) -> Result<RelaySummary>
    where
        S: LineSource + 'static,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RelaySummary::default();

        loop {
            let mut read = tokio::task::spawn_blocking(move || {
                let result = reader.read_record_within(READ_SLICE);
                (reader, result)
            });

            let joined = tokio::select! {
                joined = &mut read => joined,
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping relay");
                    let (returned, _) = read.await?;
                    reader = returned;
                    break;
                }
            };
            let (returned, result) = joined?;
            reader = returned;
            summary.decode = reader.stats().clone();

            let record = match result {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    error!("Lost connection to {}: {}", reader.source().identifier(), e);
                    return Err(e.into());
                }
            };

            info!("{}", record.to_json_string());

            if record.is_empty() {
                summary.skipped += 1;
                continue;
            }

            let Some(reading) = record.reading() else {
                warn!("Record lacks numeric L_Dist, R_Dist or Mv, skipping");
                summary.skipped += 1;
                continue;
            };

            self.sink.deliver(&reading).await?;
            summary.forwarded += 1;

            if self.max_records.is_some_and(|max| summary.forwarded >= max) {
                break;
            }

            if !self.cycle_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.cycle_delay) => {}
                    _ = &mut shutdown => {
                        info!("Shutdown requested, stopping relay");
                        break;
                    }
                }
            }
        }

        reader.source_mut().close();
        debug!("Released {}", reader.source().identifier());

        info!(
            "Relay stopped: {} forwarded, {} skipped, {} decode failure(s)",
            summary.forwarded,
            summary.skipped,
            summary.decode.total_failures()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use radarlink_core::{RadarLinkError, RadarReading};
    use radarlink_serial::SyntheticDevice;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CollectingSink {
        readings: Mutex<Vec<RadarReading>>,
        fail: bool,
    }

    #[async_trait]
    impl RecordSink for CollectingSink {
        async fn deliver(&self, reading: &RadarReading) -> Result<()> {
            if self.fail {
                anyhow::bail!("collector down");
            }
            self.readings.lock().unwrap().push(*reading);
            Ok(())
        }
    }

    fn scripted(lines: &[&[u8]]) -> RecordReader<SyntheticDevice> {
        let lines = lines.iter().map(|l| l.to_vec()).collect();
        RecordReader::with_poll_interval(SyntheticDevice::cycling(lines).unwrap(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_forwards_until_limit() {
        let relay = Relay::new(CollectingSink::default(), Duration::ZERO).with_max_records(3);
        let reader = RecordReader::new(SyntheticDevice::new());

        let summary = relay.run(reader, std::future::pending()).await.unwrap();

        assert_eq!(summary.forwarded, 3);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.decode.decoded, 3);
        assert_eq!(relay.sink().readings.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_skips_bad_and_partial_records() {
        let relay = Relay::new(CollectingSink::default(), Duration::ZERO).with_max_records(1);
        let reader = scripted(&[
            b"not json at all\r\n",
            b"[1,2,3]\r\n",
            b"{\"L_Dist\": 45.0}\r\n",
            b"{\"L_Dist\": 45.0, \"R_Dist\": 12.5, \"Mv\": 7}\r\n",
        ]);

        let summary = relay.run(reader, std::future::pending()).await.unwrap();

        assert_eq!(summary.forwarded, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.decode.total_failures(), 2);
        assert_eq!(
            relay.sink().readings.lock().unwrap()[0],
            RadarReading {
                left_distance: 45.0,
                right_distance: 12.5,
                motion: 7
            }
        );
    }

    #[tokio::test]
    async fn test_delivery_failure_stops_loop() {
        let sink = CollectingSink {
            fail: true,
            ..Default::default()
        };
        let relay = Relay::new(sink, Duration::ZERO);
        let reader = RecordReader::new(SyntheticDevice::new());

        let result = relay.run(reader, std::future::pending()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_device_loss_stops_loop() {
        struct LostDevice;

        impl LineSource for LostDevice {
            fn is_readable(&self) -> bool {
                false
            }

            fn read_line(&mut self) -> radarlink_core::Result<Vec<u8>> {
                Err(RadarLinkError::DeviceUnavailable("unplugged".to_string()))
            }

            fn identifier(&self) -> &str {
                "/dev/ttyUSB0"
            }
        }

        let relay = Relay::new(CollectingSink::default(), Duration::ZERO);
        let result = relay
            .run(RecordReader::new(LostDevice), std::future::pending())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RadarLinkError>(),
            Some(RadarLinkError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let relay = Relay::new(CollectingSink::default(), Duration::from_millis(10));
        let reader = RecordReader::new(SyntheticDevice::new());

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let summary = relay.run(reader, shutdown).await.unwrap();

        assert!(summary.forwarded >= 1);
    }

    /// Open port on which the sensor never says anything
    #[derive(Clone, Default)]
    struct SilentPort {
        reads: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl LineSource for SilentPort {
        fn is_readable(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }

        fn read_line(&mut self) -> radarlink_core::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn identifier(&self) -> &str {
            "/dev/ttyUSB0"
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_shutdown_with_silent_device() {
        let port = SilentPort::default();
        let relay = Relay::new(CollectingSink::default(), Duration::ZERO);
        let reader = RecordReader::with_poll_interval(port.clone(), Duration::from_millis(1));

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let summary = tokio::time::timeout(Duration::from_secs(5), relay.run(reader, shutdown))
            .await
            .expect("relay did not stop")
            .unwrap();

        assert_eq!(summary.forwarded, 0);
        assert!(port.closed.load(Ordering::SeqCst));

        // No blocking read is left polling the port
        let reads = port.reads.load(Ordering::SeqCst);
        assert!(reads > 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(port.reads.load(Ordering::SeqCst), reads);
    }

    #[test]
    fn test_runtime_drops_after_silent_shutdown() {
        let port = SilentPort::default();
        let runtime = tokio::runtime::Runtime::new().unwrap();

        runtime.block_on(async {
            let relay = Relay::new(CollectingSink::default(), Duration::ZERO);
            let reader = RecordReader::with_poll_interval(port.clone(), Duration::from_millis(1));
            relay
                .run(reader, tokio::time::sleep(Duration::from_millis(20)))
                .await
                .unwrap();
        });

        // Dropping the runtime waits for blocking tasks; it must not hang
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            drop(runtime);
            let _ = done_tx.send(());
        });
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert!(port.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_cycle_delay() {
        let relay = Relay::new(CollectingSink::default(), Duration::from_secs(60));
        let reader = RecordReader::new(SyntheticDevice::new());

        let shutdown = tokio::time::sleep(Duration::from_millis(50));
        let summary = tokio::time::timeout(Duration::from_secs(5), relay.run(reader, shutdown))
            .await
            .expect("relay did not stop")
            .unwrap();

        assert_eq!(summary.forwarded, 1);
    }
}
