use crate::pipeline::Scout;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorSummary {
    pub cycles_ok: u64,
    pub cycles_failed: u64,
}

/// Runs cycles back to back with a fixed pause between them.
///
/// A failed cycle is logged and counted; the loop carries on after the usual
/// pause. The shutdown future is checked both during a cycle and during the
/// pause, and a cycle in flight is dropped when it fires.
pub struct Supervisor {
    scout: Scout,
    interval: Duration,
}

impl Supervisor {
    pub fn new(scout: Scout) -> Self {
        let interval = scout.config().schedule.poll_interval();
        Self { scout, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run<F>(&self, shutdown: F) -> SupervisorSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = SupervisorSummary::default();

        loop {
            info!("Starting scrape cycle");
            tokio::select! {
                result = self.scout.run_cycle() => match result {
                    Ok(report) => {
                        summary.cycles_ok += 1;
                        info!(
                            accepted = report.accepted.len(),
                            ignored = report.ignored.len(),
                            notify_failures = report.stats.notify_failures,
                            "Successfully finished scraping"
                        );
                    }
                    Err(e) => {
                        summary.cycles_failed += 1;
                        error!("Error with the scraping: {:?}", e);
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested, abandoning current cycle");
                    return summary;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return summary;
                }
            }
        }
    }
}
