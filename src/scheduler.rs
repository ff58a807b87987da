use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::clock;
use crate::config::Settings;
use crate::logging::LogSink;
use crate::pipeline;
use crate::terminal;

const BATCH_COOLDOWN: Duration = Duration::from_secs(2);

const ERROR_LOG_FILE: &str = "error_log.txt";
const EXECUTION_LOG_FILE: &str = "execution_log.txt";

/// One wallet's result for one cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub address: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct CycleReport {
    pub outcomes: Vec<CycleOutcome>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }
}

/// Consecutive index ranges of at most `size` wallets each; the last group
/// may be smaller.
fn batch_ranges(total: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

/// Drives cycles over the loaded wallets: fans each group out to concurrent
/// pipelines, joins them, and re-runs the whole pass at noon (UTC+8) daily.
pub struct Engine {
    settings: Arc<Settings>,
    error_log: LogSink,
    execution_log: LogSink,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self::with_sinks(
            settings,
            LogSink::new(ERROR_LOG_FILE),
            LogSink::new(EXECUTION_LOG_FILE),
        )
    }

    pub fn with_sinks(settings: Settings, error_log: LogSink, execution_log: LogSink) -> Self {
        Self {
            settings: Arc::new(settings),
            error_log,
            execution_log,
        }
    }

    /// One full pass over every wallet. Groups of `concurrency` run their
    /// pipelines concurrently; one pipeline's failure never cancels its
    /// siblings, and every failure is converted into a logged outcome rather
    /// than aborting the batch.
    pub async fn run_cycle(&self, cycle: u64) -> CycleReport {
        let wallet_count = self.settings.wallets.len();
        info!(cycle, wallets = wallet_count, "starting cycle");
        let started = Instant::now();

        let groups = batch_ranges(wallet_count, self.settings.concurrency);
        let group_count = groups.len();
        let mut outcomes = Vec::with_capacity(wallet_count);

        for (group, range) in groups.into_iter().enumerate() {
            let mut handles = Vec::with_capacity(range.len());
            for index in range {
                let settings = Arc::clone(&self.settings);
                let address = settings.wallets[index].address.clone();
                let handle = tokio::spawn(async move {
                    pipeline::run_account(&settings, index)
                        .await
                        .map_err(|e| e.to_string())
                });
                handles.push((address, handle));
            }

            // The group completes when every member has; a failed or even
            // panicked pipeline only fails its own wallet.
            for (address, handle) in handles {
                let outcome = match handle.await {
                    Ok(Ok(())) => CycleOutcome {
                        address,
                        success: true,
                        error: None,
                    },
                    Ok(Err(detail)) => CycleOutcome {
                        address,
                        success: false,
                        error: Some(detail),
                    },
                    Err(join_err) => CycleOutcome {
                        address,
                        success: false,
                        error: Some(format!("pipeline aborted: {join_err}")),
                    },
                };

                if let Some(detail) = &outcome.error {
                    error!(wallet = %outcome.address, "wallet failed: {detail}");
                    self.error_log
                        .append(&format!(
                            "{} - wallet {} failed: {}",
                            Utc::now().to_rfc3339(),
                            outcome.address,
                            detail
                        ))
                        .await;
                }
                outcomes.push(outcome);
            }

            if group + 1 < group_count {
                tokio::time::sleep(BATCH_COOLDOWN).await;
            }
        }

        let elapsed = started.elapsed();
        let report = CycleReport { outcomes, elapsed };
        info!(
            cycle,
            succeeded = report.succeeded(),
            failed = wallet_count - report.succeeded(),
            elapsed_secs = elapsed.as_secs_f64(),
            "cycle complete"
        );
        self.execution_log
            .append(&format!(
                "{} - cycle {} complete, processed {} wallets in {:.2}s",
                Utc::now().to_rfc3339(),
                cycle,
                wallet_count,
                elapsed.as_secs_f64()
            ))
            .await;
        report
    }

    /// The recurrence loop: run a cycle, sleep until the next noon boundary,
    /// repeat. Ctrl-C is honored at the sleep boundary.
    pub async fn run(&self) -> Result<()> {
        let mut cycle = 1u64;
        loop {
            self.run_cycle(cycle).await;

            let now = Utc::now();
            let wake_at = clock::next_noon(now);
            let delay = clock::time_until_next_noon(now);
            terminal::print_schedule(&format!(
                "next cycle at {} ({} from now)",
                wake_at.to_rfc3339(),
                clock::format_time_remaining(delay)
            ));

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested, stopping scheduler");
                    return Ok(());
                }
            }
            cycle += 1;
        }
    }
}
