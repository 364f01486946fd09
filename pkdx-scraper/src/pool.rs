//! Fixed-size worker pool over a dense id range
//!
//! `pool_size` workers pull ids from one job queue pre-loaded with
//! `[1, total_ids]` and run the task for each. [`run`] returns only after the
//! queue is drained and every worker has exited, so callers can use it as a
//! phase barrier. Completion order across ids is unspecified.

use pkdx_common::{Error, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Classifies a task result for the phase report
pub trait Outcome {
    fn label(&self) -> &'static str;
}

/// Tally of one pool run
#[derive(Debug, Clone, Default)]
pub struct PhaseReport {
    pub phase: String,
    /// Ids whose task ran to completion
    pub processed: usize,
    /// Outcome label → count
    pub outcomes: BTreeMap<&'static str, usize>,
    pub elapsed: Duration,
}

impl PhaseReport {
    /// Number of tasks that ended with `label`
    pub fn count(&self, label: &str) -> usize {
        self.outcomes.get(label).copied().unwrap_or(0)
    }

    fn merge(&mut self, worker: BTreeMap<&'static str, usize>) {
        for (label, count) in worker {
            self.processed += count;
            *self.outcomes.entry(label).or_default() += count;
        }
    }
}

/// Run `task` for every id in `[1, total_ids]` on `pool_size` workers
///
/// Fails if `pool_size` is zero, or after the barrier if any worker panicked.
pub async fn run<F, Fut, O>(phase: &str, task: F, total_ids: u32, pool_size: usize) -> Result<PhaseReport>
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Outcome + Send + 'static,
{
    if pool_size == 0 {
        return Err(Error::InvalidInput(format!(
            "{}: worker pool size must be at least 1",
            phase
        )));
    }

    let start = Instant::now();
    let mut report = PhaseReport {
        phase: phase.to_string(),
        ..PhaseReport::default()
    };

    if total_ids == 0 {
        return Ok(report);
    }

    // Queue holds every id up front, so loading never waits on a worker
    let (job_tx, job_rx) = mpsc::channel::<u32>(total_ids as usize);
    for id in 1..=total_ids {
        job_tx
            .try_send(id)
            .map_err(|e| Error::Internal(format!("{}: job queue rejected id {}: {}", phase, id, e)))?;
    }
    drop(job_tx);

    let job_rx = Arc::new(Mutex::new(job_rx));
    let task = Arc::new(task);
    let mut workers = JoinSet::new();

    for worker_id in 0..pool_size {
        let job_rx = Arc::clone(&job_rx);
        let task = Arc::clone(&task);

        workers.spawn(async move {
            let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();

            loop {
                let next = job_rx.lock().await.recv().await;
                let Some(id) = next else { break };

                let outcome = (*task)(id).await;
                *tally.entry(outcome.label()).or_default() += 1;
            }

            tracing::trace!(worker_id, "Worker drained queue");
            tally
        });
    }

    let mut panicked = 0usize;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(tally) => report.merge(tally),
            Err(e) => {
                panicked += 1;
                tracing::error!(phase, error = %e, "Worker panicked");
            }
        }
    }

    report.elapsed = start.elapsed();

    if panicked > 0 {
        return Err(Error::Internal(format!(
            "{}: {} worker(s) panicked, {} of {} ids completed",
            phase, panicked, report.processed, total_ids
        )));
    }

    Ok(report)
}
