use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use crate::domain::error::DomainError;

/// Runs one task per input on the tokio scheduler and collects the outputs
/// back in input order.
///
/// Outputs land in position-indexed slots owned by the coordinator; tasks
/// only return `(position, value)`. Completions are consumed as they arrive
/// and the first failure ends the call. Whatever is still running is then
/// aborted, or detached and left to finish when `cancel_on_error` is off.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    max_concurrency: usize,
    cancel_on_error: bool,
}

impl FanOut {
    /// `max_concurrency = 0` means no limit.
    pub fn new(max_concurrency: usize, cancel_on_error: bool) -> Self {
        Self {
            max_concurrency,
            cancel_on_error,
        }
    }

    /// `f` receives each item with its position and returns the future to
    /// run for it. The future does not start before a permit is held.
    pub async fn run<I, O, F, Fut>(&self, items: Vec<I>, f: F) -> Result<Vec<O>, DomainError>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(usize, I) -> Fut,
        Fut: Future<Output = Result<O, DomainError>> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let limiter =
            (self.max_concurrency > 0).then(|| Arc::new(Semaphore::new(self.max_concurrency)));
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(total);

        for (position, item) in items.into_iter().enumerate() {
            let fut = f(position, item);
            let limiter = limiter.clone();
            let handle = tasks.spawn(async move {
                let _permit = match limiter {
                    Some(sem) => Some(sem.acquire_owned().await.map_err(|_| {
                        DomainError::enrichment(position, "concurrency limiter closed")
                    })?),
                    None => None,
                };
                fut.await.map(|value| (position, value))
            });
            positions.insert(handle.id(), position);
        }
        debug!(tasks = total, limit = self.max_concurrency, "fan-out started");

        let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((_, Ok((position, value)))) => {
                    slots[position] = Some(value);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(join_err) => {
                    let position = positions.get(&join_err.id()).copied().unwrap_or_default();
                    DomainError::enrichment(position, format!("task failed: {join_err}"))
                }
            };

            let pending = tasks.len();
            if self.cancel_on_error {
                tasks.abort_all();
            } else {
                tasks.detach_all();
            }
            warn!(
                pending,
                aborted = self.cancel_on_error,
                error = %failure,
                "fan-out stopped on first failure"
            );
            return Err(failure);
        }

        let out = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| slot.ok_or_else(|| DomainError::consistency_violation(position)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(tasks = total, "fan-out completed");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn keeps_input_order_when_later_items_finish_first() {
        let fanout = FanOut::new(0, true);
        let items: Vec<u64> = (0..20).collect();

        let out = fanout
            .run(items, |_, n| async move {
                tokio::time::sleep(Duration::from_millis((20 - n) * 5)).await;
                Ok(n * 10)
            })
            .await
            .unwrap();

        assert_eq!(out, (0..20u64).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn empty_input_never_calls_the_closure() {
        let calls = AtomicUsize::new(0);
        let out: Vec<u8> = FanOut::new(4, true)
            .run(Vec::<u8>::new(), |_, n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n) }
            })
            .await
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn large_batches_have_no_lost_or_duplicated_entries() {
        for n in [1usize, 100, 10_000] {
            let out = FanOut::new(0, true)
                .run((0..n).collect::<Vec<usize>>(), |pos, v| async move {
                    assert_eq!(pos, v);
                    Ok(v)
                })
                .await
                .unwrap();
            assert_eq!(out, (0..n).collect::<Vec<_>>());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn first_failure_is_returned() {
        let err = FanOut::new(0, true)
            .run((0..50u64).collect::<Vec<_>>(), |pos, n| async move {
                if n == 17 {
                    return Err(DomainError::enrichment(pos, "boom"));
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(n)
            })
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::enrichment(17, "boom"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn abort_stops_slow_tasks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let res = FanOut::new(0, true)
            .run((0..10u64).collect::<Vec<_>>(), move |pos, n| {
                let counter = counter.clone();
                async move {
                    if n == 0 {
                        return Err(DomainError::enrichment(pos, "fail fast"));
                    }
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(n)
                }
            })
            .await;
        assert!(res.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn detach_lets_slow_tasks_finish() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let res = FanOut::new(0, false)
            .run((0..10u64).collect::<Vec<_>>(), move |pos, n| {
                let counter = counter.clone();
                async move {
                    if n == 0 {
                        return Err(DomainError::enrichment(pos, "fail fast"));
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(n)
                }
            })
            .await;
        assert!(res.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn peak_concurrency_respects_limit() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (running.clone(), peak.clone());

        let out = FanOut::new(3, true)
            .run((0..30u32).collect::<Vec<_>>(), move |_, n| {
                let (running, peak) = (r.clone(), p.clone());
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(n)
                }
            })
            .await
            .unwrap();

        assert_eq!(out.len(), 30);
        let observed = peak.load(Ordering::SeqCst);
        assert!(observed <= 3, "peak {observed} exceeds limit");
        assert!(observed >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn panicking_task_becomes_enrichment_error() {
        let err = FanOut::new(0, true)
            .run((0..5u32).collect::<Vec<_>>(), |_, n| async move {
                if n == 3 {
                    panic!("generator blew up");
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(n)
            })
            .await
            .unwrap_err();

        match err {
            DomainError::Enrichment { position, message } => {
                assert_eq!(position, 3);
                assert!(message.contains("panic"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
