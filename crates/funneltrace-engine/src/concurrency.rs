//! Bounded-concurrency mapping primitive.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

/// Apply an async `mapper` to every item with at most `concurrency` calls
/// in flight, returning results in input order.
///
/// The effective worker count is `concurrency` clamped to `1..=items.len()`.
/// Workers share an atomic cursor: each claims the next unclaimed index and
/// writes its result into that index's slot, so a slow item never blocks
/// unrelated items from starting and `output[i]` always corresponds to
/// `items[i]` regardless of completion order.
///
/// A mapper error fails the whole call. Callers that need per-item fault
/// tolerance wrap the mapper and substitute a sentinel, as
/// [`crate::resolver::resolve_session_details`] does.
pub async fn map_with_concurrency<T, R, F, Fut>(
    items: &[T],
    concurrency: usize,
    mapper: F,
) -> Result<Vec<R>>
where
    T: Clone,
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let worker_count = concurrency.clamp(1, items.len());
    let cursor = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..items.len()).map(|_| None).collect());

    let workers = (0..worker_count).map(|_| {
        let cursor = &cursor;
        let slots = &slots;
        let mapper = &mapper;
        async move {
            loop {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    return Ok::<_, anyhow::Error>(());
                }
                let result = mapper(items[index].clone(), index).await?;
                let mut slots = slots
                    .lock()
                    .map_err(|_| anyhow!("mapper result slots poisoned"))?;
                slots[index] = Some(result);
            }
        }
    });

    // Fail-fast join: the first worker error drops the remaining workers.
    futures::future::try_join_all(workers).await?;

    let slots = slots
        .into_inner()
        .map_err(|_| anyhow!("mapper result slots poisoned"))?;
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or_else(|| anyhow!("missing mapped result for index {index}")))
        .collect()
}
