//! Bounded worker pool over scoped threads.
//!
//! Workers claim the next unclaimed item through a shared atomic counter
//! until none remain. A panic that escapes `task` is re-raised on the calling
//! thread once every worker has been joined, and the results of the other
//! items are lost; callers that need them must catch panics inside `task`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Run `task` over every item on at most `workers` threads.
///
/// Results come back in item order. With `workers <= 1` or a single item
/// the work runs on the calling thread.
pub fn run_bounded<T, R, F>(items: &[T], workers: usize, task: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.clamp(1, items.len().max(1));
    if workers == 1 {
        return items.iter().map(&task).collect();
    }

    let next_item = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, R)> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let next_item = &next_item;
                let task = &task;
                s.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next_item.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        done.push((index, task(item)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    });

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
