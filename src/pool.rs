//! The worker model shared by the multi-threaded computations.
//!
//! Each worker thread grabs the next unprocessed task index from a shared counter until none are
//! left. Workers keep their own accumulator, which is returned when the thread finishes and then
//! reduced by the caller, so no state is shared beyond the counter.

use std::{
    num::NonZeroUsize,
    panic,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use tracing::trace;

pub(crate) const MIN_NUM_THREADS: usize = 1;
pub(crate) const MAX_NUM_THREADS: usize = 128;

/// The thread count used when none is configured.
pub(crate) fn default_num_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(MIN_NUM_THREADS)
}

/// Runs `task` for every index in `0..num_tasks` and returns the accumulator of each worker.
///
/// `init` creates a worker's accumulator, `task` folds one index into it. The thread count is
/// clamped to `MIN_NUM_THREADS..=MAX_NUM_THREADS` and never exceeds the number of tasks.
pub(crate) fn run<A, I, F>(num_tasks: usize, num_threads: usize, init: I, task: F) -> Vec<A>
where
    A: Send,
    I: Fn() -> A + Sync,
    F: Fn(usize, &mut A) + Sync,
{
    let num_threads = num_threads
        .clamp(MIN_NUM_THREADS, MAX_NUM_THREADS)
        .min(num_tasks.max(MIN_NUM_THREADS));

    let counter = AtomicUsize::new(0);
    let (counter, init, task) = (&counter, &init, &task);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..num_threads)
            .map(|worker| {
                scope.spawn(move || {
                    let mut acc = init();
                    let mut processed = 0;

                    loop {
                        let index = counter.fetch_add(1, Ordering::Relaxed);
                        if index >= num_tasks {
                            break;
                        }

                        task(index, &mut acc);
                        processed += 1;
                    }

                    trace!(worker = worker, processed = processed, "worker done");
                    acc
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_task_runs_once() {
        let accs = run(100, 4, Vec::new, |index, acc: &mut Vec<usize>| acc.push(index));

        let mut seen: Vec<usize> = accs.into_iter().flatten().collect();
        seen.sort_unstable();

        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn threads_never_exceed_tasks() {
        let accs = run(2, 16, || 0usize, |_, acc| *acc += 1);

        assert_eq!(accs.len(), 2);
        assert_eq!(accs.iter().sum::<usize>(), 2);
    }

    #[test]
    fn zero_tasks() {
        let accs = run(0, 0, || 0usize, |_, acc| *acc += 1);

        assert_eq!(accs, vec![0]);
    }

    #[test]
    fn default_num_threads_is_positive() {
        assert!(default_num_threads() >= MIN_NUM_THREADS);
    }
}
