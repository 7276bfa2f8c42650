use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

/// Runs `work` over every job on at most `parallelism` scoped threads and
/// returns the results in submission order. `on_entry` fires on the calling
/// thread as results arrive, in completion order.
pub(crate) fn run_pool<J, R, F>(
    jobs: &[J],
    parallelism: usize,
    work: F,
    on_entry: &mut dyn FnMut(&R),
) -> Vec<R>
where
    J: Sync,
    R: Send,
    F: Fn(&J) -> R + Sync,
{
    if parallelism <= 1 || jobs.len() <= 1 {
        return jobs
            .iter()
            .map(|job| {
                let entry = work(job);
                on_entry(&entry);
                entry
            })
            .collect();
    }

    let worker_count = parallelism.max(1).min(jobs.len());
    let next_index = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, R)>();

    let mut entries: Vec<(usize, R)> = std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index_ref = &next_index;
            let work_ref = &work;
            scope.spawn(move || loop {
                let job_idx = next_index_ref.fetch_add(1, Ordering::Relaxed);
                if job_idx >= jobs.len() {
                    break;
                }
                let entry = work_ref(&jobs[job_idx]);
                if tx.send((job_idx, entry)).is_err() {
                    break;
                }
            });
        }

        drop(tx);

        let mut entries = Vec::with_capacity(jobs.len());
        for (order_idx, entry) in rx {
            on_entry(&entry);
            entries.push((order_idx, entry));
        }
        entries
    });

    entries.sort_by_key(|(order_idx, _)| *order_idx);
    entries.into_iter().map(|(_, entry)| entry).collect()
}
