//! Stress tests for DirDB.
//!
//! These helpers hammer one collection from many threads, each with its
//! own `Database` handle, the way independent processes would.

use dirdb_core::{Database, Id};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of the padding string in each document.
    pub document_size: usize,
    /// Collection to operate on.
    pub collection: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 100,
            threads: 4,
            document_size: 256,
            collection: "stress".to_string(),
        }
    }
}

fn document(thread: usize, op: usize, size: usize) -> Vec<u8> {
    format!(
        r#"{{"thread":{thread},"op":{op},"pad":"{}"}}"#,
        "x".repeat(size)
    )
    .into_bytes()
}

/// Runs `threads × operations` concurrent creates and returns every
/// identifier handed out alongside the timing result.
pub fn stress_concurrent_creates(root: &Path, config: &StressConfig) -> (StressTestResult, Vec<Id>) {
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let root = root.to_path_buf();
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);
            let config = config.clone();

            thread::spawn(move || {
                let db = Database::open(&root).expect("Failed to open database");
                let collection = db.collection(&config.collection).expect("valid name");
                barrier.wait();

                let mut ids = Vec::with_capacity(config.operations);
                for i in 0..config.operations {
                    match collection.create(&document(t, i, config.document_size)) {
                        Ok(id) => ids.push(id),
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                ids
            })
        })
        .collect();

    let ids: Vec<Id> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("Thread panicked"))
        .collect();

    let result = StressTestResult::new(ids.len(), failed.load(Ordering::Relaxed), start.elapsed());
    (result, ids)
}

/// Runs readers and writers against the same collection at once.
///
/// Half the threads update a shared set of documents; the other half read
/// them and count any payload that is not valid JSON as a failure.
pub fn stress_readers_writers(root: &Path, config: &StressConfig) -> StressTestResult {
    let db = Database::open(root).expect("Failed to open database");
    let collection = db.collection(&config.collection).expect("valid name");
    let seeded: Vec<Id> = (0..config.threads.max(1))
        .map(|t| {
            collection
                .create(&document(t, 0, config.document_size))
                .expect("Failed to seed document")
        })
        .collect();
    let seeded = Arc::new(seeded);

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let collection = collection.clone();
            let seeded = Arc::clone(&seeded);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let config = config.clone();

            thread::spawn(move || {
                for i in 0..config.operations {
                    let id = &seeded[(t + i) % seeded.len()];
                    let ok = if t % 2 == 0 {
                        collection
                            .update(id, &document(t, i, config.document_size))
                            .is_ok()
                    } else {
                        collection.read(id).is_ok_and(|data| {
                            serde_json::from_slice::<serde_json::Value>(&data).is_ok()
                        })
                    };
                    let counter = if ok { &successful } else { &failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Returns true if every identifier in `ids` is distinct.
pub fn all_distinct(ids: &[Id]) -> bool {
    ids.iter().collect::<HashSet<_>>().len() == ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_config() -> StressConfig {
        StressConfig {
            operations: 20,
            threads: 4,
            document_size: 32,
            collection: "stress".to_string(),
        }
    }

    #[test]
    fn concurrent_creates_are_distinct() {
        let temp = tempdir().unwrap();
        let config = small_config();

        let (result, ids) = stress_concurrent_creates(temp.path(), &config);

        assert_eq!(result.failed_ops, 0);
        assert_eq!(ids.len(), config.threads * config.operations);
        assert!(all_distinct(&ids));

        let listed = Database::open(temp.path())
            .unwrap()
            .collection("stress")
            .unwrap()
            .list()
            .unwrap();
        assert_eq!(listed.len(), ids.len());
    }

    #[test]
    fn readers_and_writers_never_fail() {
        let temp = tempdir().unwrap();
        let config = small_config();

        let result = stress_readers_writers(temp.path(), &config);

        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, config.threads * config.operations);
        assert!(result.ops_per_second > 0.0);
    }
}
