//! Workload Module
//!
//! Replays loaded blocks against a key-value store and times each phase.
//!
//! ## Work Split
//! With `n` blocks and `t` threads each thread gets `n / t` items; thread
//! `j` takes indices `j, j + t, j + 2t, ...`. The remainder is not used, so
//! every phase touches exactly `(n / t) * t` keys.
//!
//! ## Phases
//! - set:    `hash -> raw_bytes` for every block
//! - get:    look up every hash, a thread stops at its first miss
//! - mixed:  get phase while one extra thread keeps setting synthetic keys
//! - delete: remove every hash

use std::fmt;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, TryRecvError};
use sha2::{Digest, Sha256};

use crate::block::{RawBlock, RAW_BLOCK_SIZE};
use crate::error::{Result, XdagError};
use crate::kv::KvStore;

/// Benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Set,
    Get,
    MixedSet,
    MixedGet,
    Delete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Set => "set",
            Phase::Get => "get",
            Phase::MixedSet => "setmixed",
            Phase::MixedGet => "getmixed",
            Phase::Delete => "del",
        };
        f.write_str(name)
    }
}

/// Timing of one phase
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Operations issued
    pub ops: u64,
    pub elapsed: Duration,
    /// One flag per worker thread, set when the worker saw a missing key
    pub failed_threads: Vec<bool>,
}

impl PhaseReport {
    /// Throughput, `None` when no operations ran
    pub fn ops_per_sec(&self) -> Option<f64> {
        if self.ops == 0 {
            return None;
        }
        Some(self.ops as f64 / self.elapsed.as_secs_f64().max(f64::MIN_POSITIVE))
    }

    /// Mean wall time per operation, `None` when no operations ran
    pub fn mean_latency(&self) -> Option<Duration> {
        if self.ops == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            (self.elapsed.as_nanos() / u128::from(self.ops)) as u64,
        ))
    }

    /// Whether any worker saw a missing key
    pub fn has_failures(&self) -> bool {
        self.failed_threads.iter().any(|&failed| failed)
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ops_per_sec(), self.mean_latency()) {
            (Some(rate), Some(mean)) => write!(
                f,
                "{} rate: {:.0} op/s, mean: {} ns, took: {:.3} s, ops: {}",
                self.phase,
                rate,
                mean.as_nanos(),
                self.elapsed.as_secs_f64(),
                self.ops
            ),
            _ => write!(
                f,
                "{} rate: -1 op/s, mean: -1 ns, took: {:.3} s",
                self.phase,
                self.elapsed.as_secs_f64()
            ),
        }
    }
}

/// Reports from the mixed phase
#[derive(Debug, Clone)]
pub struct MixedReport {
    pub reads: PhaseReport,
    pub writes: PhaseReport,
}

/// Runs benchmark phases for one store and one block set
pub struct Workload<'a> {
    store: &'a dyn KvStore,
    blocks: &'a [RawBlock],
    threads: usize,
    per_thread: usize,
}

impl<'a> Workload<'a> {
    pub fn new(store: &'a dyn KvStore, blocks: &'a [RawBlock], threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(XdagError::Config("concurrency must be at least 1".to_string()));
        }
        if blocks.is_empty() {
            return Err(XdagError::Config("no blocks to replay".to_string()));
        }
        let per_thread = blocks.len() / threads;
        tracing::debug!(
            "Workload: {} threads x {} blocks = {}",
            threads,
            per_thread,
            per_thread * threads
        );
        Ok(Self {
            store,
            blocks,
            threads,
            per_thread,
        })
    }

    /// Keys each phase touches
    pub fn total_ops(&self) -> usize {
        self.per_thread * self.threads
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Set every block's raw bytes under its hash
    pub fn run_set(&self) -> Result<PhaseReport> {
        self.run_phase(Phase::Set, |block| {
            self.store.set(block.hash(), block.raw_bytes())?;
            Ok(true)
        })
    }

    /// Get every block's hash
    pub fn run_get(&self) -> Result<PhaseReport> {
        self.run_phase(Phase::Get, |block| {
            Ok(self.store.get(block.hash())?.is_some())
        })
    }

    /// Get every hash while a background writer sets synthetic keys
    pub fn run_mixed(&self) -> Result<MixedReport> {
        let keys = synthetic_keys(self.blocks.len());
        let value = [0u8; RAW_BLOCK_SIZE];
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);

        let (reads, writes) = crossbeam::scope(|scope| {
            let writer = scope.spawn(move |_| -> Result<(u64, Duration)> {
                let started = Instant::now();
                let mut written = 0u64;
                for key in keys.iter().cycle() {
                    match stop_rx.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        _ => break,
                    }
                    self.store.set(key, &value)?;
                    written += 1;
                }
                Ok((written, started.elapsed()))
            });

            let reads = self.run_phase(Phase::MixedGet, |block| {
                Ok(self.store.get(block.hash())?.is_some())
            });
            drop(stop_tx);

            let writes = writer
                .join()
                .map_err(|_| XdagError::Store("mixed writer thread panicked".to_string()))
                .and_then(|result| result);
            (reads, writes)
        })
        .map_err(|_| XdagError::Store("mixed phase thread panicked".to_string()))?;

        let reads = reads?;
        let (written, elapsed) = writes?;
        tracing::debug!("Mixed writer set {} synthetic keys", written);

        Ok(MixedReport {
            reads,
            writes: PhaseReport {
                phase: Phase::MixedSet,
                ops: written,
                elapsed,
                failed_threads: vec![false],
            },
        })
    }

    /// Delete every block's hash
    pub fn run_delete(&self) -> Result<PhaseReport> {
        self.run_phase(Phase::Delete, |block| {
            self.store.del(block.hash())?;
            Ok(true)
        })
    }

    /// Run `op` over the strided work split on `threads` scoped threads
    ///
    /// `op` returns `Ok(false)` to mark its thread failed and stop it early.
    fn run_phase<F>(&self, phase: Phase, op: F) -> Result<PhaseReport>
    where
        F: Fn(&RawBlock) -> Result<bool> + Sync,
    {
        let started = Instant::now();
        let op = &op;

        let outcomes = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..self.threads)
                .map(|j| {
                    scope.spawn(move |_| -> Result<bool> {
                        for i in (j..).step_by(self.threads).take(self.per_thread) {
                            if !op(&self.blocks[i])? {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| XdagError::Store(format!("{} worker panicked", phase)))
                        .and_then(|result| result)
                })
                .collect::<Result<Vec<bool>>>()
        })
        .map_err(|_| XdagError::Store(format!("{} phase thread panicked", phase)))?;

        let failed_threads = outcomes?;
        let report = PhaseReport {
            phase,
            ops: self.total_ops() as u64,
            elapsed: started.elapsed(),
            failed_threads,
        };
        if report.has_failures() {
            tracing::warn!("{} phase: some workers hit missing keys", phase);
        }
        Ok(report)
    }
}

/// Keys that cannot collide with real block hashes in practice
///
/// Key `k` is the double SHA-256 of the decimal string of `k`.
pub fn synthetic_keys(count: usize) -> Vec<[u8; 32]> {
    (0..count)
        .map(|k| Sha256::digest(Sha256::digest(k.to_string().as_bytes())).into())
        .collect()
}
