//! Observability handle threaded into every parser.
//!
//! Logging goes through `tracing` and is a no-op until the host installs a
//! subscriber. Block timings go to an optional [`MetricsRecorder`]; without
//! one, timers are still started and stopped but nothing is recorded.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Measurements for one harvested block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMetrics {
    pub parser: String,
    pub lines: usize,
    pub garbage_lines: usize,
    pub warnings: usize,
    pub errors: usize,
    #[serde(with = "duration_micros")]
    pub elapsed: Duration,
}

/// Sink for block measurements.
pub trait MetricsRecorder: Send + Sync {
    fn record(&self, metrics: BlockMetrics);
}

/// Recorder that keeps every measurement in memory.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    blocks: Mutex<Vec<BlockMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<BlockMetrics> {
        match self.blocks.lock() {
            Ok(blocks) => blocks.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsRecorder for MetricsCollector {
    fn record(&self, metrics: BlockMetrics) {
        match self.blocks.lock() {
            Ok(mut blocks) => blocks.push(metrics),
            Err(poisoned) => poisoned.into_inner().push(metrics),
        }
    }
}

/// Cheap, clonable diagnostics context.
#[derive(Clone, Default)]
pub struct Diagnostics {
    recorder: Option<Arc<dyn MetricsRecorder>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

impl Diagnostics {
    /// Diagnostics that only log.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn with_recorder(recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    pub fn start_timer(&self, parser: &'static str) -> BlockTimer {
        BlockTimer {
            parser,
            started: Instant::now(),
        }
    }

    /// Stops `timer` and forwards the block's counts to the recorder.
    pub fn stop_timer(&self, timer: BlockTimer, counts: BlockCounts) {
        let elapsed = timer.started.elapsed();
        tracing::debug!(
            parser = timer.parser,
            lines = counts.lines,
            garbage = counts.garbage_lines,
            warnings = counts.warnings,
            errors = counts.errors,
            elapsed_us = elapsed.as_micros() as u64,
            "block harvested"
        );
        if let Some(recorder) = &self.recorder {
            recorder.record(BlockMetrics {
                parser: timer.parser.to_string(),
                lines: counts.lines,
                garbage_lines: counts.garbage_lines,
                warnings: counts.warnings,
                errors: counts.errors,
                elapsed,
            });
        }
    }
}

/// Running timer for one block.
#[derive(Debug)]
pub struct BlockTimer {
    parser: &'static str,
    started: Instant,
}

/// Line and diagnostic counts reported when a timer stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCounts {
    pub lines: usize,
    pub garbage_lines: usize,
    pub warnings: usize,
    pub errors: usize,
}

mod duration_micros {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_micros() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_micros)
    }
}
