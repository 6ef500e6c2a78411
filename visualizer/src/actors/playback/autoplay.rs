//! Autoplay timer for one cursor.
//!
//! A scheduler is a tokio interval task that reports ticks through a
//! [`TickSink`]. It never touches a cursor itself: the controller receives
//! each tick, checks its identity and advances. Dropping the scheduler aborts
//! the task.

use std::sync::Arc;
use std::time::Duration;

use shared_types::{TraceId, TraceKind};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One timer firing, stamped with the trace and scheduler it was armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoplayTick {
    pub lane: TraceKind,
    pub trace_id: TraceId,
    pub generation: u64,
}

/// Delivers ticks to the controller. Returns `false` once the receiver is
/// gone, which ends the timer task.
pub type TickSink = Arc<dyn Fn(AutoplayTick) -> bool + Send + Sync>;

#[derive(Debug)]
pub struct AutoplayScheduler {
    generation: u64,
    handle: JoinHandle<()>,
}

impl AutoplayScheduler {
    /// Start firing `tick` every `interval`. The first tick fires one full
    /// interval from now.
    pub fn arm(interval: Duration, tick: AutoplayTick, sink: TickSink) -> Self {
        let generation = tick.generation;
        let start = Instant::now() + interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !sink(tick.clone()) {
                    break;
                }
            }
        });
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for AutoplayScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
