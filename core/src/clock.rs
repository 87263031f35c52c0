//! Frame clock. Turns frame timestamps into capped deltas and owns the
//! deferred one-shot tasks that run between races.
//!
//! Deferred tasks carry the epoch they were scheduled in. `cancel_all()`
//! bumps the epoch, so a task scheduled before a reset can never fire
//! after it.

use crate::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    StartNextRace,
}

#[derive(Debug, Clone)]
struct Pending {
    epoch:  u64,
    due_at: Millis,
    task:   DeferredTask,
}

#[derive(Debug, Clone)]
pub struct FrameClock {
    max_delta_ms: Millis,
    last_frame:   Option<Millis>,
    epoch:        u64,
    pending:      Vec<Pending>,
}

impl FrameClock {
    pub fn new(max_delta_ms: Millis) -> Self {
        Self {
            max_delta_ms,
            last_frame: None,
            epoch: 0,
            pending: Vec::new(),
        }
    }

    /// Record a frame at `now` and return the elapsed time since the
    /// previous one, capped at `max_delta_ms`. The first frame after a
    /// rewind yields 0.
    pub fn delta(&mut self, now: Millis) -> Millis {
        let delta = match self.last_frame {
            Some(last) => (now - last).clamp(0.0, self.max_delta_ms),
            None => 0.0,
        };
        self.last_frame = Some(now);
        delta
    }

    /// Forget the last frame so the next delta starts from zero.
    pub fn rewind(&mut self) {
        self.last_frame = None;
    }

    pub fn schedule(&mut self, task: DeferredTask, due_at: Millis) {
        self.pending.push(Pending { epoch: self.epoch, due_at, task });
    }

    /// Drop every pending task. Anything scheduled before this call can
    /// no longer fire.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.epoch += 1;
        self.last_frame = None;
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Remove and return tasks due at or before `now`, in scheduling order.
    /// Tasks from an older epoch are discarded.
    pub fn take_due(&mut self, now: Millis) -> Vec<DeferredTask> {
        let epoch = self.epoch;
        let mut due = Vec::new();
        self.pending.retain(|p| {
            if p.epoch != epoch {
                return false;
            }
            if p.due_at <= now {
                due.push(p.task);
                return false;
            }
            true
        });
        due
    }
}
