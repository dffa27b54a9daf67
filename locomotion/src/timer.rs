//! One-shot timers advanced by the character tick.

/// Identifies a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Reset the braking friction factor raised on landing.
    LandFrictionReset,
    /// Camera action held long enough to switch view mode.
    CameraModeSwap,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    handle: TimerHandle,
    due: f64,
    event: TimerEvent,
}

/// Single-threaded queue of one-shot timers keyed on simulation time.
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<Pending>,
    next_id: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, now: f64, delay: f32, event: TimerEvent) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            due: now + f64::from(delay.max(0.0)),
            event,
        });
        handle
    }

    /// Cancel a timer. Clearing a fired or unknown handle does nothing.
    pub fn clear(&mut self, handle: TimerHandle) {
        self.pending.retain(|p| p.handle != handle);
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<TimerEvent> {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due));
        due.into_iter().map(|p| p.event).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
