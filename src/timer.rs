/// What a single one-second tick did to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; seconds left after this tick.
    Running(u32),
    /// Reached zero on this tick. Reported once.
    Expired,
    /// Paused or already stopped; nothing changed.
    Idle,
}

/// Per-question countdown in whole seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionTimer {
    budget: u32,
    remaining: u32,
    paused: bool,
    stopped: bool,
}

impl QuestionTimer {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: budget,
            paused: false,
            stopped: budget == 0,
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Freeze the count without resetting it.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Start over with `budget` seconds, running and unpaused.
    pub fn reset(&mut self, budget: u32) {
        *self = Self::new(budget);
    }

    pub fn tick(&mut self) -> Tick {
        if self.paused || self.stopped {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stopped = true;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// The last few seconds, shown as a warning
    pub fn is_running_out(&self) -> bool {
        self.remaining <= 5
    }
}
