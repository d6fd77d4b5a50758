use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::game::{GameAction, GameEvent, RoundId};

/// Unified event type consumed by the app runner
#[derive(Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// Produced off the main thread (loading) and fed to the game as is.
    Game(GameEvent),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;

    /// Handle for background work that reports back into the same stream
    fn sender(&self) -> Sender<QuizEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if input_tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if input_tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "terminal input reader stopped");
                    break;
                }
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    tx: Sender<QuizEvent>,
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<QuizEvent> {
        self.tx.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn sender(&self) -> Sender<QuizEvent> {
        self.event_source.sender()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }
}

/// Deadlines for the question countdown and the post-answer advance.
///
/// Each deadline remembers the round it belongs to; the game drops anything
/// addressed to a round that is no longer on screen.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tick_every: Duration,
    countdown: Option<(RoundId, Instant)>,
    advance: Option<(RoundId, Instant)>,
}

impl Scheduler {
    pub fn new(tick_every: Duration) -> Self {
        Self {
            tick_every,
            countdown: None,
            advance: None,
        }
    }

    /// Take over the timing part of a game action. Returns false for actions it does not own.
    pub fn apply(&mut self, action: &GameAction, now: Instant) -> bool {
        match action {
            GameAction::StartTimer { round } => {
                self.countdown = Some((*round, now + self.tick_every));
                true
            }
            GameAction::StopTimer => {
                self.countdown = None;
                true
            }
            GameAction::ScheduleAdvance { round, delay } => {
                self.advance = Some((*round, now + *delay));
                true
            }
            GameAction::CancelScheduled => {
                self.countdown = None;
                self.advance = None;
                true
            }
            GameAction::Fetch { .. } | GameAction::CancelFetch { .. } | GameAction::Render => {
                false
            }
        }
    }

    /// Events whose deadline has passed, in deadline order.
    pub fn due(&mut self, now: Instant) -> Vec<GameEvent> {
        let mut fired: Vec<(Instant, GameEvent)> = Vec::new();

        if let Some((round, mut at)) = self.countdown {
            while at <= now {
                fired.push((at, GameEvent::TimerTick { round }));
                at += self.tick_every;
            }
            self.countdown = Some((round, at));
        }

        if let Some((round, at)) = self.advance {
            if at <= now {
                fired.push((at, GameEvent::AdvanceDue { round }));
                self.advance = None;
            }
        }

        fired.sort_by_key(|(at, _)| *at);
        fired.into_iter().map(|(_, ev)| ev).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.countdown.is_none() && self.advance.is_none()
    }
}
