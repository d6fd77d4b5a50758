//! Game progression state machine.
//!
//! [`Game`] is pure: it consumes [`GameEvent`]s (with the current instant) and
//! returns [`GameAction`]s for the runtime to carry out. It never touches the
//! network, the terminal, or a clock of its own, so every transition can be
//! driven from tests.
//!
//! Flow: `Config -> Loading -> Playing(0..n) -> Results`, with `LoadingError`
//! reachable from `Loading` only.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{FetchError, ValidationError};
use crate::form::{validate, GameConfig, RawConfig};
use crate::question::{AnswerId, AnswerOption, Question};
use crate::summary::Summary;
use crate::timer::{QuestionTimer, Tick};
use crate::util::round_secs;

pub const POINTS_PER_CORRECT: u32 = 10;

/// Identifies one loading attempt. Results tagged with an older id are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Identifies one question on screen. Timer ticks and advances carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundId(pub u64);

/// Pacing knobs for a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub question_secs: u32,
    pub reveal_delay: Duration,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            question_secs: 20,
            reveal_delay: Duration::from_millis(1500),
        }
    }
}

impl From<&Settings> for Rules {
    fn from(settings: &Settings) -> Self {
        Self {
            question_secs: settings.question_secs.max(1),
            reveal_delay: settings.reveal_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    Fetching,
    Translating { current: usize, total: usize },
}

/// Questions ready to play, plus how many translation batches fell back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedQuestions {
    pub questions: Vec<Question>,
    pub translate_failures: u32,
}

#[derive(Debug)]
pub enum GameEvent {
    Submit(RawConfig),
    LoadProgress {
        session: SessionId,
        progress: LoadProgress,
    },
    QuestionsLoaded {
        session: SessionId,
        result: Result<LoadedQuestions, FetchError>,
    },
    Answer(AnswerId),
    TimerTick {
        round: RoundId,
    },
    AdvanceDue {
        round: RoundId,
    },
    /// Dismiss the loading error screen.
    Acknowledge,
    RestartSame,
    RestartConfig,
    /// Leave a game that is loading or in progress.
    Abandon,
}

/// Instructions for the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    Fetch {
        session: SessionId,
        config: GameConfig,
    },
    /// Start a one-second ticker for this round.
    StartTimer {
        round: RoundId,
    },
    StopTimer,
    ScheduleAdvance {
        round: RoundId,
        delay: Duration,
    },
    /// Drop every pending tick and advance.
    CancelScheduled,
    /// Stop the background load for this session; its result is no longer wanted.
    CancelFetch {
        session: SessionId,
    },
    Render,
}

/// Authoritative state of one play-through
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub config: GameConfig,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub score: u32,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub times: Vec<u64>,
    pub translate_failures: u32,
}

impl Session {
    fn new(config: GameConfig, loaded: LoadedQuestions) -> Self {
        Self {
            config,
            questions: loaded.questions,
            current_index: 0,
            score: 0,
            correct_count: 0,
            incorrect_count: 0,
            times: Vec::new(),
            translate_failures: loaded.translate_failures,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn resolved(&self) -> usize {
        self.correct_count + self.incorrect_count
    }

    fn summary(&self) -> Summary {
        Summary::compute(
            &self.config.player_name,
            self.score,
            self.correct_count,
            self.questions.len(),
            &self.times,
            self.translate_failures,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Answered { selected: AnswerId },
    TimedOut,
}

impl RoundOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, RoundOutcome::Answered { selected } if selected.is_correct())
    }
}

/// The question currently on screen
#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub options: Vec<AnswerOption>,
    pub timer: QuestionTimer,
    pub started_at: Instant,
    pub outcome: Option<RoundOutcome>,
}

impl Round {
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug)]
pub enum Phase {
    Config {
        errors: Option<ValidationError>,
    },
    Loading {
        session: SessionId,
        config: GameConfig,
        progress: LoadProgress,
    },
    Playing {
        session: Session,
        round: Round,
    },
    Results {
        session: Session,
        summary: Summary,
    },
    LoadingError {
        error: FetchError,
        config: GameConfig,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Config { .. } => "config",
            Phase::Loading { .. } => "loading",
            Phase::Playing { .. } => "playing",
            Phase::Results { .. } => "results",
            Phase::LoadingError { .. } => "loading-error",
        }
    }
}

#[derive(Debug)]
pub struct Game {
    phase: Phase,
    rules: Rules,
    rng: StdRng,
    next_id: u64,
}

impl Game {
    pub fn new(rules: Rules) -> Self {
        Self::with_rng(rules, StdRng::from_entropy())
    }

    /// Deterministic option shuffling
    pub fn seeded(rules: Rules, seed: u64) -> Self {
        Self::with_rng(rules, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rules: Rules, rng: StdRng) -> Self {
        Self {
            phase: Phase::Config { errors: None },
            rules,
            rng,
            next_id: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing { .. })
    }

    /// Loading or playing: quitting now would throw a game away.
    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. } | Phase::Playing { .. })
    }

    pub fn handle(&mut self, event: GameEvent, now: Instant) -> Vec<GameAction> {
        match event {
            GameEvent::Submit(raw) => self.on_submit(&raw),
            GameEvent::LoadProgress { session, progress } => self.on_progress(session, progress),
            GameEvent::QuestionsLoaded { session, result } => self.on_loaded(session, result, now),
            GameEvent::Answer(id) => self.on_answer(id, now),
            GameEvent::TimerTick { round } => self.on_tick(round),
            GameEvent::AdvanceDue { round } => self.on_advance(round, now),
            GameEvent::Acknowledge => match self.phase {
                Phase::LoadingError { .. } => self.back_to_config(),
                _ => vec![],
            },
            GameEvent::RestartSame => match &self.phase {
                Phase::Results { session, .. } => {
                    let config = session.config.clone();
                    self.start_loading(config)
                }
                _ => vec![],
            },
            GameEvent::RestartConfig => match self.phase {
                Phase::Results { .. } => self.back_to_config(),
                _ => vec![],
            },
            GameEvent::Abandon => match self.phase {
                Phase::Loading { session, .. } => {
                    info!(phase = self.phase.name(), "game abandoned");
                    let mut actions = vec![GameAction::CancelFetch { session }];
                    actions.extend(self.back_to_config());
                    actions
                }
                Phase::Playing { .. } => {
                    info!(phase = self.phase.name(), "game abandoned");
                    self.back_to_config()
                }
                _ => vec![],
            },
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn on_submit(&mut self, raw: &RawConfig) -> Vec<GameAction> {
        if !matches!(self.phase, Phase::Config { .. }) {
            return vec![];
        }

        match validate(raw) {
            Ok(config) => self.start_loading(config),
            Err(errors) => {
                debug!(%errors, "rejected game settings");
                self.phase = Phase::Config {
                    errors: Some(errors),
                };
                vec![GameAction::Render]
            }
        }
    }

    fn start_loading(&mut self, config: GameConfig) -> Vec<GameAction> {
        let session = SessionId(self.next_id());
        info!(
            session = session.0,
            player = %config.player_name,
            amount = config.amount,
            difficulty = %config.difficulty,
            category = ?config.category,
            translate = config.translate,
            "starting game"
        );

        self.phase = Phase::Loading {
            session,
            config: config.clone(),
            progress: LoadProgress::Fetching,
        };
        vec![
            GameAction::CancelScheduled,
            GameAction::Fetch { session, config },
            GameAction::Render,
        ]
    }

    fn back_to_config(&mut self) -> Vec<GameAction> {
        self.phase = Phase::Config { errors: None };
        vec![
            GameAction::StopTimer,
            GameAction::CancelScheduled,
            GameAction::Render,
        ]
    }

    fn on_progress(&mut self, id: SessionId, update: LoadProgress) -> Vec<GameAction> {
        match &mut self.phase {
            Phase::Loading {
                session, progress, ..
            } if *session == id => {
                *progress = update;
                vec![GameAction::Render]
            }
            _ => vec![],
        }
    }

    fn on_loaded(
        &mut self,
        id: SessionId,
        result: Result<LoadedQuestions, FetchError>,
        now: Instant,
    ) -> Vec<GameAction> {
        let config = match &self.phase {
            Phase::Loading { session, config, .. } if *session == id => config.clone(),
            _ => {
                debug!(session = id.0, "discarding result of a superseded load");
                return vec![];
            }
        };

        match result {
            Ok(loaded) => {
                let session = Session::new(config, loaded);
                if session.questions.is_empty() {
                    return self.finish(session);
                }
                let timer = QuestionTimer::new(self.rules.question_secs);
                self.enter_round(session, timer, now)
            }
            Err(error) => {
                warn!(session = id.0, %error, "could not load questions");
                self.phase = Phase::LoadingError { error, config };
                vec![GameAction::Render]
            }
        }
    }

    /// Show the current question, restarting `timer` with a full budget.
    fn enter_round(
        &mut self,
        session: Session,
        mut timer: QuestionTimer,
        now: Instant,
    ) -> Vec<GameAction> {
        let Some(question) = session.current_question() else {
            return self.finish(session);
        };

        let mut options = question.options();
        options.shuffle(&mut self.rng);
        timer.reset(self.rules.question_secs);

        let round = Round {
            id: RoundId(self.next_id()),
            options,
            timer,
            started_at: now,
            outcome: None,
        };
        let id = round.id;

        self.phase = Phase::Playing { session, round };
        vec![GameAction::StartTimer { round: id }, GameAction::Render]
    }

    fn on_answer(&mut self, selected: AnswerId, now: Instant) -> Vec<GameAction> {
        let reveal_delay = self.rules.reveal_delay;
        let Phase::Playing { session, round } = &mut self.phase else {
            return vec![];
        };
        if round.is_resolved() || !round.options.iter().any(|o| o.id == selected) {
            return vec![];
        }

        round.timer.pause();
        round.outcome = Some(RoundOutcome::Answered { selected });

        let elapsed = round_secs(now.saturating_duration_since(round.started_at));
        session.times.push(elapsed);
        if selected.is_correct() {
            session.score += POINTS_PER_CORRECT;
            session.correct_count += 1;
        } else {
            session.incorrect_count += 1;
        }
        debug!(
            question = session.current_index,
            correct = selected.is_correct(),
            elapsed,
            "answer recorded"
        );

        vec![
            GameAction::StopTimer,
            GameAction::ScheduleAdvance {
                round: round.id,
                delay: reveal_delay,
            },
            GameAction::Render,
        ]
    }

    fn on_tick(&mut self, id: RoundId) -> Vec<GameAction> {
        let reveal_delay = self.rules.reveal_delay;
        let Phase::Playing { session, round } = &mut self.phase else {
            return vec![];
        };
        if round.id != id || round.is_resolved() {
            return vec![];
        }

        match round.timer.tick() {
            Tick::Running(_) => vec![GameAction::Render],
            Tick::Idle => vec![],
            Tick::Expired => {
                round.outcome = Some(RoundOutcome::TimedOut);
                session.times.push(u64::from(round.timer.budget()));
                session.incorrect_count += 1;
                debug!(question = session.current_index, "question timed out");

                vec![
                    GameAction::StopTimer,
                    GameAction::ScheduleAdvance {
                        round: round.id,
                        delay: reveal_delay,
                    },
                    GameAction::Render,
                ]
            }
        }
    }

    fn on_advance(&mut self, id: RoundId, now: Instant) -> Vec<GameAction> {
        match &self.phase {
            Phase::Playing { round, .. } if round.id == id && round.is_resolved() => {}
            _ => return vec![],
        }

        let Phase::Playing { mut session, round } =
            std::mem::replace(&mut self.phase, Phase::Config { errors: None })
        else {
            return vec![];
        };

        if session.current_index + 1 < session.questions.len() {
            session.current_index += 1;
            self.enter_round(session, round.timer, now)
        } else {
            self.finish(session)
        }
    }

    fn finish(&mut self, session: Session) -> Vec<GameAction> {
        let summary = session.summary();
        info!(
            player = %summary.player_name,
            score = summary.score,
            correct = summary.correct,
            total = summary.total,
            percent = summary.percent,
            "game finished"
        );
        self.phase = Phase::Results { session, summary };
        vec![GameAction::StopTimer, GameAction::Render]
    }
}
