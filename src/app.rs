use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::form::ConfigForm;
use crate::game::{Game, GameAction, GameEvent, Phase, RoundId};

/// Question asked before throwing away a game in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    LeaveGame,
    Quit,
}

impl Confirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirm::LeaveGame => "Leave the current game? (y/n)",
            Confirm::Quit => "A game is in progress. Quit trivium? (y/n)",
        }
    }
}

/// Presentation state around the [`Game`]: the form being edited, the
/// highlighted option, and any pending confirmation.
#[derive(Debug)]
pub struct App {
    pub game: Game,
    pub form: ConfigForm,
    pub confirm: Option<Confirm>,
    pub cursor: usize,
    pub should_quit: bool,
    shown_round: Option<RoundId>,
}

impl App {
    pub fn new(game: Game, form: ConfigForm) -> Self {
        Self {
            game,
            form,
            confirm: None,
            cursor: 0,
            should_quit: false,
            shown_round: None,
        }
    }

    /// Feed an event to the game and keep the presentation state in step with it.
    pub fn dispatch(&mut self, event: GameEvent, now: Instant) -> Vec<GameAction> {
        let was_config = matches!(self.game.phase(), Phase::Config { .. });
        let actions = self.game.handle(event, now);

        match self.game.phase() {
            Phase::Config { .. } if !was_config => {
                self.form = ConfigForm::default();
                self.confirm = None;
            }
            Phase::Playing { round, .. } if self.shown_round != Some(round.id) => {
                self.shown_round = Some(round.id);
                self.cursor = 0;
            }
            Phase::Playing { .. } | Phase::Loading { .. } => {}
            _ => {
                self.shown_round = None;
                self.confirm = None;
            }
        }

        actions
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Vec<GameAction> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if self.game.is_in_progress() {
                self.confirm = Some(Confirm::Quit);
            } else {
                self.should_quit = true;
            }
            return vec![GameAction::Render];
        }

        if let Some(confirm) = self.confirm {
            return self.on_confirm_key(confirm, key, now);
        }

        match self.game.phase() {
            Phase::Config { .. } => self.on_config_key(key, now),
            Phase::Loading { .. } => match key.code {
                KeyCode::Esc => self.dispatch(GameEvent::Abandon, now),
                _ => vec![],
            },
            Phase::Playing { .. } => self.on_play_key(key, now),
            Phase::Results { .. } => match key.code {
                KeyCode::Char('r') => self.dispatch(GameEvent::RestartSame, now),
                KeyCode::Char('n') => self.dispatch(GameEvent::RestartConfig, now),
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.should_quit = true;
                    vec![]
                }
                _ => vec![],
            },
            Phase::LoadingError { .. } => match key.code {
                KeyCode::Enter | KeyCode::Esc => self.dispatch(GameEvent::Acknowledge, now),
                _ => vec![],
            },
        }
    }

    fn on_confirm_key(&mut self, confirm: Confirm, key: KeyEvent, now: Instant) -> Vec<GameAction> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.confirm = None;
                match confirm {
                    Confirm::LeaveGame => self.dispatch(GameEvent::Abandon, now),
                    Confirm::Quit => {
                        self.should_quit = true;
                        vec![]
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
                vec![GameAction::Render]
            }
            _ => vec![],
        }
    }

    fn on_config_key(&mut self, key: KeyEvent, now: Instant) -> Vec<GameAction> {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return vec![];
            }
            KeyCode::Enter => {
                let raw = self.form.raw();
                return self.dispatch(GameEvent::Submit(raw), now);
            }
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Left => self.form.cycle(false),
            KeyCode::Right => self.form.cycle(true),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) => self.form.input(c),
            _ => return vec![],
        }
        vec![GameAction::Render]
    }

    fn on_play_key(&mut self, key: KeyEvent, now: Instant) -> Vec<GameAction> {
        let Phase::Playing { round, .. } = self.game.phase() else {
            return vec![];
        };
        let option_count = round.options.len();
        let pick = |idx: usize| round.options.get(idx).map(|o| o.id);

        let selected = match key.code {
            KeyCode::Esc => {
                self.confirm = Some(Confirm::LeaveGame);
                return vec![GameAction::Render];
            }
            KeyCode::Up => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(option_count.saturating_sub(1));
                return vec![GameAction::Render];
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1) % option_count.max(1);
                return vec![GameAction::Render];
            }
            KeyCode::Enter | KeyCode::Char(' ') => pick(self.cursor),
            KeyCode::Char(c) => c
                .to_digit(10)
                .and_then(|d| (d as usize).checked_sub(1))
                .and_then(pick),
            _ => None,
        };

        match selected {
            Some(id) => self.dispatch(GameEvent::Answer(id), now),
            None => vec![],
        }
    }
}
