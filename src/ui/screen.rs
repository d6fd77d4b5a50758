use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::App;
use crate::error::{Field, ValidationError};
use crate::form::{category_name, ConfigForm, FormField, MAX_QUESTIONS, MIN_QUESTIONS};
use crate::game::{LoadProgress, Phase, Round, RoundOutcome, Session, POINTS_PER_CORRECT};
use crate::question::AnswerId;
use crate::summary::Summary;
use crate::ui::{block_indent, Palette};

/// A UI Screen boundary: draws one game phase
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Settings form shown before every game
pub struct ConfigScreen;

impl Screen for ConfigScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Phase::Config { errors } = app.game.phase() else {
            return;
        };
        let palette = Palette::new();
        let form = &app.form;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // title
                Constraint::Length(6), // fields
                Constraint::Min(0),    // errors
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("trivium", palette.title))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let rows = form_rows(form);
        let texts: Vec<String> = rows.iter().map(|(_, text)| text.clone()).collect();
        let indent = block_indent(&texts, chunks[1].width);
        let lines: Vec<Line> = rows
            .into_iter()
            .map(|(field, text)| {
                let style = if field == form.focus {
                    palette.focus
                } else {
                    palette.bold
                };
                Line::from(vec![
                    Span::raw(" ".repeat(indent as usize)),
                    Span::styled(text, style),
                ])
            })
            .collect();
        Paragraph::new(lines).render(chunks[1], buf);

        if let Some(errors) = errors {
            Paragraph::new(error_lines(errors, &palette))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[2], buf);
        }

        legend(
            "(tab) next field / (←→) change / (space) toggle / (enter) start / (esc)ape",
            &palette,
        )
        .render(chunks[3], buf);
    }
}

fn form_rows(form: &ConfigForm) -> Vec<(FormField, String)> {
    let category = form
        .category
        .and_then(category_name)
        .unwrap_or("Any category");
    vec![
        (FormField::Name, format!("Name:        {}_", form.name)),
        (
            FormField::Count,
            format!("Questions:   {} ({MIN_QUESTIONS}-{MAX_QUESTIONS})", form.count),
        ),
        (FormField::Difficulty, format!("Difficulty:  < {} >", form.difficulty)),
        (FormField::Category, format!("Category:    < {category} >")),
        (
            FormField::Translate,
            format!(
                "Translate:   [{}]",
                if form.translate { "x" } else { " " }
            ),
        ),
    ]
}

fn error_lines<'a>(errors: &ValidationError, palette: &Palette) -> Vec<Line<'a>> {
    [Field::Name, Field::Count]
        .into_iter()
        .filter(|f| errors.has(*f))
        .map(|f| Line::from(Span::styled(f.message(), palette.bad)))
        .collect()
}

/// Waiting for questions (and translations) to arrive
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Phase::Loading {
            config, progress, ..
        } = app.game.phase()
        else {
            return;
        };
        let palette = Palette::new();

        let status = match progress {
            LoadProgress::Fetching => "Loading questions from Open Trivia DB…".to_string(),
            LoadProgress::Translating { current, total } => {
                format!("Translating question {current} of {total}…")
            }
        };

        let chunks = centred_rows(area, 3);
        Paragraph::new(vec![
            Line::from(Span::styled(format!("Get ready, {}!", config.player_name), palette.title)),
            Line::default(),
            Line::from(Span::styled(status, palette.bold)),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

        legend("(esc) cancel", &palette).render(chunks[3], buf);
    }
}

/// One question with its countdown and answer options
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Phase::Playing { session, round } = app.game.phase() else {
            return;
        };
        let Some(question) = session.current_question() else {
            return;
        };
        let palette = Palette::new();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // progress
                Constraint::Length(1), // score
                Constraint::Length(2), // timer
                Constraint::Length(4), // prompt
                Constraint::Min(0),    // options
                Constraint::Length(2), // feedback
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!(
                "{} | Question {} of {}",
                session.config.player_name,
                session.current_index + 1,
                session.questions.len()
            ),
            palette.dim,
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(score_line(session), palette.bold))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let timer_style = if round.timer.is_paused() || round.timer.is_stopped() {
            palette.dim
        } else if round.timer.is_running_out() {
            palette.bad
        } else {
            palette.bold
        };
        Paragraph::new(Span::styled(
            format!("{}s", round.timer.remaining()),
            timer_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new(Span::styled(question.prompt.as_str(), palette.bold))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);

        let texts: Vec<String> = round
            .options
            .iter()
            .enumerate()
            .map(|(idx, option)| format!("{}. {}", idx + 1, option.text))
            .collect();
        let indent = block_indent(&texts, chunks[4].width);
        let lines: Vec<Line> = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                let style = option_style(round, idx, app.cursor, &palette);
                Line::from(vec![
                    Span::raw(" ".repeat(indent as usize)),
                    Span::styled(text, style),
                ])
            })
            .collect();
        Paragraph::new(lines).render(chunks[4], buf);

        if let Some(outcome) = round.outcome {
            let correct_text = question.correct_answer.as_str();
            let (text, style) = match outcome {
                RoundOutcome::Answered { selected } if selected.is_correct() => {
                    (format!("Correct! +{POINTS_PER_CORRECT}"), palette.good)
                }
                RoundOutcome::Answered { selected } => {
                    let picked = question.answer_text(selected).unwrap_or_default();
                    (
                        format!("Wrong! You picked {picked}. The answer was {correct_text}"),
                        palette.bad,
                    )
                }
                RoundOutcome::TimedOut => {
                    (format!("Time's up! The answer was {correct_text}"), palette.warn)
                }
            };
            Paragraph::new(Span::styled(text, style))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[5], buf);
        }

        legend("(1-9) answer / (↑↓ enter) select / (esc) leave", &palette).render(chunks[6], buf);
    }
}

fn score_line(session: &Session) -> String {
    format!(
        "Score: {} | Correct: {} | Incorrect: {}",
        session.score, session.correct_count, session.incorrect_count
    )
}

fn option_style(round: &Round, idx: usize, cursor: usize, palette: &Palette) -> Style {
    let Some(option) = round.options.get(idx) else {
        return palette.bold;
    };
    match round.outcome {
        None if idx == cursor => palette.focus,
        None => palette.bold,
        Some(_) if option.id == AnswerId::Correct => palette.good,
        Some(RoundOutcome::Answered { selected }) if selected == option.id => palette.bad,
        Some(_) => palette.dim,
    }
}

/// Final score once every question is resolved
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Phase::Results { summary, .. } = app.game.phase() else {
            return;
        };
        let palette = Palette::new();

        let lines = summary_lines(summary, &palette);
        let chunks = centred_rows(area, lines.len() as u16);
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        legend("(r)estart / (n)ew game / (esc)ape", &palette).render(chunks[3], buf);
    }
}

fn summary_lines<'a>(summary: &Summary, palette: &Palette) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("Well played, {}!", summary.player_name),
            palette.title,
        )),
        Line::default(),
        Line::from(Span::styled(format!("Score: {}", summary.score), palette.bold)),
        Line::from(format!(
            "Correct: {} of {} ({}%)",
            summary.correct, summary.total, summary.percent
        )),
        Line::from(format!("Total time: {}s", summary.total_time_secs)),
        Line::from(format!(
            "Average per question: {:.2}s",
            summary.average_time_secs
        )),
    ];
    if summary.translate_failures > 0 {
        lines.push(Line::from(Span::styled(
            format!(
                "{} question(s) could not be translated and are shown in English",
                summary.translate_failures
            ),
            palette.warn,
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Finished at {}", summary.finished_at.format("%H:%M:%S")),
        palette.dim,
    )));
    lines
}

/// Questions could not be fetched
pub struct ErrorScreen;

impl Screen for ErrorScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let Phase::LoadingError { error, .. } = app.game.phase() else {
            return;
        };
        let palette = Palette::new();

        let chunks = centred_rows(area, 4);
        Paragraph::new(vec![
            Line::from(Span::styled("Could not load questions", palette.bad)),
            Line::default(),
            Line::from(error.to_string()),
            Line::from(Span::styled("Check your connection or pick other settings.", palette.dim)),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

        legend("(enter) back to settings", &palette).render(chunks[3], buf);
    }
}

/// Top padding, a body of `body` rows, bottom padding, legend
fn centred_rows(area: Rect, body: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(body),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area)
}

fn legend<'a>(text: &'a str, palette: &Palette) -> Paragraph<'a> {
    Paragraph::new(Span::styled(text, palette.italic))
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: &Phase) -> Box<dyn Screen> {
    match phase {
        Phase::Config { .. } => Box::new(ConfigScreen),
        Phase::Loading { .. } => Box::new(LoadingScreen),
        Phase::Playing { .. } => Box::new(PlayScreen),
        Phase::Results { .. } => Box::new(ResultsScreen),
        Phase::LoadingError { .. } => Box::new(ErrorScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, ResponseCode};
    use crate::game::{Game, GameAction, GameEvent, LoadedQuestions, Rules, SessionId};
    use crate::question::{Question, QuestionKind};
    use crate::ui::rendered_text;
    use std::time::{Duration, Instant};

    fn render(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        rendered_text(&buffer)
    }

    fn app() -> App {
        App::new(Game::seeded(Rules::default(), 11), ConfigForm::default())
    }

    fn submit(app: &mut App, now: Instant) -> SessionId {
        app.form.name = "Ana".to_string();
        let raw = app.form.raw();
        app.dispatch(GameEvent::Submit(raw), now)
            .into_iter()
            .find_map(|a| match a {
                GameAction::Fetch { session, .. } => Some(session),
                _ => None,
            })
            .unwrap()
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                prompt: format!("Capital number {i}?"),
                correct_answer: "Paris".to_string(),
                incorrect_answers: vec!["Rome".to_string(), "Oslo".to_string(), "Lima".to_string()],
                kind: QuestionKind::Multiple,
                difficulty: "easy".to_string(),
            })
            .collect()
    }

    fn playing(now: Instant) -> App {
        let mut app = app();
        let session = submit(&mut app, now);
        app.dispatch(
            GameEvent::QuestionsLoaded {
                session,
                result: Ok(LoadedQuestions {
                    questions: questions(5),
                    translate_failures: 0,
                }),
            },
            now,
        );
        app
    }

    fn current_round(app: &App) -> &Round {
        match app.game.phase() {
            Phase::Playing { round, .. } => round,
            other => panic!("not playing: {}", other.name()),
        }
    }

    #[test]
    fn config_screen_shows_form_and_errors() {
        let mut app = app();
        let text = render(&app);
        assert!(text.contains("Questions:   5 (5-20)"));
        assert!(text.contains("Any category"));

        app.form.name = "A".to_string();
        app.form.count = "50".to_string();
        let raw = app.form.raw();
        app.dispatch(GameEvent::Submit(raw), Instant::now());

        let text = render(&app);
        assert!(text.contains(Field::Name.message()));
        assert!(text.contains(Field::Count.message()));
    }

    #[test]
    fn loading_screen_reports_translation_progress() {
        let now = Instant::now();
        let mut app = app();
        let session = submit(&mut app, now);
        assert!(render(&app).contains("Loading questions from Open Trivia DB"));

        app.dispatch(
            GameEvent::LoadProgress {
                session,
                progress: LoadProgress::Translating { current: 3, total: 5 },
            },
            now,
        );
        assert!(render(&app).contains("Translating question 3 of 5"));
    }

    #[test]
    fn play_screen_shows_question_score_and_options() {
        let app = playing(Instant::now());
        let text = render(&app);

        assert!(text.contains("Ana | Question 1 of 5"));
        assert!(text.contains("Score: 0 | Correct: 0 | Incorrect: 0"));
        assert!(text.contains("Capital number 0?"));
        assert!(text.contains("20s"));
        for answer in ["Paris", "Rome", "Oslo", "Lima"] {
            assert!(text.contains(answer), "missing option {answer}");
        }
        assert!(text.contains("1. "));
        assert!(text.contains("4. "));
    }

    #[test]
    fn wrong_answer_reveals_the_correct_one() {
        let now = Instant::now();
        let mut app = playing(now);
        let wrong = current_round(&app)
            .options
            .iter()
            .find(|o| !o.id.is_correct())
            .map(|o| o.id)
            .unwrap();

        app.dispatch(GameEvent::Answer(wrong), now + Duration::from_secs(2));
        let picked = current_round(&app)
            .options
            .iter()
            .find(|o| o.id == wrong)
            .map(|o| o.text.clone())
            .unwrap();
        let text = render(&app);
        assert!(text.contains(&format!("Wrong! You picked {picked}. The answer was Paris")));
        assert!(current_round(&app).timer.is_paused());
        assert!(text.contains("Score: 0 | Correct: 0 | Incorrect: 1"));
    }

    #[test]
    fn correct_answer_adds_points() {
        let now = Instant::now();
        let mut app = playing(now);
        app.dispatch(GameEvent::Answer(AnswerId::Correct), now);
        let text = render(&app);
        assert!(text.contains("Correct! +10"));
        assert!(text.contains("Score: 10 | Correct: 1 | Incorrect: 0"));
    }

    #[test]
    fn timer_counts_down_on_screen() {
        let now = Instant::now();
        let mut app = playing(now);
        let round = current_round(&app).id;
        for _ in 0..16 {
            app.dispatch(GameEvent::TimerTick { round }, now);
        }
        assert!(render(&app).contains("4s"));
        assert!(current_round(&app).timer.is_running_out());

        for _ in 0..4 {
            app.dispatch(GameEvent::TimerTick { round }, now);
        }
        assert!(render(&app).contains("Time's up! The answer was Paris"));
    }

    #[test]
    fn results_screen_summarises_the_game() {
        let now = Instant::now();
        let mut app = playing(now);
        for i in 0..5u64 {
            let round = current_round(&app).id;
            let answer = if i < 3 {
                AnswerId::Correct
            } else {
                AnswerId::Incorrect(0)
            };
            let at = now + Duration::from_secs(10 * i);
            app.dispatch(GameEvent::Answer(answer), at + Duration::from_secs(4));
            app.dispatch(GameEvent::AdvanceDue { round }, at + Duration::from_secs(10));
        }

        let text = render(&app);
        assert!(text.contains("Well played, Ana!"));
        assert!(text.contains("Score: 30"));
        assert!(text.contains("Correct: 3 of 5 (60%)"));
        assert!(text.contains("Average per question: 4.00s"));
        assert!(text.contains("(r)estart"));
    }

    #[test]
    fn results_screen_counts_untranslated_questions() {
        let now = Instant::now();
        let mut app = app();
        let session = submit(&mut app, now);
        app.dispatch(
            GameEvent::QuestionsLoaded {
                session,
                result: Ok(LoadedQuestions {
                    questions: questions(1),
                    translate_failures: 1,
                }),
            },
            now,
        );
        let round = current_round(&app).id;
        app.dispatch(GameEvent::Answer(AnswerId::Correct), now);
        app.dispatch(GameEvent::AdvanceDue { round }, now);

        let text = render(&app);
        assert!(text.contains("1 question(s) could not be translated and are shown in English"));
    }

    #[test]
    fn error_screen_describes_the_failure() {
        let now = Instant::now();
        let mut app = app();
        let session = submit(&mut app, now);
        app.dispatch(
            GameEvent::QuestionsLoaded {
                session,
                result: Err(FetchError::Provider(ResponseCode(1))),
            },
            now,
        );

        let text = render(&app);
        assert!(text.contains("Could not load questions"));
        assert!(text.contains("(enter) back to settings"));
    }
}
