use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::error::FetchError;
use crate::form::GameConfig;
use crate::game::{GameEvent, LoadProgress, LoadedQuestions, SessionId};
use crate::runtime::QuizEvent;
use crate::translate::{BatchTranslator, Translate};
use crate::trivia::QuestionSource;

/// Shared flag telling a background load that nobody wants its result any more
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fetch the questions for a game and, if asked, translate them.
///
/// Questions are translated strictly one after another so progress only moves
/// forward; the texts of a single question are translated concurrently. Each
/// call starts with an empty translation cache. Once `cancel` is set no further
/// translation requests are made and the rest stay untranslated.
pub fn load_questions<S, T>(
    source: &S,
    translator: &T,
    config: &GameConfig,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(LoadProgress),
) -> Result<LoadedQuestions, FetchError>
where
    S: QuestionSource + ?Sized,
    T: Translate + ?Sized,
{
    on_progress(LoadProgress::Fetching);
    let questions = source.fetch(config)?;

    if !config.translate {
        return Ok(LoadedQuestions {
            questions,
            translate_failures: 0,
        });
    }

    let total = questions.len();
    let mut batch = BatchTranslator::new(translator);
    let mut translated = Vec::with_capacity(total);
    for (idx, question) in questions.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(translated = idx, total, "load cancelled, skipping remaining translations");
            translated.extend_from_slice(&questions[idx..]);
            break;
        }
        on_progress(LoadProgress::Translating {
            current: idx + 1,
            total,
        });
        translated.push(batch.translate_question(question));
    }

    info!(
        questions = total,
        cached = batch.cache().len(),
        failures = batch.failures(),
        "translation pass finished"
    );

    Ok(LoadedQuestions {
        questions: translated,
        translate_failures: batch.failures(),
    })
}

/// Run [`load_questions`] on a background thread, reporting back through `tx`.
///
/// A cancelled load sends nothing once it notices.
pub fn spawn_load(
    source: Arc<dyn QuestionSource>,
    translator: Arc<dyn Translate>,
    session: SessionId,
    config: GameConfig,
    cancel: CancelToken,
    tx: Sender<QuizEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let progress_tx = tx.clone();
        let progress_cancel = cancel.clone();
        let result = load_questions(
            source.as_ref(),
            translator.as_ref(),
            &config,
            &cancel,
            |progress| {
                if progress_cancel.is_cancelled() {
                    return;
                }
                let _ = progress_tx.send(QuizEvent::Game(GameEvent::LoadProgress {
                    session,
                    progress,
                }));
            },
        );

        if cancel.is_cancelled() {
            debug!(session = session.0, "load cancelled, dropping its result");
            return;
        }
        if tx
            .send(QuizEvent::Game(GameEvent::QuestionsLoaded { session, result }))
            .is_err()
        {
            debug!(session = session.0, "event loop gone, dropping loaded questions");
        }
    })
}

/// The one background load the game may still be waiting for
#[derive(Debug, Default)]
pub struct ActiveLoad {
    current: Option<(SessionId, CancelToken)>,
}

impl ActiveLoad {
    /// Start loading for `session`, cancelling whatever load came before.
    pub fn start(
        &mut self,
        source: Arc<dyn QuestionSource>,
        translator: Arc<dyn Translate>,
        session: SessionId,
        config: GameConfig,
        tx: Sender<QuizEvent>,
    ) -> thread::JoinHandle<()> {
        if let Some((old, token)) = self.current.take() {
            debug!(session = old.0, "superseding load");
            token.cancel();
        }
        let token = CancelToken::new();
        self.current = Some((session, token.clone()));
        spawn_load(source, translator, session, config, token, tx)
    }

    pub fn cancel(&mut self, session: SessionId) {
        match &self.current {
            Some((id, token)) if *id == session => {
                token.cancel();
                self.current = None;
            }
            _ => {}
        }
    }

    pub fn session(&self) -> Option<SessionId> {
        self.current.as_ref().map(|(id, _)| *id)
    }
}
