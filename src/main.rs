use std::{
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};

use trivium::{
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, Settings},
    form::{ConfigForm, Difficulty},
    game::{Game, GameAction, Rules},
    loader::ActiveLoad,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, Runner, Scheduler},
    translate::{MyMemoryClient, Translate},
    trivia::{OpenTdbClient, QuestionSource},
    ui,
};

const TICK_RATE_MS: u64 = 100;

/// trivia quiz in your terminal, optionally translated
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// player name to prefill
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// number of questions to prefill (5-20)
    #[clap(short = 'q', long)]
    questions: Option<u32>,

    /// difficulty to prefill
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// Open Trivia DB category id to prefill
    #[clap(short = 'c', long)]
    category: Option<u32>,

    /// prefill the translate toggle
    #[clap(short = 't', long)]
    translate: bool,

    /// language code questions are translated into
    #[clap(long)]
    target_lang: Option<String>,

    /// seconds allowed per question
    #[clap(long)]
    question_secs: Option<u32>,

    /// how long the answer stays on screen before the next question
    #[clap(long)]
    reveal_delay_ms: Option<u64>,

    /// settings file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the merged settings back to the settings file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(lang) = &self.target_lang {
            settings.target_lang = lang.clone();
        }
        if let Some(secs) = self.question_secs {
            settings.question_secs = secs;
        }
        if let Some(ms) = self.reveal_delay_ms {
            settings.reveal_delay_ms = ms;
        }
    }

    fn initial_form(&self) -> ConfigForm {
        let mut form = ConfigForm::default();
        if let Some(name) = &self.name {
            form.name = name.clone();
        }
        if let Some(n) = self.questions {
            form.count = n.to_string();
        }
        if let Some(difficulty) = self.difficulty {
            form.difficulty = difficulty;
        }
        form.category = self.category;
        form.translate = self.translate;
        form
    }

    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

/// Provider clients shared with loader threads
struct Clients {
    source: Arc<dyn QuestionSource>,
    translator: Arc<dyn Translate>,
}

impl Clients {
    fn new(settings: &Settings) -> Result<Self> {
        let source = OpenTdbClient::new(settings).context("failed to build trivia client")?;
        let translator =
            MyMemoryClient::new(settings).context("failed to build translation client")?;
        Ok(Self {
            source: Arc::new(source),
            translator: Arc::new(translator),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_dir = AppDirs::log_dir();
    let _log_guard = match logging::init(&log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {e:#}");
            None
        }
    };

    let store = cli.store();
    let mut settings = store.load();
    cli.apply_overrides(&mut settings);
    if cli.save_config {
        store
            .save(&settings)
            .with_context(|| format!("failed to save settings to {}", store.path().display()))?;
        info!(path = %store.path().display(), "settings saved");
    }

    let clients = Clients::new(&settings)?;
    let mut app = App::new(Game::new(Rules::from(&settings)), cli.initial_form());
    info!(
        target_lang = %settings.target_lang,
        question_secs = settings.question_secs,
        log = %logging::log_path(&log_dir).display(),
        "trivium starting"
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &clients);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "event loop failed");
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, clients: &Clients) -> Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut scheduler = Scheduler::new(Duration::from_secs(1));
    let mut loads = ActiveLoad::default();

    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        let event = runner.step();
        let now = Instant::now();

        let actions = match event {
            QuizEvent::Key(key) => app.on_key(key, now),
            QuizEvent::Resize => vec![GameAction::Render],
            QuizEvent::Tick => vec![],
            QuizEvent::Game(ev) => app.dispatch(ev, now),
        };
        let tx = runner.sender();
        let mut redraw = perform(actions, &mut scheduler, &mut loads, clients, &tx, now);

        for due in scheduler.due(now) {
            let actions = app.dispatch(due, now);
            redraw |= perform(actions, &mut scheduler, &mut loads, clients, &tx, now);
        }

        if redraw && !app.should_quit {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}

/// Carry out game actions. Returns true if the screen needs redrawing.
fn perform(
    actions: Vec<GameAction>,
    scheduler: &mut Scheduler,
    loads: &mut ActiveLoad,
    clients: &Clients,
    tx: &Sender<QuizEvent>,
    now: Instant,
) -> bool {
    let mut redraw = false;
    for action in actions {
        if scheduler.apply(&action, now) {
            continue;
        }
        match action {
            GameAction::Fetch { session, config } => {
                loads.start(
                    Arc::clone(&clients.source),
                    Arc::clone(&clients.translator),
                    session,
                    config,
                    tx.clone(),
                );
            }
            GameAction::CancelFetch { session } => loads.cancel(session),
            GameAction::Render => redraw = true,
            _ => {}
        }
    }
    redraw
}
