use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TRIVIA_URL: &str = "https://opentdb.com/api.php";
pub const DEFAULT_TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";

/// Application settings: provider endpoints, languages, and game pacing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub trivia_url: String,
    pub translate_url: String,
    pub source_lang: String,
    pub target_lang: String,
    pub question_secs: u32,
    pub reveal_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trivia_url: DEFAULT_TRIVIA_URL.to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            question_secs: 20,
            reveal_delay_ms: 1500,
            request_timeout_secs: 10,
            user_agent: concat!("trivium/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `langpair` value for the translation provider, e.g. `en|es`
    pub fn lang_pair(&self) -> String {
        format!("{}|{}", self.source_lang, self.target_lang)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: crate::app_dirs::AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings file");
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        }
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}
