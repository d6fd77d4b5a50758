use crate::error::{Field, ValidationError};
use serde::{Deserialize, Serialize};

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 20;
pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 20;
pub const DEFAULT_QUESTIONS: u32 = 5;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Any,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Any,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
    ];

    /// Value for the `difficulty` query parameter; `None` means no filter.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Difficulty::Any => None,
            Difficulty::Easy => Some("easy"),
            Difficulty::Medium => Some("medium"),
            Difficulty::Hard => Some("hard"),
        }
    }

    fn step(&self, forward: bool) -> Difficulty {
        let idx = Self::ALL.iter().position(|d| d == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ALL[next]
    }
}

/// Open Trivia DB categories offered by the form
pub const CATEGORIES: &[(u32, &str)] = &[
    (9, "General Knowledge"),
    (10, "Entertainment: Books"),
    (11, "Entertainment: Film"),
    (12, "Entertainment: Music"),
    (13, "Entertainment: Musicals & Theatres"),
    (14, "Entertainment: Television"),
    (15, "Entertainment: Video Games"),
    (16, "Entertainment: Board Games"),
    (17, "Science & Nature"),
    (18, "Science: Computers"),
    (19, "Science: Mathematics"),
    (20, "Mythology"),
    (21, "Sports"),
    (22, "Geography"),
    (23, "History"),
    (24, "Politics"),
    (25, "Art"),
    (26, "Celebrities"),
    (27, "Animals"),
    (28, "Vehicles"),
    (29, "Entertainment: Comics"),
    (30, "Science: Gadgets"),
    (31, "Entertainment: Japanese Anime & Manga"),
    (32, "Entertainment: Cartoon & Animations"),
];

pub fn category_name(id: u32) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(cid, _)| *cid == id)
        .map(|(_, name)| *name)
}

/// Validated settings for one game. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub player_name: String,
    pub amount: u32,
    pub difficulty: Difficulty,
    pub category: Option<u32>,
    pub translate: bool,
}

/// Form fields exactly as the player entered them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawConfig {
    pub name: String,
    pub count: String,
    pub difficulty: Difficulty,
    pub category: Option<u32>,
    pub translate: bool,
}

/// Check the raw form. Name and count are judged independently so both can be reported.
pub fn validate(raw: &RawConfig) -> Result<GameConfig, ValidationError> {
    let name = raw.name.trim();
    let name_len = name.chars().count();
    let amount = parse_count(&raw.count);

    let mut fields = Vec::new();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
        fields.push(Field::Name);
    }
    let amount = match amount {
        Some(n) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&n) => n,
        _ => {
            fields.push(Field::Count);
            0
        }
    };

    if !fields.is_empty() {
        return Err(ValidationError { fields });
    }

    Ok(GameConfig {
        player_name: name.to_string(),
        amount,
        difficulty: raw.difficulty,
        category: raw.category,
        translate: raw.translate,
    })
}

// Accepts "7" and "7.0" but not "7.5", "", or "seven".
fn parse_count(input: &str) -> Option<u32> {
    let input = input.trim();
    if let Ok(n) = input.parse::<u32>() {
        return Some(n);
    }
    match input.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Count,
    Difficulty,
    Category,
    Translate,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Count,
        FormField::Difficulty,
        FormField::Category,
        FormField::Translate,
    ];

    fn offset(self, delta: isize) -> FormField {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Editable state of the configuration screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigForm {
    pub name: String,
    pub count: String,
    pub difficulty: Difficulty,
    pub category: Option<u32>,
    pub translate: bool,
    pub focus: FormField,
}

impl Default for ConfigForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            count: DEFAULT_QUESTIONS.to_string(),
            difficulty: Difficulty::Any,
            category: None,
            translate: false,
            focus: FormField::Name,
        }
    }
}

impl From<&GameConfig> for ConfigForm {
    fn from(cfg: &GameConfig) -> Self {
        Self {
            name: cfg.player_name.clone(),
            count: cfg.amount.to_string(),
            difficulty: cfg.difficulty,
            category: cfg.category,
            translate: cfg.translate,
            focus: FormField::Name,
        }
    }
}

impl ConfigForm {
    pub fn raw(&self) -> RawConfig {
        RawConfig {
            name: self.name.clone(),
            count: self.count.clone(),
            difficulty: self.difficulty,
            category: self.category,
            translate: self.translate,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.offset(1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.offset(-1);
    }

    pub fn input(&mut self, c: char) {
        match self.focus {
            FormField::Name => {
                if self.name.chars().count() < MAX_NAME_LEN + 10 {
                    self.name.push(c);
                }
            }
            FormField::Count => {
                if c.is_ascii_digit() && self.count.len() < 3 {
                    self.count.push(c);
                }
            }
            FormField::Translate if c == ' ' => self.translate = !self.translate,
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Count => {
                self.count.pop();
            }
            _ => {}
        }
    }

    /// Cycle the focused choice field (difficulty, category, translate).
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            FormField::Difficulty => self.difficulty = self.difficulty.step(forward),
            FormField::Category => self.category = step_category(self.category, forward),
            FormField::Translate => self.translate = !self.translate,
            FormField::Count => {
                let current = parse_count(&self.count).unwrap_or(DEFAULT_QUESTIONS);
                let next = if forward {
                    current.saturating_add(1).min(MAX_QUESTIONS)
                } else {
                    current.saturating_sub(1).max(MIN_QUESTIONS)
                };
                self.count = next.to_string();
            }
            FormField::Name => {}
        }
    }
}

// `None` ("any category") sits before the first and after the last entry.
fn step_category(current: Option<u32>, forward: bool) -> Option<u32> {
    let idx = current.and_then(|id| CATEGORIES.iter().position(|(cid, _)| *cid == id));
    let next = match (idx, forward) {
        (None, true) => Some(0),
        (None, false) => Some(CATEGORIES.len() - 1),
        (Some(i), true) if i + 1 < CATEGORIES.len() => Some(i + 1),
        (Some(i), false) if i > 0 => Some(i - 1),
        _ => None,
    };
    next.map(|i| CATEGORIES[i].0)
}
