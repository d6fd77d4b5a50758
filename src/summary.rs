use chrono::{DateTime, Local};

use crate::util::percent;

/// Final figures for a finished game
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub player_name: String,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
    pub total_time_secs: u64,
    pub average_time_secs: f64,
    pub translate_failures: u32,
    pub finished_at: DateTime<Local>,
}

impl Summary {
    /// `times` holds the seconds spent on each question; `total` is the question count.
    pub fn compute(
        player_name: &str,
        score: u32,
        correct: usize,
        total: usize,
        times: &[u64],
        translate_failures: u32,
    ) -> Self {
        let total_time_secs: u64 = times.iter().sum();
        let average_time_secs = if total == 0 {
            0.0
        } else {
            total_time_secs as f64 / total as f64
        };

        Self {
            player_name: player_name.to_string(),
            score,
            correct,
            total,
            percent: percent(correct, total),
            total_time_secs,
            average_time_secs,
            translate_failures,
            finished_at: Local::now(),
        }
    }
}
