//! Runtime configuration for the ladder server.

use once_cell::sync::Lazy;
use std::env;

/// Baseline rating every replay resets to. A replay deliberately erases
/// tiered signup ratings and admin overrides.
pub const STARTING_ELO: i32 = 1000;

#[derive(Debug)]
pub struct Settings {
    /// Elo K-factor.
    pub k_factor: f64,
    /// Starting rating for the Beginner signup tier.
    pub beginner_elo: i32,
    /// Maximum note length attached to a match (chars).
    pub note_max_chars: usize,
    /// Default page cap for history listings.
    pub history_limit: i64,
    /// Per-step timeout for single-choice prompts (seconds).
    pub choice_timeout: u64,
    /// Timeout for the dual-confirmation step (seconds).
    pub confirm_timeout: u64,
    /// Timeout for free-text note entry (seconds).
    pub note_timeout: u64,
    /// Shared deadline budget for the whole signup flow (seconds).
    pub signup_budget: u64,
    /// How many top-ranked participants get a label refresh after a change.
    pub label_top_window: usize,
    /// Period of the background label refresh task (hours).
    pub label_refresh_hours: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Settings {
    fn from_env() -> Self {
        Settings {
            k_factor: env_parse("K_FACTOR", 32.0),
            beginner_elo: env_parse("BEGINNER_ELO", 500),
            note_max_chars: env_parse("NOTE_MAX_CHARS", 70),
            history_limit: env_parse("HISTORY_LIMIT", 25),
            choice_timeout: env_parse("CHOICE_TIMEOUT", 60),
            confirm_timeout: env_parse("CONFIRM_TIMEOUT", 120),
            note_timeout: env_parse("NOTE_TIMEOUT", 180),
            signup_budget: env_parse("SIGNUP_BUDGET", 180),
            label_top_window: env_parse("LABEL_TOP_WINDOW", 15),
            label_refresh_hours: env_parse("LABEL_REFRESH_HOURS", 24),
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
