//! Typed rows and the side/outcome domain enums.
//!
//! Rows are decoded once at the store boundary; nothing downstream indexes
//! into raw tuples.

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Which side participant one played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// First mover.
    Sente,
    /// Second mover.
    Gote,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Sente => "sente",
            Side::Gote => "gote",
        }
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "sente" => Ok(Side::Sente),
            "gote" => Ok(Side::Gote),
            other => bail!("unknown side {other:?}"),
        }
    }
}

/// Match outcome, in the sente-first notation the ledger stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Sente won (`1-0`).
    #[serde(rename = "1-0")]
    SenteWin,
    /// Gote won (`0-1`).
    #[serde(rename = "0-1")]
    GoteWin,
    /// Draw (`0.5-0.5`).
    #[serde(rename = "0.5-0.5")]
    Draw,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::SenteWin => "1-0",
            Outcome::GoteWin => "0-1",
            Outcome::Draw => "0.5-0.5",
        }
    }

    /// Per-participant scores `(score_p1, score_p2)` given participant one's
    /// side. Side + outcome fully determine both scores.
    pub fn scores(self, p1_side: Side) -> (f64, f64) {
        match (self, p1_side) {
            (Outcome::Draw, _) => (0.5, 0.5),
            (Outcome::SenteWin, Side::Sente) | (Outcome::GoteWin, Side::Gote) => (1.0, 0.0),
            (Outcome::SenteWin, Side::Gote) | (Outcome::GoteWin, Side::Sente) => (0.0, 1.0),
        }
    }
}

impl FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "1-0" => Ok(Outcome::SenteWin),
            "0-1" => Ok(Outcome::GoteWin),
            "0.5-0.5" => Ok(Outcome::Draw),
            other => bail!("unknown outcome {other:?}"),
        }
    }
}

/// One registered competitor within a community.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: Uuid,
    pub community_id: i64,
    /// Opaque ref to the interaction transport's user concept.
    pub external_id: i64,
    pub name: String,
    pub elo: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub games_played: i32,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Overwrite the rating/record portion of this row.
    pub fn apply_line(&mut self, line: &StatLine) {
        self.elo = line.elo;
        self.wins = line.wins;
        self.losses = line.losses;
        self.draws = line.draws;
        self.games_played = line.games_played;
    }

    /// Rating and record as a [`StatLine`].
    pub fn stat_line(&self) -> StatLine {
        StatLine {
            elo: self.elo,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            games_played: self.games_played,
        }
    }
}

/// One recorded result between two participants.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub community_id: i64,
    pub p1_id: Uuid,
    pub p2_id: Uuid,
    pub p1_side: Side,
    pub outcome: Outcome,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn involves(&self, participant: Uuid) -> bool {
        self.p1_id == participant || self.p2_id == participant
    }
}

/// Fields of a match not assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub community_id: i64,
    pub p1_id: Uuid,
    pub p2_id: Uuid,
    pub p1_side: Side,
    pub outcome: Outcome,
    pub note: Option<String>,
}

/// Mutable rating/record portion of a participant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatLine {
    pub elo: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
    pub games_played: i32,
}

impl StatLine {
    /// Zeroed record at the given rating (replay baseline, fresh signup).
    pub fn fresh(elo: i32) -> Self {
        StatLine {
            elo,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
        }
    }

    /// Record one finished match: new rating plus the one counter the score
    /// selects, and the games-played total.
    pub fn record(mut self, score: f64, new_elo: i32) -> Self {
        self.elo = new_elo;
        if score == 1.0 {
            self.wins += 1;
        } else if score == 0.0 {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
        self.games_played += 1;
        self
    }

    /// `wins + losses + draws == games_played` must hold at all times.
    pub fn consistent(&self) -> bool {
        self.wins + self.losses + self.draws == self.games_played
    }
}
