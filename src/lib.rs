//! Community shogi ladder: an append-only match ledger with Elo standings
//! derived by incremental update or full chronological replay.

pub mod config;
pub mod db;
pub mod error;
pub mod flow;
pub mod http;
pub mod labels;
pub mod ledger;
pub mod metrics;
pub mod rating;
pub mod standings;

pub use error::{LadderError, LadderResult};
