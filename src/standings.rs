//! Standings Engine: incremental rating application, full chronological
//! replay, and on-demand rank computation.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use uuid::Uuid;

use crate::config::{settings, STARTING_ELO};
use crate::db::models::{MatchRecord, NewMatch, Outcome, Participant, Side, StatLine};
use crate::db::store::RecordStore;
use crate::error::{LadderError, LadderResult};
use crate::ledger;
use crate::metrics;
use crate::rating;

/// Per-community write lock. Every standings mutation for a community runs
/// under its lock, so two concurrently completed matches against overlapping
/// participants can never compute from stale ratings.
#[derive(Default)]
pub struct CommunityLocks {
    inner: DashMap<i64, Arc<Mutex<()>>>,
}

impl CommunityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_community(&self, community: i64) -> Arc<Mutex<()>> {
        self.inner.entry(community).or_default().clone()
    }
}

/// Result of one incremental apply: the appended match and both updated rows.
#[derive(Debug, Clone)]
pub struct MatchApplied {
    pub record: MatchRecord,
    pub p1: Participant,
    pub p2: Participant,
}

/// Append one match and apply its rating effects, atomically.
///
/// Participant rows are re-read under the community lock, so the
/// read-modify-write cannot race another completion. The match row and both
/// stat rows land in one store transaction; a mid-way failure surfaces as
/// `Persistence` and leaves neither.
pub async fn apply_match<S: RecordStore>(
    store: &S,
    locks: &CommunityLocks,
    community: i64,
    p1_id: Uuid,
    p2_id: Uuid,
    p1_side: Side,
    outcome: Outcome,
    note: Option<String>,
) -> LadderResult<MatchApplied> {
    if let Some(n) = &note {
        let max = settings().note_max_chars;
        if n.chars().count() > max {
            return Err(LadderError::validation(format!(
                "note exceeds {max} characters"
            )));
        }
    }

    let lock = locks.for_community(community);
    let _held = lock.lock().await;

    let mut p1 = store
        .participant_by_id(p1_id)
        .await?
        .ok_or_else(|| LadderError::not_found("unknown participant"))?;
    let mut p2 = store
        .participant_by_id(p2_id)
        .await?
        .ok_or_else(|| LadderError::not_found("unknown participant"))?;
    ledger::validate_pairing(community, &p1, &p2)?;

    let (s1, s2) = outcome.scores(p1_side);
    let (new1, new2) = rating::update(p1.elo, p2.elo, s1, s2, settings().k_factor);
    let line1 = p1.stat_line().record(s1, new1);
    let line2 = p2.stat_line().record(s2, new2);

    let record = store
        .record_match(
            NewMatch {
                community_id: community,
                p1_id,
                p2_id,
                p1_side,
                outcome,
                note,
            },
            (p1_id, line1),
            (p2_id, line2),
        )
        .await?;
    metrics::MATCHES_RECORDED.inc();
    log::info!(
        "match {} recorded in community {community}: {} {} vs {}",
        record.id,
        outcome.as_str(),
        p1.name,
        p2.name,
    );

    p1.apply_line(&line1);
    p2.apply_line(&line2);
    Ok(MatchApplied { record, p1, p2 })
}

/// Full replay for a community from the remaining match history.
pub async fn replay<S: RecordStore>(
    store: &S,
    locks: &CommunityLocks,
    community: i64,
) -> LadderResult<usize> {
    replay_with(store, locks, community, &[]).await
}

/// Full replay, additionally resetting `also_reset` participants to the
/// baseline even when they no longer appear in the history (the two sides of
/// a just-deleted match).
///
/// Replay is idempotent given the same history, so a persistence failure is
/// retried from scratch a bounded number of times before surfacing.
pub async fn replay_with<S: RecordStore>(
    store: &S,
    locks: &CommunityLocks,
    community: i64,
    also_reset: &[Uuid],
) -> LadderResult<usize> {
    let lock = locks.for_community(community);
    let _held = lock.lock().await;

    let strategy = FixedInterval::from_millis(250).take(2);
    let touched = Retry::spawn(strategy, || replay_once(store, community, also_reset)).await?;
    metrics::REPLAYS_RUN.inc();
    log::info!("community {community} replayed, {touched} participants recomputed");
    Ok(touched)
}

/// One sequential replay pass: reset, fold in chronological order, persist
/// the final state for every touched participant in one batch.
async fn replay_once<S: RecordStore>(
    store: &S,
    community: i64,
    also_reset: &[Uuid],
) -> LadderResult<usize> {
    let history = store.matches_chronological(community).await?;

    let mut lines: HashMap<Uuid, StatLine> = HashMap::new();
    for id in also_reset {
        lines.insert(*id, StatLine::fresh(STARTING_ELO));
    }
    for m in &history {
        lines.entry(m.p1_id).or_insert_with(|| StatLine::fresh(STARTING_ELO));
        lines.entry(m.p2_id).or_insert_with(|| StatLine::fresh(STARTING_ELO));
    }

    // Order is significant: the rating function is path-dependent.
    for m in &history {
        let (s1, s2) = m.outcome.scores(m.p1_side);
        let l1 = lines[&m.p1_id];
        let l2 = lines[&m.p2_id];
        let (new1, new2) = rating::update(l1.elo, l2.elo, s1, s2, settings().k_factor);
        lines.insert(m.p1_id, l1.record(s1, new1));
        lines.insert(m.p2_id, l2.record(s2, new2));
    }

    let rows: Vec<(Uuid, StatLine)> = lines.into_iter().collect();
    store.write_standings(community, &rows).await?;
    Ok(rows.len())
}

/// Current ranking: 1-based position in a stable descending sort by rating.
/// Recomputed on demand, never cached across mutations.
pub async fn rank<S: RecordStore>(
    store: &S,
    community: i64,
) -> LadderResult<Vec<(Participant, u32)>> {
    let rows = store.participants_ranked(community).await?;
    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, i as u32 + 1))
        .collect())
}
