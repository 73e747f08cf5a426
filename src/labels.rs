//! Label Synchronizer: mirrors standings into externally visible labels.
//!
//! Two label families per participant: a rank-tier label (top three get a
//! distinct label, ranks 4-10 share one) and a rating-bucket label (the
//! rating floored to the nearest hundred, stringified). Every call against
//! the collaborator is best-effort; a permission failure is logged, counted
//! and swallowed so it can never roll back a rating write.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::settings;
use crate::db::store::RecordStore;
use crate::error::LadderResult;
use crate::metrics;

#[derive(Debug, Error)]
pub enum LabelError {
    /// The collaborator refused the grant/revoke; never fatal.
    #[error("missing permission")]
    Permission,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// External label collaborator. Creating a missing label is the
/// collaborator's responsibility, as is the mapping from the color hint to
/// its own color model.
#[async_trait]
pub trait LabelSink: Send + Sync {
    async fn grant(
        &self,
        community: i64,
        member: i64,
        name: &str,
        color: Option<u32>,
    ) -> Result<(), LabelError>;

    async fn revoke(&self, community: i64, member: i64, name: &str) -> Result<(), LabelError>;

    async fn held(&self, community: i64, member: i64) -> Result<Vec<String>, LabelError>;
}

const RANK_TIERS: [(&str, u32); 4] = [
    ("Rank 1", 0xF1C40F), // gold
    ("Rank 2", 0xC0C0C0), // silver
    ("Rank 3", 0xCD7F32), // bronze
    ("Top 10", 0x3498DB),
];

/// Rank-tier label for a 1-based rank, if any. No label above rank 10.
pub fn rank_label(rank: u32) -> Option<(&'static str, u32)> {
    match rank {
        1..=3 => Some(RANK_TIERS[rank as usize - 1]),
        4..=10 => Some(RANK_TIERS[3]),
        _ => None,
    }
}

/// Rating-bucket label name: the rating floored to the nearest hundred.
pub fn bucket_label(elo: i32) -> String {
    (elo / 100 * 100).to_string()
}

/// Whether a held label belongs to the rating-bucket family (3-4 digit
/// numeric name).
pub fn is_bucket_name(name: &str) -> bool {
    (3..=4).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_digit())
}

fn is_tier_name(name: &str) -> bool {
    RANK_TIERS.iter().any(|(tier, _)| *tier == name)
}

/// Reconcile one member's labels with their current rating and rank.
///
/// Revokes held labels of either family that are no longer correct, then
/// grants the missing targets. All failures are swallowed.
pub async fn sync<L: LabelSink>(sink: &L, community: i64, member: i64, elo: i32, rank: u32) {
    let held = match sink.held(community, member).await {
        Ok(held) => held,
        Err(e) => {
            metrics::LABEL_SYNC_FAILURES.inc();
            log::warn!("could not list labels for member {member}: {e}");
            return;
        }
    };

    let tier = rank_label(rank);
    let bucket = bucket_label(elo);

    for name in &held {
        let stale_tier = is_tier_name(name) && tier.map(|(t, _)| t) != Some(name.as_str());
        let stale_bucket = is_bucket_name(name) && *name != bucket;
        if stale_tier || stale_bucket {
            if let Err(e) = sink.revoke(community, member, name).await {
                metrics::LABEL_SYNC_FAILURES.inc();
                log::warn!("could not revoke label {name:?} from member {member}: {e}");
            }
        }
    }

    if let Some((name, color)) = tier {
        if !held.iter().any(|h| h == name) {
            if let Err(e) = sink.grant(community, member, name, Some(color)).await {
                metrics::LABEL_SYNC_FAILURES.inc();
                log::warn!("could not grant label {name:?} to member {member}: {e}");
            }
        }
    }
    if !held.iter().any(|h| *h == bucket) {
        if let Err(e) = sink.grant(community, member, &bucket, None).await {
            metrics::LABEL_SYNC_FAILURES.inc();
            log::warn!("could not grant label {bucket:?} to member {member}: {e}");
        }
    }
}

/// Refresh labels after a standings change: the participants named in
/// `touched` plus the community's current top window (rank-tier labels can
/// shift for bystanders when ratings move).
pub async fn sync_standings<S: RecordStore, L: LabelSink>(
    store: &S,
    sink: &L,
    community: i64,
    touched: &[Uuid],
) -> LadderResult<()> {
    let ranked = store.participants_ranked(community).await?;
    let window = settings().label_top_window;
    for (idx, p) in ranked.iter().enumerate() {
        if idx < window || touched.contains(&p.id) {
            sync(sink, community, p.external_id, p.elo, idx as u32 + 1).await;
        }
    }
    Ok(())
}

/// Spawn the periodic full refresh (every community's top window) as a
/// background Tokio task.
pub fn start_refresh<S, L>(store: std::sync::Arc<S>, sink: std::sync::Arc<L>)
where
    S: RecordStore + 'static,
    L: LabelSink + 'static,
{
    tokio::spawn(async move {
        let period = Duration::from_secs(settings().label_refresh_hours * 3600);
        loop {
            if let Err(e) = refresh_all(store.as_ref(), sink.as_ref()).await {
                log::error!("label refresh pass failed: {e:?}");
            }
            sleep(period).await;
        }
    });
}

async fn refresh_all<S: RecordStore, L: LabelSink>(store: &S, sink: &L) -> LadderResult<()> {
    for community in store.communities().await? {
        sync_standings(store, sink, community, &[]).await?;
    }
    Ok(())
}
