//! Match Ledger: pairing validation, history listings, and removal.
//!
//! Removal is the correction path: deleting an arbitrary historical match
//! invalidates every downstream rating, so it always triggers a full replay
//! for the community (see [`crate::standings::replay_with`]).

use uuid::Uuid;

use crate::config::settings;
use crate::db::models::{MatchRecord, Participant};
use crate::db::store::RecordStore;
use crate::error::{LadderError, LadderResult};
use crate::standings::{self, CommunityLocks};

/// A match is only well-formed between two distinct participants of the
/// same community. Cross-community pairings are a correctness violation,
/// not a lookup miss.
pub fn validate_pairing(
    community: i64,
    p1: &Participant,
    p2: &Participant,
) -> LadderResult<()> {
    if p1.id == p2.id {
        return Err(LadderError::validation(
            "a match needs two distinct participants",
        ));
    }
    if p1.community_id != community || p2.community_id != community {
        return Err(LadderError::validation(
            "participants belong to different communities",
        ));
    }
    Ok(())
}

/// Remove one match and rebuild the community's standings from the
/// remaining history. `NotFound` if the id does not exist in this
/// community; nothing is mutated in that case.
pub async fn remove<S: RecordStore>(
    store: &S,
    locks: &CommunityLocks,
    community: i64,
    match_id: Uuid,
) -> LadderResult<MatchRecord> {
    let record = store
        .match_by_id(community, match_id)
        .await?
        .ok_or_else(|| LadderError::not_found(format!("no match with id {match_id}")))?;

    if !store.delete_match(community, match_id).await? {
        return Err(LadderError::not_found(format!("no match with id {match_id}")));
    }
    log::info!("match {match_id} removed from community {community}, replaying");

    // The deleted match's participants are reset even when this was their
    // only game, so the result equals never having recorded it.
    standings::replay_with(store, locks, community, &[record.p1_id, record.p2_id]).await?;
    Ok(record)
}

/// Newest-first history, optionally restricted to one participant by name.
/// Restartable: every call re-derives from current state.
pub async fn history<S: RecordStore>(
    store: &S,
    community: i64,
    player: Option<&str>,
    limit: Option<i64>,
) -> LadderResult<Vec<MatchRecord>> {
    let participant = match player {
        Some(name) => {
            let p = store
                .participant_by_name(community, name)
                .await?
                .ok_or_else(|| LadderError::not_found(format!("no player named {name}")))?;
            Some(p.id)
        }
        None => None,
    };
    let limit = limit.unwrap_or(settings().history_limit);
    store.matches_recent(community, participant, limit).await
}
