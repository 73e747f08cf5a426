//! The record-store seam.
//!
//! Typed operations over the `players`/`games` relations. Composite
//! operations ([`RecordStore::record_match`], [`RecordStore::write_standings`])
//! are transactional inside the implementation: a match row and its rating
//! effects both land or neither does.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{MatchRecord, NewMatch, Participant, StatLine};
use crate::error::LadderResult;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_participant(
        &self,
        community: i64,
        external_id: i64,
        name: &str,
        elo: i32,
    ) -> LadderResult<Participant>;

    /// Lookup by primary key, unscoped. Callers that need community scoping
    /// validate it themselves (cross-community pairings must be reported as
    /// validation failures, not as missing rows).
    async fn participant_by_id(&self, id: Uuid) -> LadderResult<Option<Participant>>;

    async fn participant_by_external(
        &self,
        community: i64,
        external_id: i64,
    ) -> LadderResult<Option<Participant>>;

    async fn participant_by_name(
        &self,
        community: i64,
        name: &str,
    ) -> LadderResult<Option<Participant>>;

    /// All participants of a community, rating descending. Ties keep signup
    /// order; the order is deterministic for a given snapshot.
    async fn participants_ranked(&self, community: i64) -> LadderResult<Vec<Participant>>;

    /// Out-of-band rating override. Does not touch counters and leaves no
    /// ledger trace: a later full replay recomputes from history and erases
    /// the override. Returns false if the participant is unknown.
    async fn set_rating(&self, community: i64, id: Uuid, elo: i32) -> LadderResult<bool>;

    async fn rename_participant(
        &self,
        community: i64,
        id: Uuid,
        name: &str,
    ) -> LadderResult<bool>;

    /// Administrative removal; cascades to the participant's matches.
    async fn remove_participant(&self, community: i64, id: Uuid) -> LadderResult<bool>;

    /// Durable append of one match together with both updated stat rows, in
    /// one transaction.
    async fn record_match(
        &self,
        m: NewMatch,
        p1: (Uuid, StatLine),
        p2: (Uuid, StatLine),
    ) -> LadderResult<MatchRecord>;

    async fn match_by_id(&self, community: i64, id: Uuid) -> LadderResult<Option<MatchRecord>>;

    /// Returns whether a row was removed.
    async fn delete_match(&self, community: i64, id: Uuid) -> LadderResult<bool>;

    /// Full history in ascending creation order; the replay basis.
    async fn matches_chronological(&self, community: i64) -> LadderResult<Vec<MatchRecord>>;

    /// Newest-first listing, optionally filtered to matches involving one
    /// participant, capped at `limit`. Restartable: each call re-derives
    /// from current state.
    async fn matches_recent(
        &self,
        community: i64,
        participant: Option<Uuid>,
        limit: i64,
    ) -> LadderResult<Vec<MatchRecord>>;

    /// Batch-persist replayed stat lines in one transaction.
    async fn write_standings(
        &self,
        community: i64,
        rows: &[(Uuid, StatLine)],
    ) -> LadderResult<()>;

    /// Every community id with at least one participant.
    async fn communities(&self) -> LadderResult<Vec<i64>>;
}
