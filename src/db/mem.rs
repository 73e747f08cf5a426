//! In-memory [`RecordStore`] used by the test suite and local development.
//!
//! Vectors keep insertion order, which gives the deterministic chronology
//! (matches) and rank tie order (participants) the engine relies on.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::models::{MatchRecord, NewMatch, Participant, StatLine};
use crate::db::store::RecordStore;
use crate::error::LadderResult;

#[derive(Default)]
struct Inner {
    participants: Vec<Participant>,
    matches: Vec<MatchRecord>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemStore {
    async fn create_participant(
        &self,
        community: i64,
        external_id: i64,
        name: &str,
        elo: i32,
    ) -> LadderResult<Participant> {
        let p = Participant {
            id: Uuid::new_v4(),
            community_id: community,
            external_id,
            name: name.to_owned(),
            elo,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().participants.push(p.clone());
        Ok(p)
    }

    async fn participant_by_id(&self, id: Uuid) -> LadderResult<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn participant_by_external(
        &self,
        community: i64,
        external_id: i64,
    ) -> LadderResult<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .participants
            .iter()
            .find(|p| p.community_id == community && p.external_id == external_id)
            .cloned())
    }

    async fn participant_by_name(
        &self,
        community: i64,
        name: &str,
    ) -> LadderResult<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .participants
            .iter()
            .find(|p| p.community_id == community && p.name == name)
            .cloned())
    }

    async fn participants_ranked(&self, community: i64) -> LadderResult<Vec<Participant>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Participant> = inner
            .participants
            .iter()
            .filter(|p| p.community_id == community)
            .cloned()
            .collect();
        // stable sort: equal ratings keep signup order
        rows.sort_by(|a, b| b.elo.cmp(&a.elo));
        Ok(rows)
    }

    async fn set_rating(&self, community: i64, id: Uuid, elo: i32) -> LadderResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .participants
            .iter_mut()
            .find(|p| p.community_id == community && p.id == id)
        {
            Some(p) => {
                p.elo = elo;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rename_participant(
        &self,
        community: i64,
        id: Uuid,
        name: &str,
    ) -> LadderResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .participants
            .iter_mut()
            .find(|p| p.community_id == community && p.id == id)
        {
            Some(p) => {
                p.name = name.to_owned();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_participant(&self, community: i64, id: Uuid) -> LadderResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.participants.len();
        inner
            .participants
            .retain(|p| !(p.community_id == community && p.id == id));
        if inner.participants.len() == before {
            return Ok(false);
        }
        inner.matches.retain(|m| !m.involves(id));
        Ok(true)
    }

    async fn record_match(
        &self,
        m: NewMatch,
        p1: (Uuid, StatLine),
        p2: (Uuid, StatLine),
    ) -> LadderResult<MatchRecord> {
        let mut inner = self.inner.lock().unwrap();
        let record = MatchRecord {
            id: Uuid::new_v4(),
            community_id: m.community_id,
            p1_id: m.p1_id,
            p2_id: m.p2_id,
            p1_side: m.p1_side,
            outcome: m.outcome,
            note: m.note,
            created_at: Utc::now(),
        };
        inner.matches.push(record.clone());
        for (pid, line) in [p1, p2] {
            if let Some(p) = inner.participants.iter_mut().find(|p| p.id == pid) {
                p.apply_line(&line);
            }
        }
        Ok(record)
    }

    async fn match_by_id(&self, community: i64, id: Uuid) -> LadderResult<Option<MatchRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .matches
            .iter()
            .find(|m| m.community_id == community && m.id == id)
            .cloned())
    }

    async fn delete_match(&self, community: i64, id: Uuid) -> LadderResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.matches.len();
        inner
            .matches
            .retain(|m| !(m.community_id == community && m.id == id));
        Ok(inner.matches.len() != before)
    }

    async fn matches_chronological(&self, community: i64) -> LadderResult<Vec<MatchRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .matches
            .iter()
            .filter(|m| m.community_id == community)
            .cloned()
            .collect())
    }

    async fn matches_recent(
        &self,
        community: i64,
        participant: Option<Uuid>,
        limit: i64,
    ) -> LadderResult<Vec<MatchRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .matches
            .iter()
            .rev()
            .filter(|m| m.community_id == community)
            .filter(|m| participant.map_or(true, |pid| m.involves(pid)))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn write_standings(
        &self,
        community: i64,
        rows: &[(Uuid, StatLine)],
    ) -> LadderResult<()> {
        let mut inner = self.inner.lock().unwrap();
        for (pid, line) in rows {
            if let Some(p) = inner
                .participants
                .iter_mut()
                .find(|p| p.community_id == community && p.id == *pid)
            {
                p.apply_line(line);
            }
        }
        Ok(())
    }

    async fn communities(&self) -> LadderResult<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<i64> = inner.participants.iter().map(|p| p.community_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
