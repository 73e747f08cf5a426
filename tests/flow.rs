//! Orchestrator flows against a scripted transport and a recording label
//! sink: happy paths, every abort path, and the per-user guard.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use shogi_ladder::config::STARTING_ELO;
use shogi_ladder::db::{MemStore, RecordStore};
use shogi_ladder::flow::{self, ActiveFlows, Transport};
use shogi_ladder::labels::{LabelError, LabelSink};
use shogi_ladder::standings::CommunityLocks;
use shogi_ladder::LadderError;

const G1: i64 = 100;

/// Replays a prepared script: one queue entry per prompt, in call order.
#[derive(Default)]
struct ScriptedTransport {
    choices: Mutex<VecDeque<Option<usize>>>,
    texts: Mutex<VecDeque<Option<String>>>,
    acks: Mutex<VecDeque<bool>>,
}

impl ScriptedTransport {
    fn choices(self, script: &[Option<usize>]) -> Self {
        *self.choices.lock().unwrap() = script.iter().copied().collect();
        self
    }

    fn texts(self, script: &[Option<&str>]) -> Self {
        *self.texts.lock().unwrap() =
            script.iter().map(|t| t.map(str::to_owned)).collect();
        self
    }

    fn acks(self, script: &[bool]) -> Self {
        *self.acks.lock().unwrap() = script.iter().copied().collect();
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn choose(
        &self,
        _user: i64,
        _prompt: &str,
        _options: &[&str],
        _timeout: Duration,
    ) -> Option<usize> {
        self.choices.lock().unwrap().pop_front().flatten()
    }

    async fn collect_text(
        &self,
        _user: i64,
        _prompt: &str,
        _timeout: Duration,
    ) -> Option<String> {
        self.texts.lock().unwrap().pop_front().flatten()
    }

    async fn confirm_pair(&self, _users: [i64; 2], _prompt: &str, _timeout: Duration) -> bool {
        self.acks.lock().unwrap().pop_front().unwrap_or(false)
    }
}

#[derive(Default)]
struct RecordingSink {
    granted: Mutex<Vec<(i64, String)>>,
    revoked: Mutex<Vec<(i64, String)>>,
    deny: bool,
}

#[async_trait]
impl LabelSink for RecordingSink {
    async fn grant(
        &self,
        _community: i64,
        member: i64,
        name: &str,
        _color: Option<u32>,
    ) -> Result<(), LabelError> {
        if self.deny {
            return Err(LabelError::Permission);
        }
        self.granted.lock().unwrap().push((member, name.to_owned()));
        Ok(())
    }

    async fn revoke(&self, _community: i64, member: i64, name: &str) -> Result<(), LabelError> {
        if self.deny {
            return Err(LabelError::Permission);
        }
        self.revoked.lock().unwrap().push((member, name.to_owned()));
        Ok(())
    }

    async fn held(&self, _community: i64, _member: i64) -> Result<Vec<String>, LabelError> {
        Ok(Vec::new())
    }
}

async fn two_players(store: &MemStore) {
    store
        .create_participant(G1, 1, "AlexR", STARTING_ELO)
        .await
        .unwrap();
    store
        .create_participant(G1, 2, "BrunoT", STARTING_ELO)
        .await
        .unwrap();
}

#[tokio::test]
async fn report_happy_path_records_and_syncs_labels() {
    let store = MemStore::new();
    two_players(&store).await;
    // side = sente, result = 1-0, no note
    let transport = ScriptedTransport::default()
        .choices(&[Some(0), Some(0), Some(1)])
        .acks(&[true]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let record = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap();
    assert!(record.note.is_none());

    let a = store.participant_by_external(G1, 1).await.unwrap().unwrap();
    let b = store.participant_by_external(G1, 2).await.unwrap().unwrap();
    assert_eq!((a.elo, b.elo), (1016, 984));

    let granted = sink.granted.lock().unwrap().clone();
    assert!(granted.contains(&(1, "Rank 1".into())));
    assert!(granted.contains(&(1, "1000".into())));
    assert!(granted.contains(&(2, "Rank 2".into())));
    assert!(granted.contains(&(2, "900".into())));
}

#[tokio::test]
async fn side_timeout_aborts_without_mutation() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default().choices(&[None]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let err = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Abandoned(_)));
    assert!(store.matches_chronological(G1).await.unwrap().is_empty());
    let a = store.participant_by_external(G1, 1).await.unwrap().unwrap();
    assert_eq!(a.elo, STARTING_ELO);
}

#[tokio::test]
async fn dual_ack_timeout_aborts() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default()
        .choices(&[Some(0), Some(2)])
        .acks(&[false]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let err = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Abandoned(_)));
    assert!(store.matches_chronological(G1).await.unwrap().is_empty());
}

#[tokio::test]
async fn over_length_note_reprompts() {
    let store = MemStore::new();
    two_players(&store).await;
    let long_note = "x".repeat(71);
    let transport = ScriptedTransport::default()
        .choices(&[Some(1), Some(2), Some(0)]) // gote, draw, add note
        .acks(&[true])
        .texts(&[Some(&long_note), Some("good game")]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let record = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap();
    assert_eq!(record.note.as_deref(), Some("good game"));
}

#[tokio::test]
async fn note_timeout_still_records_the_match() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default()
        .choices(&[Some(0), Some(1), Some(0)])
        .acks(&[true])
        .texts(&[None]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let record = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap();
    assert!(record.note.is_none());
    assert_eq!(store.matches_chronological(G1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_flow_for_same_user_is_busy() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default();
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let _held = flows.begin(1).unwrap();
    let err = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT")
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Busy));
}

#[tokio::test]
async fn guard_releases_after_abort() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default().choices(&[None]);
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let _ = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "BrunoT").await;
    // the slot must be free again
    assert!(flows.begin(1).is_ok());
}

#[tokio::test]
async fn reporting_against_yourself_is_rejected() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default();
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let err = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "AlexR")
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));
}

#[tokio::test]
async fn unknown_opponent_is_not_found() {
    let store = MemStore::new();
    two_players(&store).await;
    let transport = ScriptedTransport::default();
    let sink = RecordingSink::default();
    let flows = ActiveFlows::new();
    let locks = CommunityLocks::new();

    let err = flow::run_report(&store, &transport, &sink, &flows, &locks, G1, 1, "NobodyQ")
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::NotFound(_)));
}

#[tokio::test]
async fn signup_happy_path_creates_beginner() {
    let store = MemStore::new();
    let transport = ScriptedTransport::default()
        .texts(&[Some("MarieC")])
        .choices(&[Some(0), Some(0)]); // confirm, Beginner
    let flows = ActiveFlows::new();

    let p = flow::run_signup(&store, &transport, &flows, G1, 7)
        .await
        .unwrap();
    assert_eq!(p.name, "MarieC");
    assert_eq!(p.elo, 500);
    assert_eq!(p.games_played, 0);
}

#[tokio::test]
async fn signup_bad_name_reprompts() {
    let store = MemStore::new();
    let transport = ScriptedTransport::default()
        .texts(&[Some("marieC"), Some("Marie"), Some("MarieC")])
        .choices(&[Some(0), Some(1)]); // confirm, Intermediate
    let flows = ActiveFlows::new();

    let p = flow::run_signup(&store, &transport, &flows, G1, 7)
        .await
        .unwrap();
    assert_eq!(p.name, "MarieC");
    assert_eq!(p.elo, STARTING_ELO);
}

#[tokio::test]
async fn signup_cancel_aborts() {
    let store = MemStore::new();
    let transport = ScriptedTransport::default()
        .texts(&[Some("MarieC")])
        .choices(&[Some(1)]);
    let flows = ActiveFlows::new();

    let err = flow::run_signup(&store, &transport, &flows, G1, 7)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Abandoned(_)));
    assert!(store.participant_by_external(G1, 7).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let store = MemStore::new();
    store
        .create_participant(G1, 7, "MarieC", STARTING_ELO)
        .await
        .unwrap();
    let transport = ScriptedTransport::default();
    let flows = ActiveFlows::new();

    let err = flow::run_signup(&store, &transport, &flows, G1, 7)
        .await
        .unwrap_err();
    assert!(matches!(err, LadderError::Validation(_)));
}

#[test]
fn name_format_rules() {
    assert!(flow::valid_name("MarieC"));
    assert!(flow::valid_name("DwayneJ"));
    assert!(!flow::valid_name("marieC"));
    assert!(!flow::valid_name("Marie"));
    assert!(!flow::valid_name("MaRieC"));
    assert!(!flow::valid_name("MC"));
    assert!(!flow::valid_name(""));
}
