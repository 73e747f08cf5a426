//! Label mapping rules and best-effort synchronization.

use std::sync::Mutex;

use async_trait::async_trait;
use shogi_ladder::config::STARTING_ELO;
use shogi_ladder::db::{MemStore, RecordStore};
use shogi_ladder::labels::{self, LabelError, LabelSink};

const G1: i64 = 100;

#[test]
fn rank_tiers() {
    assert_eq!(labels::rank_label(1).map(|(n, _)| n), Some("Rank 1"));
    assert_eq!(labels::rank_label(2).map(|(n, _)| n), Some("Rank 2"));
    assert_eq!(labels::rank_label(3).map(|(n, _)| n), Some("Rank 3"));
    assert_eq!(labels::rank_label(4).map(|(n, _)| n), Some("Top 10"));
    assert_eq!(labels::rank_label(10).map(|(n, _)| n), Some("Top 10"));
    assert_eq!(labels::rank_label(11), None);
    assert_eq!(labels::rank_label(0), None);
}

#[test]
fn bucket_floors_to_the_hundred() {
    assert_eq!(labels::bucket_label(1016), "1000");
    assert_eq!(labels::bucket_label(999), "900");
    assert_eq!(labels::bucket_label(984), "900");
    assert_eq!(labels::bucket_label(500), "500");
    assert_eq!(labels::bucket_label(1500), "1500");
}

#[test]
fn bucket_family_recognition() {
    assert!(labels::is_bucket_name("900"));
    assert!(labels::is_bucket_name("1500"));
    assert!(!labels::is_bucket_name("Rank 1"));
    assert!(!labels::is_bucket_name("42"));
    assert!(!labels::is_bucket_name("12345"));
    assert!(!labels::is_bucket_name("90a"));
}

#[derive(Default)]
struct RecordingSink {
    held: Mutex<Vec<String>>,
    granted: Mutex<Vec<(i64, String)>>,
    revoked: Mutex<Vec<(i64, String)>>,
    deny: bool,
}

impl RecordingSink {
    fn holding(names: &[&str]) -> Self {
        Self {
            held: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            ..Self::default()
        }
    }
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
        Ok(self.held.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn sync_revokes_stale_and_grants_current() {
    // the member climbed: rank 2 → 1, bucket 900 → 1000
    let sink = RecordingSink::holding(&["Rank 2", "900", "Veteran"]);
    labels::sync(&sink, G1, 42, 1016, 1).await;

    let revoked = sink.revoked.lock().unwrap().clone();
    assert!(revoked.contains(&(42, "Rank 2".into())));
    assert!(revoked.contains(&(42, "900".into())));
    // unrelated labels are left alone
    assert!(!revoked.iter().any(|(_, n)| n == "Veteran"));

    let granted = sink.granted.lock().unwrap().clone();
    assert!(granted.contains(&(42, "Rank 1".into())));
    assert!(granted.contains(&(42, "1000".into())));
}

#[tokio::test]
async fn sync_is_idempotent_for_correct_labels() {
    let sink = RecordingSink::holding(&["Rank 1", "1000"]);
    labels::sync(&sink, G1, 42, 1016, 1).await;

    assert!(sink.revoked.lock().unwrap().is_empty());
    assert!(sink.granted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sync_drops_tier_when_out_of_window() {
    let sink = RecordingSink::holding(&["Top 10", "1000"]);
    labels::sync(&sink, G1, 42, 1016, 11).await;

    let revoked = sink.revoked.lock().unwrap().clone();
    assert_eq!(revoked, vec![(42, "Top 10".into())]);
    assert!(sink.granted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn permission_failures_are_swallowed() {
    let sink = RecordingSink {
        deny: true,
        ..RecordingSink::default()
    };
    // must not panic or propagate
    labels::sync(&sink, G1, 42, 1016, 1).await;
}

#[tokio::test]
async fn standings_sync_covers_the_top_window() {
    let store = MemStore::new();
    let sink = RecordingSink::default();
    for (ext, name) in [(1, "AlexR"), (2, "BrunoT"), (3, "CoraV")] {
        store
            .create_participant(G1, ext, name, STARTING_ELO)
            .await
            .unwrap();
    }

    labels::sync_standings(&store, &sink, G1, &[]).await.unwrap();

    let granted = sink.granted.lock().unwrap().clone();
    assert!(granted.contains(&(1, "Rank 1".into())));
    assert!(granted.contains(&(2, "Rank 2".into())));
    assert!(granted.contains(&(3, "Rank 3".into())));
    assert_eq!(granted.iter().filter(|(_, n)| n == "1000").count(), 3);
}
