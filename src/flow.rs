//! Interaction Orchestrator: drives the external transport through fixed
//! linear flows and commits the collected record.
//!
//! The report flow is `SelectSide → SelectOutcome → AwaitDualConfirmation →
//! OptionalNote → Commit`. Any timeout, decline or invalid input before
//! Commit aborts the whole flow with no ledger mutation; aborts are terminal
//! and the reporter must start over.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{settings, STARTING_ELO};
use crate::db::models::{MatchRecord, Outcome, Participant, Side};
use crate::db::store::RecordStore;
use crate::error::{LadderError, LadderResult};
use crate::labels::{self, LabelSink};
use crate::standings::{self, CommunityLocks};

/// Structured-input collection offered by the external transport. The
/// transport owns message formatting, reaction handling and timeout
/// bookkeeping; the orchestrator only sees the distilled result.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Single-choice prompt from a fixed option set. `None` means timeout
    /// or invalid/foreign input.
    async fn choose(
        &self,
        user: i64,
        prompt: &str,
        options: &[&str],
        timeout: Duration,
    ) -> Option<usize>;

    /// Free-text prompt. `None` means timeout.
    async fn collect_text(&self, user: i64, prompt: &str, timeout: Duration) -> Option<String>;

    /// Both users must independently acknowledge within the timeout.
    async fn confirm_pair(&self, users: [i64; 2], prompt: &str, timeout: Duration) -> bool;
}

/// One orchestrated flow per reporting user. Acquisition is scoped: the
/// guard releases on every exit path, including errors and panics.
#[derive(Default)]
pub struct ActiveFlows {
    inner: DashMap<i64, ()>,
}

pub struct FlowGuard<'a> {
    flows: &'a ActiveFlows,
    user: i64,
}

impl ActiveFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the per-user slot, or fail immediately with `Busy` (a second
    /// invocation is rejected, never queued).
    pub fn begin(&self, user: i64) -> LadderResult<FlowGuard<'_>> {
        match self.inner.entry(user) {
            Entry::Occupied(_) => Err(LadderError::Busy),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(FlowGuard { flows: self, user })
            }
        }
    }
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        self.flows.inner.remove(&self.user);
    }
}

/// Collect and commit one match report from `reporter` against the named
/// opponent.
pub async fn run_report<S, T, L>(
    store: &S,
    transport: &T,
    sink: &L,
    flows: &ActiveFlows,
    locks: &CommunityLocks,
    community: i64,
    reporter: i64,
    opponent_name: &str,
) -> LadderResult<MatchRecord>
where
    S: RecordStore,
    T: Transport,
    L: LabelSink,
{
    let _guard = flows.begin(reporter)?;

    let me = store
        .participant_by_external(community, reporter)
        .await?
        .ok_or_else(|| LadderError::not_found("you are not registered yet"))?;
    if me.name == opponent_name {
        return Err(LadderError::validation(
            "you cannot report a match against yourself",
        ));
    }
    let opponent = store
        .participant_by_name(community, opponent_name)
        .await?
        .ok_or_else(|| LadderError::not_found(format!("no player named {opponent_name}")))?;
    if opponent.id == me.id || opponent.external_id == reporter {
        return Err(LadderError::validation(
            "you cannot report a match against yourself",
        ));
    }

    let choice_timeout = Duration::from_secs(settings().choice_timeout);

    let side = match transport
        .choose(reporter, "Select your side", &["Sente", "Gote"], choice_timeout)
        .await
    {
        Some(0) => Side::Sente,
        Some(1) => Side::Gote,
        _ => return Err(LadderError::Abandoned("side selection timed out")),
    };

    let outcome = match transport
        .choose(
            reporter,
            "Select the result",
            &["1-0 (sente won)", "0-1 (gote won)", "0.5-0.5 (draw)"],
            choice_timeout,
        )
        .await
    {
        Some(0) => Outcome::SenteWin,
        Some(1) => Outcome::GoteWin,
        Some(2) => Outcome::Draw,
        _ => return Err(LadderError::Abandoned("result selection timed out")),
    };

    let acked = transport
        .confirm_pair(
            [reporter, opponent.external_id],
            "Both players must confirm the reported result",
            Duration::from_secs(settings().confirm_timeout),
        )
        .await;
    if !acked {
        return Err(LadderError::Abandoned("confirmation timed out"));
    }

    let note = collect_note(transport, reporter, choice_timeout).await;

    // Commit. Pairing is re-validated and both rows re-read under the
    // community lock; the append and its rating effects land atomically.
    let applied = standings::apply_match(
        store, locks, community, me.id, opponent.id, side, outcome, note,
    )
    .await?;

    if let Err(e) =
        labels::sync_standings(store, sink, community, &[applied.p1.id, applied.p2.id]).await
    {
        log::warn!(
            "label refresh after match {} failed: {e}",
            applied.record.id
        );
    }
    Ok(applied.record)
}

/// Optional-note step. A timeout anywhere here means "no note" — the match
/// is still recorded. Over-length input re-prompts instead of truncating.
async fn collect_note<T: Transport>(
    transport: &T,
    user: i64,
    choice_timeout: Duration,
) -> Option<String> {
    match transport
        .choose(user, "Add a note to this game?", &["Yes", "No"], choice_timeout)
        .await
    {
        Some(0) => {}
        _ => return None,
    }

    let max = settings().note_max_chars;
    let timeout = Duration::from_secs(settings().note_timeout);
    loop {
        let text = transport
            .collect_text(user, &format!("Enter your note ({max} chars max)"), timeout)
            .await?;
        let text = text.trim().to_owned();
        if text.chars().count() > max {
            // too long: ask again, never truncate silently
            continue;
        }
        return if text.is_empty() { None } else { Some(text) };
    }
}

/// Signup flow: one shared deadline budget across all steps. The remaining
/// budget is recomputed, never reset, between prompts.
pub async fn run_signup<S, T>(
    store: &S,
    transport: &T,
    flows: &ActiveFlows,
    community: i64,
    user: i64,
) -> LadderResult<Participant>
where
    S: RecordStore,
    T: Transport,
{
    let _guard = flows.begin(user)?;

    if let Some(existing) = store.participant_by_external(community, user).await? {
        return Err(LadderError::validation(format!(
            "already signed up as {}",
            existing.name
        )));
    }

    let deadline = Instant::now() + Duration::from_secs(settings().signup_budget);

    let name = loop {
        let input = transport
            .collect_text(
                user,
                "Enter your name as (FirstName)(LastInitial), e.g. MarieC",
                budget_left(deadline)?,
            )
            .await
            .ok_or(LadderError::Abandoned("signup timed out"))?;
        let input = input.trim().to_owned();
        if !valid_name(&input) {
            continue;
        }
        if store.participant_by_name(community, &input).await?.is_some() {
            // taken: re-prompt within the same budget
            continue;
        }
        break input;
    };

    match transport
        .choose(
            user,
            &format!("Sign up as {name}?"),
            &["Confirm", "Cancel"],
            budget_left(deadline)?,
        )
        .await
    {
        Some(0) => {}
        Some(_) => return Err(LadderError::Abandoned("signup cancelled")),
        None => return Err(LadderError::Abandoned("signup timed out")),
    }

    let elo = match transport
        .choose(
            user,
            "Select your level",
            &["Beginner", "Intermediate", "Advanced"],
            budget_left(deadline)?,
        )
        .await
    {
        Some(0) => settings().beginner_elo,
        Some(1) | Some(2) => STARTING_ELO,
        _ => return Err(LadderError::Abandoned("signup timed out")),
    };

    let p = store.create_participant(community, user, &name, elo).await?;
    log::info!(
        "participant {} signed up in community {community} at {elo}",
        p.name
    );
    Ok(p)
}

fn budget_left(deadline: Instant) -> LadderResult<Duration> {
    let now = Instant::now();
    if now >= deadline {
        Err(LadderError::Abandoned("signup timed out"))
    } else {
        Ok(deadline - now)
    }
}

/// `(FirstName)(LastInitial)`: leading capital, lowercase middle, one
/// trailing capital.
pub fn valid_name(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() >= 3
        && b[0].is_ascii_uppercase()
        && b[b.len() - 1].is_ascii_uppercase()
        && b[1..b.len() - 1].iter().all(|c| c.is_ascii_lowercase())
}
