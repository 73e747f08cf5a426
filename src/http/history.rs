//! Match-history queries with resolved player names.

use std::collections::HashMap;

use actix_web::{get, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Outcome, Side};
use crate::db::{PgStore, RecordStore};
use crate::ledger;

#[derive(Deserialize)]
pub struct HistoryParams {
    /// Restrict to matches involving this player.
    pub player: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
struct MatchView {
    id: Uuid,
    sente: String,
    gote: String,
    outcome: Outcome,
    note: Option<String>,
    played_at: DateTime<Utc>,
}

/// GET /api/{community}/history — newest-first, capped listing.
#[get("/{community}/history")]
pub async fn history(
    store: web::Data<PgStore>,
    path: web::Path<i64>,
    web::Query(params): web::Query<HistoryParams>,
) -> Result<HttpResponse, crate::LadderError> {
    let community = path.into_inner();
    let matches = ledger::history(
        store.get_ref(),
        community,
        params.player.as_deref(),
        params.limit,
    )
    .await?;

    let names: HashMap<Uuid, String> = store
        .participants_ranked(community)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let name_of = |id: Uuid| names.get(&id).cloned().unwrap_or_else(|| "?".into());

    let views: Vec<MatchView> = matches
        .into_iter()
        .map(|m| {
            let (sente_id, gote_id) = match m.p1_side {
                Side::Sente => (m.p1_id, m.p2_id),
                Side::Gote => (m.p2_id, m.p1_id),
            };
            MatchView {
                id: m.id,
                sente: name_of(sente_id),
                gote: name_of(gote_id),
                outcome: m.outcome,
                note: m.note,
                played_at: m.created_at,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(history);
}
