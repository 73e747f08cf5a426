//! Administrative corrections.
//!
//! Removing a game triggers a full replay; a rating override is out-of-band
//! and will be erased by the next replay. These endpoints are expected to
//! sit behind the deployment's own authentication layer.

use actix_web::{delete, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{PgStore, RecordStore};
use crate::error::LadderError;
use crate::ledger;
use crate::standings::CommunityLocks;

/// DELETE /api/{community}/admin/games/{id} — remove a match and rebuild
/// the community's standings from the remaining history.
#[delete("/{community}/admin/games/{id}")]
pub async fn remove_game(
    store: web::Data<PgStore>,
    locks: web::Data<CommunityLocks>,
    path: web::Path<(i64, Uuid)>,
) -> Result<HttpResponse, LadderError> {
    let (community, id) = path.into_inner();
    let removed = ledger::remove(store.get_ref(), locks.get_ref(), community, id).await?;
    Ok(HttpResponse::Ok().json(removed))
}

#[derive(Deserialize)]
pub struct RatingOverride {
    pub elo: i32,
}

/// PUT /api/{community}/admin/players/{name}/rating
#[put("/{community}/admin/players/{name}/rating")]
pub async fn override_rating(
    store: web::Data<PgStore>,
    path: web::Path<(i64, String)>,
    body: web::Json<RatingOverride>,
) -> Result<HttpResponse, LadderError> {
    let (community, name) = path.into_inner();
    let p = store
        .participant_by_name(community, &name)
        .await?
        .ok_or_else(|| LadderError::not_found(format!("no player named {name}")))?;
    store.set_rating(community, p.id, body.elo).await?;
    log::info!("rating of {name} in community {community} overridden to {}", body.elo);
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct Rename {
    pub name: String,
}

/// PUT /api/{community}/admin/players/{name}/name
#[put("/{community}/admin/players/{name}/name")]
pub async fn rename_player(
    store: web::Data<PgStore>,
    path: web::Path<(i64, String)>,
    body: web::Json<Rename>,
) -> Result<HttpResponse, LadderError> {
    let (community, name) = path.into_inner();
    let p = store
        .participant_by_name(community, &name)
        .await?
        .ok_or_else(|| LadderError::not_found(format!("no player named {name}")))?;
    store.rename_participant(community, p.id, &body.name).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/{community}/admin/players/{name} — administrative removal;
/// cascades to the participant's matches.
#[delete("/{community}/admin/players/{name}")]
pub async fn remove_player(
    store: web::Data<PgStore>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, LadderError> {
    let (community, name) = path.into_inner();
    let p = store
        .participant_by_name(community, &name)
        .await?
        .ok_or_else(|| LadderError::not_found(format!("no player named {name}")))?;
    store.remove_participant(community, p.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(remove_game)
        .service(override_rating)
        .service(rename_player)
        .service(remove_player);
}
