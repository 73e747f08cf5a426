//! Player profile: rating, record, ratios and current rank.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::db::PgStore;
use crate::error::LadderError;
use crate::standings;

#[derive(Serialize)]
struct ProfileView {
    name: String,
    elo: i32,
    rank: u32,
    wins: i32,
    losses: i32,
    draws: i32,
    games_played: i32,
    win_ratio: f64,
}

/// GET /api/{community}/players/{name}
#[get("/{community}/players/{name}")]
pub async fn profile(
    store: web::Data<PgStore>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, LadderError> {
    let (community, name) = path.into_inner();

    let ranked = standings::rank(store.get_ref(), community).await?;
    let (p, rank) = ranked
        .into_iter()
        .find(|(p, _)| p.name == name)
        .ok_or_else(|| LadderError::not_found(format!("no player named {name}")))?;

    let win_ratio = if p.games_played > 0 {
        f64::from(p.wins) / f64::from(p.games_played) * 100.0
    } else {
        0.0
    };

    Ok(HttpResponse::Ok().json(ProfileView {
        name: p.name,
        elo: p.elo,
        rank,
        wins: p.wins,
        losses: p.losses,
        draws: p.draws,
        games_played: p.games_played,
        win_ratio,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(profile);
}
