// src/http/leaderboard.rs

use actix_web::{get, web, HttpResponse};
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};

use crate::db::PgStore;
use crate::error::LadderError;
use crate::standings;

#[derive(Deserialize)]
pub struct LeaderboardParams {
    /// Maximum number of entries to return.
    pub limit: Option<usize>,
}

#[derive(Serialize)]
struct Entry {
    rank: u32,
    name: String,
    elo: i32,
    games_played: i32,
}

/// GET /api/{community}/leaderboard — rating-descending standings, cached
/// in Redis for 30 s. The cache is advisory: any Redis failure falls
/// through to the database.
#[get("/{community}/leaderboard")]
pub async fn leaderboard(
    store: web::Data<PgStore>,
    redis: web::Data<RedisClient>,
    path: web::Path<i64>,
    web::Query(params): web::Query<LeaderboardParams>,
) -> Result<HttpResponse, LadderError> {
    let community = path.into_inner();
    let limit = params.limit.unwrap_or(50);
    let key = format!("leaderboard:{community}:{limit}");

    let mut conn = redis.get_multiplexed_async_connection().await.ok();
    if let Some(c) = conn.as_mut() {
        if let Ok(cached) = c.get::<_, String>(&key).await {
            return Ok(HttpResponse::Ok()
                .content_type("application/json")
                .body(cached));
        }
    }

    let entries: Vec<Entry> = standings::rank(store.get_ref(), community)
        .await?
        .into_iter()
        .take(limit)
        .map(|(p, rank)| Entry {
            rank,
            name: p.name,
            elo: p.elo,
            games_played: p.games_played,
        })
        .collect();

    let body = serde_json::to_string(&entries).map_err(anyhow::Error::from)?;
    if let Some(c) = conn.as_mut() {
        let _: Result<(), _> = c.set_ex(&key, &body, 30).await;
    }

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(leaderboard);
}
