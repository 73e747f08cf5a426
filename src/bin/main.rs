use actix_web::{middleware::Logger, web, App, HttpServer};
use redis::Client as RedisClient;
use shogi_ladder::db::PgStore;
use shogi_ladder::standings::CommunityLocks;
use shogi_ladder::{http, metrics};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    let store = PgStore::connect(&database_url)
        .await
        .expect("Failed to connect Postgres store");
    let redis_client = RedisClient::open(redis_url.as_str()).expect("Invalid REDIS_URL");
    let locks = web::Data::new(CommunityLocks::new());

    // The interaction transport and label collaborator are deployment
    // adapters wired by the embedding bot process; this binary serves the
    // read/admin API only.
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(redis_client.clone()))
            .app_data(locks.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
