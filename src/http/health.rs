//! Simple liveness / readiness probe

use actix_web::{get, web, HttpResponse, Responder};

use crate::db::PgStore;

#[get("/healthz")]
pub async fn healthz(store: web::Data<PgStore>) -> impl Responder {
    if sqlx::query("SELECT 1").execute(store.pool()).await.is_err() {
        return HttpResponse::ServiceUnavailable().body("db");
    }
    HttpResponse::Ok().body("ok")
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
