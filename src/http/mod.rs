//! Thin read/admin HTTP surface over the engine.

pub mod admin;
pub mod health;
pub mod history;
pub mod leaderboard;
pub mod profile;
pub mod routes;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

use crate::error::LadderError;

impl actix_web::ResponseError for LadderError {
    fn status_code(&self) -> StatusCode {
        match self {
            LadderError::Validation(_) => StatusCode::BAD_REQUEST,
            LadderError::NotFound(_) => StatusCode::NOT_FOUND,
            LadderError::Abandoned(_) => StatusCode::REQUEST_TIMEOUT,
            LadderError::Busy => StatusCode::CONFLICT,
            LadderError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let LadderError::Persistence(e) = self {
            // user-facing text stays generic, detail goes to the log
            log::error!("persistence failure: {e:?}");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
