// Route exports
pub mod swipes;

use actix_web::{error, http::StatusCode, web, HttpResponse};

use crate::core::SwipeError;
use crate::models::ErrorResponse;

pub use swipes::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(swipes::configure),
    );
}

impl error::ResponseError for SwipeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SwipeError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            SwipeError::AlreadyExists => StatusCode::CONFLICT,
            SwipeError::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            SwipeError::NotFound(_) => StatusCode::NOT_FOUND,
            SwipeError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            SwipeError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            SwipeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    SwipeError::invalid("body", format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    SwipeError::invalid("query", format!("Invalid query: {}", err)).into()
}

/// Attach routes plus the extractor error handlers to an actix `App`
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .configure(configure_routes);
}
