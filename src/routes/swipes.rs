use actix_web::{http::header, web, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Duration;
use validator::{Validate, ValidationErrors};

use crate::core::{with_deadline, AuthError, IdentityProvider, SwipeEngine, SwipeError};
use crate::models::{
    HealthResponse, MatchesResponse, ReconcileResponse, RecordSwipeRequest, RecordSwipeResponse,
    SuggestionsQuery, SuggestionsResponse, SwipeHistoryQuery, SwipeHistoryResponse, UserIdentity, UserQuery,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: SwipeEngine,
    pub identity: Arc<dyn IdentityProvider>,
    /// Per-request deadline applied to engine calls
    pub request_timeout: Option<Duration>,
}

/// Configure all swipe-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/swipes", web::post().to(record_swipe))
        .route("/swipes/history", web::get().to(swipe_history))
        .route("/suggestions", web::get().to(suggestions))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/reconcile", web::post().to(reconcile_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = match state.engine.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Record a swipe
///
/// POST /api/v1/swipes
///
/// Request body:
/// ```json
/// {
///   "swiperUserId": 1,
///   "swipedProfileUserId": 2,
///   "action": "like|pass"
/// }
/// ```
async fn record_swipe(
    state: web::Data<AppState>,
    req: web::Json<RecordSwipeRequest>,
    http_req: HttpRequest,
) -> Result<HttpResponse, SwipeError> {
    let identity = authenticate(&state, &http_req).await?;
    req.validate().map_err(validation_error)?;

    if identity.user_id != req.swiper_user_id {
        tracing::warn!(
            "User {} is recording a swipe on behalf of user {}",
            identity.user_id,
            req.swiper_user_id
        );
    }

    let outcome = with_deadline(
        state.request_timeout,
        state.engine.record_swipe(req.swiper_user_id, req.swiped_profile_user_id, &req.action),
    )
    .await?;

    Ok(HttpResponse::Ok().json(RecordSwipeResponse::from(outcome)))
}

/// GET /api/v1/swipes/history?userId={userId}&limit={limit}&offset={offset}
///
/// `limit=0` (or absent) returns the default page size.
async fn swipe_history(
    state: web::Data<AppState>,
    query: web::Query<SwipeHistoryQuery>,
    http_req: HttpRequest,
) -> Result<HttpResponse, SwipeError> {
    authenticate(&state, &http_req).await?;
    query.validate().map_err(validation_error)?;

    let swipes = with_deadline(
        state.request_timeout,
        state.engine.get_swipe_history(query.user_id, query.limit, query.offset),
    )
    .await?;

    Ok(HttpResponse::Ok().json(SwipeHistoryResponse { swipes }))
}

/// GET /api/v1/suggestions?userId={userId}&limit={limit}
async fn suggestions(
    state: web::Data<AppState>,
    query: web::Query<SuggestionsQuery>,
    http_req: HttpRequest,
) -> Result<HttpResponse, SwipeError> {
    authenticate(&state, &http_req).await?;
    query.validate().map_err(validation_error)?;

    let profiles = with_deadline(
        state.request_timeout,
        state.engine.get_suggestions(query.user_id, query.limit),
    )
    .await?;

    Ok(HttpResponse::Ok().json(SuggestionsResponse { profiles }))
}

/// GET /api/v1/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
    http_req: HttpRequest,
) -> Result<HttpResponse, SwipeError> {
    authenticate(&state, &http_req).await?;
    query.validate().map_err(validation_error)?;

    let matches = with_deadline(state.request_timeout, state.engine.get_matches(query.user_id)).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse { matches }))
}

/// Re-run match detection for a user's likes
///
/// POST /api/v1/matches/reconcile
///
/// Request body: `{"userId": 1}`
async fn reconcile_matches(
    state: web::Data<AppState>,
    req: web::Json<UserQuery>,
    http_req: HttpRequest,
) -> Result<HttpResponse, SwipeError> {
    authenticate(&state, &http_req).await?;
    req.validate().map_err(validation_error)?;

    let created = with_deadline(state.request_timeout, state.engine.reconcile_matches(req.user_id)).await?;

    Ok(HttpResponse::Ok().json(ReconcileResponse { created }))
}

async fn authenticate(state: &AppState, req: &HttpRequest) -> Result<UserIdentity, SwipeError> {
    let token = bearer_token(req)?;
    let identity = state.identity.validate_token(token).await.map_err(|e| {
        tracing::info!("Rejected token on {}: {}", req.path(), e);
        SwipeError::from(e)
    })?;
    tracing::debug!("Authenticated user {} on {}", identity.user_id, req.path());
    Ok(identity)
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

fn validation_error(errors: ValidationErrors) -> SwipeError {
    let mut fields: Vec<&'static str> = errors
        .field_errors()
        .keys()
        .map(|name| known_field(&name.to_string()))
        .collect();
    fields.sort_unstable();

    let field = fields.first().copied().unwrap_or("request");
    SwipeError::invalid(field, errors.to_string())
}

fn known_field(name: &str) -> &'static str {
    match name {
        "swiper_user_id" => "swiper_user_id",
        "swiped_profile_user_id" => "swiped_profile_user_id",
        "action" => "action",
        "user_id" => "user_id",
        _ => "request",
    }
}
