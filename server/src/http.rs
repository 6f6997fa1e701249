//! HTTP surface: explain endpoints for book and series searches.
//!
//! Each endpoint authenticates the bearer token, checks the filter against the
//! configured limits, compiles it together with the caller's security scope
//! and answers with the statement a database backend would run.
//!
//! # Pre-conditions
//! - Requests carry `Authorization: Bearer <jwt>`.
//!
//! # Post-conditions
//! - A 200 response always includes the security scope of the caller.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::auth::{JwtConfig, JwtError, SecurityContext, verify_token};
use crate::backend::render_select;
use crate::search::{
    BookCondition, CompileError, FilterCompiler, FilterLimitError, FilterLimits, Literal,
    RequiredJoin, SearchCondition, SeriesCondition,
};
use crate::time::TimeSource;

/// Shared state for all handlers.
#[derive(Clone)]
#[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected for shared state
pub struct AppState {
    pub jwt: Arc<JwtConfig>,
    pub limits: FilterLimits,
    pub time: Arc<dyn TimeSource>,
}

/// Body of an explain request. A missing or null condition means "no filter".
#[derive(Debug, Deserialize)]
pub struct ExplainRequest<C> {
    pub condition: Option<C>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub sql: String,
    pub params: Vec<Literal>,
    pub joins: Vec<RequiredJoin>,
}

/// Error returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed or rejected bearer token.
    Unauthorized(String),
    /// The filter cannot be served for this request.
    BadRequest(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<JwtError> for ApiError {
    fn from(error: JwtError) -> Self {
        Self::Unauthorized(error.to_string())
    }
}

impl From<FilterLimitError> for ApiError {
    fn from(error: FilterLimitError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<CompileError> for ApiError {
    fn from(error: CompileError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/books/search/explain", post(explain_books))
        .route("/api/v1/series/search/explain", post(explain_series))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn explain_books(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExplainRequest<BookCondition>>,
) -> Result<Json<ExplainResponse>, ApiError> {
    explain(&state, &headers, &request).map(Json)
}

async fn explain_series(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExplainRequest<SeriesCondition>>,
) -> Result<Json<ExplainResponse>, ApiError> {
    explain(&state, &headers, &request).map(Json)
}

/// Authenticate, bound, compile and render one explain request.
///
/// # Errors
/// - `ApiError::Unauthorized` if the bearer token is missing or invalid.
/// - `ApiError::BadRequest` if the filter exceeds the limits or cannot be
///   compiled for the caller.
pub fn explain<C: SearchCondition>(
    state: &AppState,
    headers: &HeaderMap,
    request: &ExplainRequest<C>,
) -> Result<ExplainResponse, ApiError> {
    let result = authenticate(state, headers).and_then(|context| {
        if let Some(condition) = &request.condition {
            state.limits.check(condition)?;
        }
        let compiler = FilterCompiler::new(state.time.as_ref());
        let filter = compiler.compile_search(&context, request.condition.as_ref())?;
        Ok(filter)
    });

    let filter = match result {
        Ok(filter) => filter,
        Err(error) => {
            tracing::warn!(entity = ?C::ENTITY, "rejected explain request: {error}");
            return Err(error);
        }
    };

    let statement = render_select(C::ENTITY, &filter);
    Ok(ExplainResponse {
        sql: statement.sql,
        params: statement.params,
        joins: filter.required_joins.into_iter().collect(),
    })
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<SecurityContext, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;
    let principal = verify_token(token, &state.jwt)?;
    tracing::debug!(user = %principal.user_id, "authenticated request");
    Ok(principal.into())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;
    use crate::auth::{AgeRestriction, Claims};
    use crate::search::{Equality, StringOp};
    use crate::time::FixedTimeSource;
    use crate::types::ReadStatus;

    const SECRET: &[u8] = b"explain-endpoint-test-secret";
    /// 2100-01-01T00:00:00Z.
    const FAR_FUTURE: u64 = 4_102_444_800;

    fn state() -> AppState {
        AppState {
            jwt: Arc::new(JwtConfig::new_hs256(SECRET.to_vec()).expect("valid secret")),
            limits: FilterLimits {
                max_depth: 3,
                max_nodes: 8,
            },
            time: Arc::new(FixedTimeSource::default()),
        }
    }

    fn bearer(claims: &Claims) -> HeaderMap {
        let token = encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("encodes");
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        );
        headers
    }

    fn user(sub: &str) -> Claims {
        Claims {
            sub: sub.to_owned(),
            exp: FAR_FUTURE,
            ..Claims::default()
        }
    }

    fn request<C>(condition: C) -> ExplainRequest<C> {
        ExplainRequest {
            condition: Some(condition),
        }
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let result = explain::<BookCondition>(
            &state(),
            &HeaderMap::new(),
            &ExplainRequest { condition: None },
        );
        let error = result.expect_err("must be rejected");
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bad_signature_is_unauthorized() {
        let token = encode(
            &Header::default(),
            &user("u1"),
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .expect("encodes");
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        );
        let result =
            explain::<SeriesCondition>(&state(), &headers, &ExplainRequest { condition: None });
        assert_eq!(
            result.expect_err("must be rejected").status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_unfiltered_search_is_scoped_to_libraries() {
        let claims = Claims {
            libraries: Some(vec!["lib-b".to_owned(), "lib-a".to_owned()]),
            ..user("u1")
        };
        let response = explain::<SeriesCondition>(
            &state(),
            &bearer(&claims),
            &ExplainRequest { condition: None },
        )
        .expect("explains");
        assert_eq!(
            response.sql,
            "SELECT s.ID FROM SERIES s WHERE s.LIBRARY_ID IN ($1, $2)"
        );
        assert_eq!(
            response.params,
            vec![Literal::from("lib-a"), Literal::from("lib-b")]
        );
        assert!(response.joins.is_empty());
    }

    #[test]
    fn test_read_status_joins_progress_of_token_user() {
        let response = explain(
            &state(),
            &bearer(&user("u1")),
            &request(BookCondition::ReadStatus(Equality::Is(ReadStatus::Read))),
        )
        .expect("explains");
        assert_eq!(
            response.sql,
            "SELECT b.ID FROM BOOK b \
             LEFT JOIN READ_PROGRESS r ON b.ID = r.BOOK_ID AND r.USER_ID = $1 \
             WHERE r.COMPLETED IS TRUE"
        );
        assert_eq!(
            response.joins,
            vec![RequiredJoin::ReadProgress(crate::types::UserId::new("u1"))]
        );
    }

    #[test]
    fn test_age_restricted_user_gets_series_metadata_join() {
        let claims = Claims {
            age_restriction: Some(AgeRestriction::allow_only(12)),
            ..user("u1")
        };
        let response = explain(
            &state(),
            &bearer(&claims),
            &request(BookCondition::Title(StringOp::Contains("moon".to_owned()))),
        )
        .expect("explains");
        assert!(response.joins.contains(&RequiredJoin::SeriesMetadata));
        assert!(response.joins.contains(&RequiredJoin::BookMetadata));
        assert!(response.sql.contains("sd.AGE_RATING <= $"));
    }

    #[test]
    fn test_oversized_filter_is_bad_request() {
        let tag = |value: &str| BookCondition::Tag(Equality::Is(value.to_owned()));
        let inner = BookCondition::AllOf(vec![tag("a")]);
        let deep = BookCondition::AllOf(vec![BookCondition::AnyOf(vec![inner])]);
        let result = explain(&state(), &bearer(&user("u1")), &request(deep));
        assert_eq!(
            result.expect_err("too deep").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_request_body_wire_format() {
        let json = r#"{"condition": {"tag": {"operator": "is", "value": "x"}}}"#;
        let body: ExplainRequest<BookCondition> = serde_json::from_str(json).expect("valid body");
        assert!(body.condition.is_some());
        let empty: ExplainRequest<BookCondition> = serde_json::from_str("{}").expect("valid body");
        assert!(empty.condition.is_none());
    }

    #[test]
    fn test_response_serializes_joins_and_params() {
        let response = ExplainResponse {
            sql: "SELECT b.ID FROM BOOK b".to_owned(),
            params: vec![Literal::from("u1"), Literal::from(3_i64)],
            joins: vec![
                RequiredJoin::BookMetadata,
                RequiredJoin::ReadProgress(crate::types::UserId::new("u1")),
            ],
        };
        let json = serde_json::to_value(&response).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "sql": "SELECT b.ID FROM BOOK b",
                "params": ["u1", 3],
                "joins": [
                    {"join": "bookMetadata"},
                    {"join": "readProgress", "id": "u1"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_healthz() {
        assert_eq!(healthz().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_explain_handler_wraps_json() {
        let Json(response) = explain_books(
            State(state()),
            bearer(&user("u1")),
            Json(ExplainRequest { condition: None }),
        )
        .await
        .expect("explains");
        assert_eq!(response.sql, "SELECT b.ID FROM BOOK b");
    }
}
