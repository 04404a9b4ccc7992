// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/api/health` | none |
//! | GET | `/api/account` | bearer |
//! | GET | `/api/holdings` | bearer |
//! | GET | `/docs` | none |
//! | GET/HEAD | anything else | none (static assets, entry-document fallback) |

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    assets,
    auth::require_identity,
    error::ApiError,
    models::{AccountResponse, HealthResponse, Holding},
    state::AppState,
};

pub mod account;
pub mod health;
pub mod holdings;

pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let protected = Router::new()
        .route("/account", get(account::get_account))
        .route("/holdings", get(holdings::list_holdings))
        .route_layer(from_fn_with_state(state.clone(), require_identity));

    let api = Router::new()
        .route("/health", get(health::health))
        .merge(protected)
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(assets::serve_spa)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(allowed_origins)),
        )
}

/// CORS for the web client: explicit origins, credentials allowed.
pub fn cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Unknown API paths are a plain 404, never the entry document.
async fn api_not_found() -> ApiError {
    ApiError::not_found("not found")
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, account::get_account, holdings::list_holdings),
    components(schemas(HealthResponse, AccountResponse, Holding)),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Account", description = "Signed-in user profile"),
        (name = "Holdings", description = "Portfolio positions")
    )
)]
struct ApiDoc;
