// handlers/admin/pages.rs - redirect-guarded admin routes

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde_json::json;

use crate::access::AdminPermission;
use crate::error::ApiError;
use crate::guard::AccessDecision;
use crate::handlers::AppState;
use crate::session::BearerSession;

/// GET /admin - admin landing, redirect-guarded
///
/// The guard resolves to a decision; this route layer performs the actual
/// navigation. Unauthenticated callers land on sign-in, non-admins on the
/// dashboard with an unauthorized marker.
pub async fn admin_home_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let provider = BearerSession::new(&headers, &state.session_secret);
    let decision = state.guard.require_admin_access(&provider).await?;

    Ok(respond(decision))
}

/// GET /admin/discounts - requires the manage_discounts permission
pub async fn discounts_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let provider = BearerSession::new(&headers, &state.session_secret);
    let decision = state
        .guard
        .require_admin_permission(&provider, AdminPermission::ManageDiscounts)
        .await?;

    Ok(respond(decision))
}

fn respond(decision: AccessDecision) -> Response {
    match decision {
        AccessDecision::Authorized(user) => Json(json!({
            "success": true,
            "data": { "user": user }
        }))
        .into_response(),
        AccessDecision::RedirectTo { path, .. } => Redirect::temporary(&path).into_response(),
    }
}
