// handlers/admin/check_access.rs - GET /api/admin/check-access handler

use axum::{extract::State, http::HeaderMap, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::AppState;
use crate::session::BearerSession;

/// GET /api/admin/check-access - Report the caller's admin status
///
/// Machine-readable variant of the admin guard: no redirects, just the
/// decision. 401 when no session user is present, 200 otherwise. Only a
/// session-provider failure becomes a 500.
pub async fn check_access_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let provider = BearerSession::new(&headers, &state.session_secret);
    let check = state.guard.check_admin_access(&provider).await?;

    let Some(user) = check.user else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "authenticated": false,
                "message": "Not authenticated"
            })),
        ));
    };

    let message = if check.is_admin {
        "You have admin access"
    } else {
        "Your email is not in the admin list. Add it to ADMIN_EMAILS in the environment"
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "authenticated": true,
            "email": user.email,
            "isAdmin": check.is_admin,
            "adminEmails": state.guard.gate().admin_emails(),
            "message": message
        })),
    ))
}
