pub mod admin;

use std::sync::Arc;

use crate::guard::AdminGuard;

/// Shared router state. The guard (and its allowlist) is built once at
/// startup and immutable afterwards.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AdminGuard>,
    pub session_secret: String,
}
