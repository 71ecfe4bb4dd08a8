//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratum_core::error::AppError;
use stratum_core::result::AppResult;

/// Context for the current authenticated request.
///
/// Extracted by the HTTP layer from the bearer token and passed into every
/// service method so each operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's id (the token's `id` claim).
    pub user_id: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            request_time: Utc::now(),
        }
    }

    /// Fails with "wrong user" unless the caller is `owner`.
    pub fn ensure_owner(&self, owner: &str) -> AppResult<()> {
        if self.user_id == owner {
            Ok(())
        } else {
            Err(AppError::wrong_user())
        }
    }

    /// Fails with "wrong user" unless the caller owns the node or it is public.
    pub fn ensure_readable(&self, owner: &str, public: bool) -> AppResult<()> {
        if public {
            return Ok(());
        }
        self.ensure_owner(owner)
    }
}
