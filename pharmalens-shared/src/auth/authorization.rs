/// Role checks for admin-only routes
///
/// PharmaLens has a flat two-role model: every account is either a
/// regular `user` or an `admin`. The only authorization decision beyond
/// resource ownership is whether a request may reach the admin surface
/// of the dashboard.

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller does not hold the admin role
    #[error("Admin access required")]
    AdminRequired,
}

/// Requires the caller to hold the admin role
///
/// # Errors
///
/// Returns `AuthzError::AdminRequired` for non-admin callers
///
/// # Example
///
/// ```
/// use pharmalens_shared::auth::authorization::require_admin;
/// use pharmalens_shared::auth::middleware::AuthContext;
/// use pharmalens_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     username: "root".to_string(),
///     role: UserRole::Admin,
/// };
/// assert!(require_admin(&auth).is_ok());
/// ```
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}
