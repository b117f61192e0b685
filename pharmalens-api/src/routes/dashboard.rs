/// Dashboard and admin endpoints
///
/// # Endpoints
///
/// - `GET /api/dashboard/stats` - Role-scoped stats
/// - `GET /api/dashboard/recent-scans` - Latest scans (role-scoped)
/// - `GET /api/dashboard/users` - All users (admin)
/// - `GET /api/dashboard/all-scans` - All scans with usernames (admin)
/// - `DELETE /api/dashboard/users/:id` - Delete a user and their scans (admin)
/// - `PUT /api/dashboard/users/:id/role` - Change a user's role (admin)
///
/// Admins may not target their own account with delete or role-change,
/// and admin accounts are never deleted or role-changed through these
/// endpoints at all.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use pharmalens_shared::{
    auth::middleware::AuthContext,
    models::{
        scan::{RecentScan, ScanRecord, ScanWithUsername},
        user::{PublicUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role-scoped dashboard stats
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DashboardStats {
    /// Platform-wide numbers, admin only
    #[serde(rename_all = "camelCase")]
    Admin {
        total_users: i64,
        total_scans: i64,
        today_scans: i64,
        this_week_scans: i64,
    },

    /// Own numbers for regular users
    #[serde(rename_all = "camelCase")]
    User {
        my_scans: i64,
        today_scans: i64,
        this_week_scans: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentScansResponse {
    pub recent_scans: Vec<RecentScan>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct AllScansResponse {
    pub scans: Vec<ScanWithUsername>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Role-change request body
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Midnight UTC today; "today" counts scans at or after this
fn start_of_today() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// Seven days back from now; "this week" counts scans at or after this
fn week_ago() -> DateTime<Utc> {
    Utc::now() - Duration::days(7)
}

/// Role-scoped dashboard stats
///
/// Admins get platform-wide numbers; regular users only their own. Every
/// filter travels as a bind parameter.
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<StatsResponse>> {
    let today = start_of_today();
    let week = week_ago();

    let stats = if auth.is_admin() {
        DashboardStats::Admin {
            total_users: User::count_non_admin(&state.db).await?,
            total_scans: ScanRecord::count_all(&state.db).await?,
            today_scans: ScanRecord::count_all_since(&state.db, today).await?,
            this_week_scans: ScanRecord::count_all_since(&state.db, week).await?,
        }
    } else {
        DashboardStats::User {
            my_scans: ScanRecord::count_for_user(&state.db, auth.user_id).await?,
            today_scans: ScanRecord::count_for_user_since(&state.db, auth.user_id, today).await?,
            this_week_scans: ScanRecord::count_for_user_since(&state.db, auth.user_id, week)
                .await?,
        }
    };

    Ok(Json(StatsResponse { stats }))
}

/// Latest scans, role-scoped
///
/// Admins see everyone's latest scans with usernames attached; users see
/// their own.
pub async fn recent_scans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<RecentScansResponse>> {
    let recent_scans = if auth.is_admin() {
        ScanRecord::recent_all(&state.db).await?
    } else {
        ScanRecord::recent_for_user(&state.db, auth.user_id).await?
    };

    Ok(Json(RecentScansResponse { recent_scans }))
}

/// All users, newest first (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = User::list_public(&state.db).await?;

    Ok(Json(UsersResponse { users }))
}

/// All scans joined with usernames (admin)
pub async fn all_scans(State(state): State<AppState>) -> ApiResult<Json<AllScansResponse>> {
    let scans = ScanRecord::list_all_with_username(&state.db).await?;

    Ok(Json(AllScansResponse { scans }))
}

/// Delete a user and everything they own (admin)
///
/// # Errors
///
/// - `400 Bad Request`: targeting the caller's own account, or an admin
///   account
/// - `404 Not Found`: no such user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.role == UserRole::Admin {
        return Err(ApiError::BadRequest(
            "Admin accounts cannot be deleted".to_string(),
        ));
    }

    let deleted = User::delete_cascade(&state.db, user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(admin = %auth.user_id, deleted_user = %user_id, "User deleted");

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Change a user's role (admin)
///
/// # Errors
///
/// - `400 Bad Request`: unknown role value, targeting the caller's own
///   account, or targeting an existing admin account
/// - `404 Not Found`: no such user
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let role = UserRole::parse(&req.role)
        .ok_or_else(|| ApiError::BadRequest("Invalid role".to_string()))?;

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot change your own role".to_string(),
        ));
    }

    let target = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.role == UserRole::Admin {
        return Err(ApiError::BadRequest(
            "Admin accounts cannot be role-changed".to_string(),
        ));
    }

    User::update_role(&state.db, user_id, role).await?;

    tracing::info!(
        admin = %auth.user_id,
        target_user = %user_id,
        new_role = role.as_str(),
        "User role updated"
    );

    Ok(Json(MessageResponse {
        message: "User role updated successfully".to_string(),
    }))
}
