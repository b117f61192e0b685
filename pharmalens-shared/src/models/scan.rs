/// Scan history model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE scan_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     image_filename VARCHAR(512) NOT NULL,
///     ocr_result TEXT,
///     ai_analysis TEXT,
///     scan_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A scan record is inserted only after both the OCR and the AI call have
/// succeeded, and is immutable afterwards. Records disappear only when
/// their owning user is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// History listings return at most this many entries
const HISTORY_LIMIT: i64 = 50;

/// The admin all-scans view returns at most this many entries
const ALL_SCANS_LIMIT: i64 = 100;

/// Dashboard recent-scans widgets show at most this many entries
const RECENT_LIMIT: i64 = 10;

/// A single scan history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScanRecord {
    /// Unique scan ID (UUID v4)
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Filename of the stored upload, relative to the uploads directory
    pub image_filename: String,

    /// Extracted OCR text
    pub ocr_result: Option<String>,

    /// AI-generated analysis text
    pub ai_analysis: Option<String>,

    /// When the scan was taken (client-supplied hint or server time)
    pub scan_date: DateTime<Utc>,
}

/// A scan row joined with its owner's username (admin views)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScanWithUsername {
    pub id: Uuid,
    pub image_filename: String,
    pub ocr_result: Option<String>,
    pub ai_analysis: Option<String>,
    pub scan_date: DateTime<Utc>,
    pub username: String,
}

/// A compact scan row for the dashboard recent-scans widget
///
/// `username` is present only in the admin variant of the query.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentScan {
    pub id: Uuid,
    pub image_filename: String,
    pub scan_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Input for creating a scan record
#[derive(Debug, Clone)]
pub struct CreateScan {
    pub user_id: Uuid,
    pub image_filename: String,
    pub ocr_result: String,
    pub ai_analysis: String,
    pub scan_date: DateTime<Utc>,
}

impl ScanRecord {
    /// Persists a completed scan
    ///
    /// Called once per successful pipeline run, after both external calls
    /// returned.
    pub async fn create(pool: &PgPool, data: CreateScan) -> Result<Self, sqlx::Error> {
        let scan = sqlx::query_as::<_, ScanRecord>(
            r#"
            INSERT INTO scan_history (user_id, image_filename, ocr_result, ai_analysis, scan_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, image_filename, ocr_result, ai_analysis, scan_date
            "#,
        )
        .bind(data.user_id)
        .bind(data.image_filename)
        .bind(data.ocr_result)
        .bind(data.ai_analysis)
        .bind(data.scan_date)
        .fetch_one(pool)
        .await?;

        Ok(scan)
    }

    /// Finds a scan by ID, scoped to its owner
    ///
    /// Non-owners get None, indistinguishable from a missing record.
    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let scan = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT id, user_id, image_filename, ocr_result, ai_analysis, scan_date
            FROM scan_history
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(scan)
    }

    /// Lists a user's scan history, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let scans = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT id, user_id, image_filename, ocr_result, ai_analysis, scan_date
            FROM scan_history
            WHERE user_id = $1
            ORDER BY scan_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(scans)
    }

    /// Lists all scans joined with usernames, newest first (admin view)
    pub async fn list_all_with_username(pool: &PgPool) -> Result<Vec<ScanWithUsername>, sqlx::Error> {
        let scans = sqlx::query_as::<_, ScanWithUsername>(
            r#"
            SELECT sh.id, sh.image_filename, sh.ocr_result, sh.ai_analysis, sh.scan_date, u.username
            FROM scan_history sh
            JOIN users u ON sh.user_id = u.id
            ORDER BY sh.scan_date DESC
            LIMIT $1
            "#,
        )
        .bind(ALL_SCANS_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(scans)
    }

    /// Latest scans for one user (dashboard widget)
    pub async fn recent_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<RecentScan>, sqlx::Error> {
        let scans = sqlx::query_as::<_, RecentScan>(
            r#"
            SELECT id, image_filename, scan_date, NULL::VARCHAR AS username
            FROM scan_history
            WHERE user_id = $1
            ORDER BY scan_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(RECENT_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(scans)
    }

    /// Latest scans across all users, with owner usernames (admin widget)
    pub async fn recent_all(pool: &PgPool) -> Result<Vec<RecentScan>, sqlx::Error> {
        let scans = sqlx::query_as::<_, RecentScan>(
            r#"
            SELECT sh.id, sh.image_filename, sh.scan_date, u.username
            FROM scan_history sh
            JOIN users u ON sh.user_id = u.id
            ORDER BY sh.scan_date DESC
            LIMIT $1
            "#,
        )
        .bind(RECENT_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(scans)
    }

    /// Counts a user's scans
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scan_history WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Counts a user's scans taken at or after a cutoff
    ///
    /// The cutoff is computed in Rust and passed as a bind parameter.
    pub async fn count_for_user_since(
        pool: &PgPool,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scan_history WHERE user_id = $1 AND scan_date >= $2",
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts all scans platform-wide
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scan_history")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts all scans taken at or after a cutoff
    pub async fn count_all_since(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scan_history WHERE scan_date >= $1")
                .bind(cutoff)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_scan_omits_null_username() {
        let scan = RecentScan {
            id: Uuid::new_v4(),
            image_filename: "scan-1.jpg".to_string(),
            scan_date: Utc::now(),
            username: None,
        };

        let json = serde_json::to_value(&scan).unwrap();
        assert!(json.get("username").is_none());
    }

    #[test]
    fn test_recent_scan_includes_username_when_present() {
        let scan = RecentScan {
            id: Uuid::new_v4(),
            image_filename: "scan-1.jpg".to_string(),
            scan_date: Utc::now(),
            username: Some("alice".to_string()),
        };

        let json = serde_json::to_value(&scan).unwrap();
        assert_eq!(json["username"], "alice");
    }
}
