/// Scan pipeline and history endpoints
///
/// # Endpoints
///
/// - `POST /api/scan` - Submit an image for OCR + AI analysis
/// - `GET /api/scan/history` - Own scan history, newest first
/// - `GET /api/scan/:id` - One scan, owner-only
///
/// # Pipeline
///
/// Submission runs strictly sequentially, with no parallelism and no
/// retries: validate the upload, store it, call OCR, reject empty text,
/// call the AI analysis, persist the record, respond. The stored file is
/// retained on disk whether the pipeline succeeds or fails, so the
/// history page can always display it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    upload,
};
use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pharmalens_shared::{
    auth::middleware::AuthContext,
    models::scan::{CreateScan, ScanRecord},
};
use serde::Serialize;
use uuid::Uuid;

/// Successful scan submission response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub scan_id: Uuid,
    pub ocr_result: String,
    pub ai_analysis: String,
    pub message: String,
}

/// Scan history response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<ScanRecord>,
}

/// Single scan response
#[derive(Debug, Serialize)]
pub struct ScanDetailResponse {
    pub scan: ScanRecord,
}

/// The image part and optional scan date pulled out of the multipart body
struct ScanUpload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    scan_date: Option<String>,
}

/// Submit a scan
///
/// # Errors
///
/// - `400 Bad Request`: no image attached, not an accepted image format,
///   too large, or the image contained no readable text
/// - `500 Internal Server Error`: the OCR or AI call failed (stage is
///   named, detail stays server-side), or persistence failed
pub async fn submit_scan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<Json<ScanResponse>> {
    let upload_body = read_multipart(multipart).await?;

    let extension = upload::validate_image_upload(
        &upload_body.file_name,
        upload_body.content_type.as_deref(),
        upload_body.bytes.len(),
        state.config.upload.max_file_size_bytes,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let filename = upload::stored_filename(&extension);
    let stored_path = upload::store(
        std::path::Path::new(&state.config.upload.dir),
        &filename,
        &upload_body.bytes,
    )
    .await
    .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {}", e)))?;

    // Stage 1: OCR. The stored file stays on disk even when this fails.
    tracing::info!(user_id = %auth.user_id, file = %filename, "Processing OCR");
    let ocr_result = state.ocr.extract_text(&stored_path).await?;

    if ocr_result.is_empty() {
        return Err(ApiError::BadRequest("No text found in image".to_string()));
    }

    // Stage 2: AI analysis.
    tracing::info!(user_id = %auth.user_id, "Analyzing with AI");
    let ai_analysis = state.ai.analyze(&ocr_result).await?;

    // Stage 3: persist. The record exists only because both stages
    // succeeded.
    let scan = ScanRecord::create(
        &state.db,
        CreateScan {
            user_id: auth.user_id,
            image_filename: filename,
            ocr_result: ocr_result.clone(),
            ai_analysis: ai_analysis.clone(),
            scan_date: resolve_scan_date(upload_body.scan_date.as_deref()),
        },
    )
    .await?;

    Ok(Json(ScanResponse {
        success: true,
        scan_id: scan.id,
        ocr_result,
        ai_analysis,
        message: "Image processed successfully".to_string(),
    }))
}

/// Own scan history, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<HistoryResponse>> {
    let history = ScanRecord::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(HistoryResponse { history }))
}

/// One scan, owner-only
///
/// # Errors
///
/// - `404 Not Found`: no such scan, or it belongs to someone else
pub async fn get_scan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(scan_id): Path<Uuid>,
) -> ApiResult<Json<ScanDetailResponse>> {
    let scan = ScanRecord::find_for_user(&state.db, scan_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Scan result not found".to_string()))?;

    Ok(Json(ScanDetailResponse { scan }))
}

/// Pulls the image part and optional `scan_date` field out of the body
///
/// # Errors
///
/// - `400 Bad Request`: malformed multipart payload or no image part
async fn read_multipart(mut multipart: Multipart) -> Result<ScanUpload, ApiError> {
    let mut image: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut scan_date: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("image") => {
                let file_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| ApiError::BadRequest("No image file provided".to_string()))?;
                let content_type = field.content_type().map(|c| c.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

                image = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("scan_date") => {
                scan_date = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        image.ok_or_else(|| ApiError::BadRequest("No image file provided".to_string()))?;

    Ok(ScanUpload {
        file_name,
        content_type,
        bytes,
        scan_date,
    })
}

/// Resolves the record timestamp from the optional client hint
///
/// The client-supplied `scan_date` is a display-only timezone hint:
/// stored verbatim when it parses as RFC 3339, replaced by server time
/// otherwise.
fn resolve_scan_date(hint: Option<&str>) -> DateTime<Utc> {
    match hint {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("Ignoring unparseable scan_date {:?}: {}", raw, e);
                Utc::now()
            }
        },
        None => Utc::now(),
    }
}
