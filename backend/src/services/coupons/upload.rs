use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::ingest::{IngestPipeline, PersistenceGate};
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_multipart::Multipart;
use actix_web::{web, Responder};
use common::model::upload::UploadSummary;
use futures_util::StreamExt;
use log::{info, warn};
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

/// Multipart field names that may carry the CSV.
const FILE_FIELDS: [&str; 2] = ["category", "file"];

pub async fn process(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: Multipart,
) -> impl Responder {
    let result = upload_coupon_codes(state.get_ref().clone(), payload).await;
    match &result {
        Ok(Some(summary)) => info!(
            "'{}' uploaded coupon codes: {} processed, {} added, {} already stored",
            user.user_name,
            summary.total_processed,
            summary.new_codes_added,
            summary.duplicates_skipped
        ),
        Ok(None) => info!("'{}' uploaded a file without codes", user.user_name),
        Err(e) if !e.is_internal() => warn!("upload from '{}' rejected: {}", user.user_name, e),
        Err(_) => {}
    }
    report::respond(report::upload_outcome(result))
}

/// Spools the uploaded CSV, then parses and persists it on a blocking thread.
/// The spool file is removed when the blocking task finishes, whatever the
/// outcome.
pub async fn upload_coupon_codes(
    state: AppState,
    payload: Multipart,
) -> Result<Option<UploadSummary>, ServiceError> {
    let spool = spool_csv(payload, state.config.ingest.max_upload_bytes).await?;
    let pipeline = IngestPipeline::new(state.config.ingest);
    let store = state.store.clone();

    run_blocking(move || {
        let batch = pipeline.run_file(spool.path())?;
        drop(spool);
        if batch.is_empty() {
            return Ok(None);
        }
        PersistenceGate::new(&store).commit(&batch).map(Some)
    })
    .await
}

/// Writes the CSV field to a temp file, giving up once more than `max_bytes`
/// have arrived. The partial spool is removed on that path too.
async fn spool_csv(mut payload: Multipart, max_bytes: u64) -> Result<NamedTempFile, ServiceError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ServiceError::BadRequest(format!("Invalid upload: {}", e)))?;
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        if !name.as_deref().is_some_and(|n| FILE_FIELDS.contains(&n)) {
            // Drain fields we do not care about.
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ServiceError::BadRequest(format!("Invalid upload: {}", e)))?;
            }
            continue;
        }

        let filename = filename.unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(ServiceError::BadRequest(
                "The file must end with .csv".to_string(),
            ));
        }

        let spool = NamedTempFile::new()?;
        let mut writer = BufWriter::new(spool.reopen()?);
        let mut written = 0u64;
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ServiceError::BadRequest(format!("Invalid upload: {}", e)))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(ServiceError::BadRequest(format!(
                    "File is too large. Maximum allowed: {} bytes",
                    max_bytes
                )));
            }
            writer.write_all(&chunk)?;
        }
        writer.flush()?;
        return Ok(spool);
    }

    Err(ServiceError::BadRequest("File is required".to_string()))
}
