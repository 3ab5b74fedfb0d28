use super::public_path;
use crate::auth::AuthUser;
use crate::config::REQUIRED_HEADER;
use crate::error::ServiceError;
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};
use chrono::Utc;
use common::model::response::GeneratedFile;
use std::fs;
use std::path::{Path, PathBuf};

pub async fn process(state: web::Data<AppState>, _user: AuthUser) -> impl Responder {
    let dir = state.config.sample_dir();
    let result = run_blocking(move || write_template(&dir)).await.map(|path| GeneratedFile {
        file_name: public_path("sample", &path),
    });
    report::respond(report::from_result(result, "Sample File Generated Successfully"))
}

/// Writes a header-only upload template into `dir`.
pub fn write_template(dir: &Path) -> Result<PathBuf, ServiceError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "Unique_Code_Upload_Template_{}.csv",
        Utc::now().timestamp_millis()
    ));
    fs::write(&path, format!("{}\n", REQUIRED_HEADER))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestLimits;
    use crate::ingest::IngestPipeline;

    #[test]
    fn template_reimports_as_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir.path().join("sample")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Unique Code (*)\n");
        let batch = IngestPipeline::new(IngestLimits::default())
            .run_file(&path)
            .unwrap();
        assert!(batch.is_empty());
        assert!(public_path("sample", &path).starts_with("uploads/sample/Unique_Code_Upload_Template_"));
    }
}
