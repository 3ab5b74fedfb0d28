use super::{optional_json, public_path};
use crate::auth::AuthUser;
use crate::error::ServiceError;
use crate::report;
use crate::state::{run_blocking, AppState};
use actix_web::{web, Responder};
use chrono::Utc;
use common::model::coupon::CouponCode;
use common::model::response::GeneratedFile;
use common::requests::DownloadRequest;
use csv::{QuoteStyle, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

const EXPORT_HEADER: [&str; 6] = [
    "Sr No",
    "Date Created",
    "Unique Code",
    "Link Concated Coupon Code",
    "Verified Status",
    "Verified On",
];

pub async fn process(
    state: web::Data<AppState>,
    _user: AuthUser,
    body: web::Bytes,
) -> impl Responder {
    let filter = match optional_json::<DownloadRequest>(&body) {
        Ok(request) => request.and_then(|r| r.filter).unwrap_or_default(),
        Err(e) => return report::respond(report::failure::<GeneratedFile>(&e)),
    };
    let store = state.store.clone();
    let dir = state.config.export_dir();

    let result = run_blocking(move || {
        let rows = store.export_rows(&filter)?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(
                "No records found to export".to_string(),
            ));
        }
        write_export(&dir, &rows)
    })
    .await
    .map(|path| GeneratedFile {
        file_name: public_path("Download_excel", &path),
    });

    report::respond(report::from_result(result, "Downloaded Successfully"))
}

/// Writes `rows` as CSV into `dir` and returns the file path.
pub fn write_export(dir: &Path, rows: &[CouponCode]) -> Result<PathBuf, ServiceError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("couponMaster_{}.csv", Utc::now().timestamp_millis()));
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_path(&path)
        .map_err(csv_error)?;

    writer.write_record(EXPORT_HEADER).map_err(csv_error)?;
    for (idx, row) in rows.iter().enumerate() {
        let status = if row.is_verified() {
            "Verified"
        } else {
            "Not Verified"
        };
        writer
            .write_record([
                (idx + 1).to_string().as_str(),
                row.date_created.as_str(),
                row.unique_code.as_str(),
                row.link_unique_coupon_cc.as_str(),
                status,
                row.verified_on.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(path)
}

fn csv_error(e: csv::Error) -> ServiceError {
    ServiceError::Internal(format!("csv export: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon(id: i64, code: &str, verified_on: Option<&str>) -> CouponCode {
        CouponCode {
            id,
            unique_code: code.to_string(),
            link_unique_coupon_cc: format!("https://l.example/{}", code),
            date_created: "2024-03-01 08:00:00".to_string(),
            verified_flag: u8::from(verified_on.is_some()),
            verified_on: verified_on.map(str::to_string),
            verified_location: None,
        }
    }

    #[test]
    fn export_has_header_serials_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            coupon(2, "B2", Some("2024-03-02 09:00:00")),
            coupon(1, "A1", None),
        ];
        let path = write_export(dir.path(), &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, EXPORT_HEADER);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "1");
        assert_eq!(&records[0][2], "B2");
        assert_eq!(&records[0][4], "Verified");
        assert_eq!(&records[0][5], "2024-03-02 09:00:00");
        assert_eq!(&records[1][0], "2");
        assert_eq!(&records[1][4], "Not Verified");
        assert_eq!(&records[1][5], "");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\r\n"));
        assert!(raw.contains("\"B2\""));
    }
}
