//! Streaming CSV parse of an uploaded coupon file.
//!
//! Rows are pulled lazily from a `csv::Reader` through [`CodeRows`]; only the
//! current record is held in memory besides the accepted codes themselves.
//! The pipeline is fail-fast: the first structural problem, rule violation,
//! row-limit breach or deadline expiry rejects the whole file.

use crate::config::{IngestLimits, REQUIRED_HEADER};
use crate::error::{RowRejection, ServiceError};
use crate::ingest::dedup::Deduplicator;
use crate::ingest::validator::CodeValidator;
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Distinct, validated codes of one upload, in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    pub codes: Vec<String>,
}

impl ParsedBatch {
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Lazy sequence of `(row_number, code_cell)` pairs from a CSV body.
///
/// Row numbers count the header as row 1, so the first data row is row 2.
/// Finite and not restartable.
pub struct CodeRows<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
    row: usize,
}

impl<R: Read> CodeRows<R> {
    /// Reads and checks the header, leaving the reader on the first data row.
    pub fn open(input: R) -> Result<Self, ServiceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers().map_err(parse_error)?;
        let actual = normalize_header(headers);
        if actual.is_empty() {
            return Err(ServiceError::Structural(
                "CSV file is empty or has no headers".to_string(),
            ));
        }
        if actual != REQUIRED_HEADER {
            return Err(ServiceError::Structural(format!(
                "Invalid CSV header. Expected '{}', but found '{}'",
                REQUIRED_HEADER, actual
            )));
        }

        Ok(Self {
            reader,
            record: StringRecord::new(),
            row: 1,
        })
    }
}

impl<R: Read> Iterator for CodeRows<R> {
    type Item = Result<(usize, String), ServiceError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.row += 1;
                let cell = self.record.get(0).unwrap_or_default().to_string();
                Some(Ok((self.row, cell)))
            }
            Ok(false) => None,
            Err(e) => Some(Err(parse_error(e))),
        }
    }
}

/// Strips the BOM and surrounding whitespace, and drops trailing empty cells
/// left by a dangling delimiter. Remaining cells are rejoined so an extra
/// column still shows up as a mismatch.
fn normalize_header(headers: &StringRecord) -> String {
    let mut cells: Vec<&str> = headers
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if i == 0 {
                cell.trim_start_matches('\u{FEFF}').trim()
            } else {
                cell.trim()
            }
        })
        .collect();
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells.join(",")
}

fn parse_error(e: csv::Error) -> ServiceError {
    debug!("csv parse failure: {}", e);
    ServiceError::Structural("CSV parsing error".to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct IngestPipeline {
    limits: IngestLimits,
    validator: CodeValidator,
}

impl IngestPipeline {
    pub fn new(limits: IngestLimits) -> Self {
        Self {
            limits,
            validator: CodeValidator::new(limits.max_code_len),
        }
    }

    /// Opens `path` and parses it. The file handle is dropped on every exit
    /// path, including timeout and rejection.
    pub fn run_file(&self, path: &Path) -> Result<ParsedBatch, ServiceError> {
        let file = File::open(path).map_err(|e| {
            debug!("cannot open upload {}: {}", path.display(), e);
            ServiceError::BadRequest("File not found".to_string())
        })?;
        self.run(file)
    }

    pub fn run<R: Read>(&self, input: R) -> Result<ParsedBatch, ServiceError> {
        self.run_until(input, Instant::now() + self.limits.parse_timeout)
    }

    /// Parses `input`, giving up once `deadline` has passed. The deadline is
    /// checked before every row.
    pub fn run_until<R: Read>(
        &self,
        input: R,
        deadline: Instant,
    ) -> Result<ParsedBatch, ServiceError> {
        let rows = CodeRows::open(input)?;
        let mut dedup = Deduplicator::new();
        let mut batch = ParsedBatch::default();
        let mut data_rows = 0usize;

        for item in rows {
            if Instant::now() >= deadline {
                return Err(ServiceError::ParseTimeout);
            }
            let (row, cell) = item?;
            data_rows += 1;
            if data_rows > self.limits.max_rows {
                return Err(ServiceError::RowLimitExceeded {
                    max: self.limits.max_rows,
                });
            }

            let code = self
                .validator
                .validate(&cell)
                .map_err(|reason| ServiceError::Validation { row, reason })?;
            if dedup.seen(&code) {
                return Err(ServiceError::Validation {
                    row,
                    reason: RowRejection::Duplicate { code },
                });
            }
            dedup.add(&code);
            batch.codes.push(code);
        }

        Ok(batch)
    }
}
