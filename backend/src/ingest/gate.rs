//! Persists a parsed batch: existing-code partition, then a conflict-tolerant
//! bulk insert.

use crate::error::ServiceError;
use crate::ingest::pipeline::ParsedBatch;
use crate::store::timestamp_now;
use common::model::link_config::DynamicLinkConfig;
use common::model::upload::UploadSummary;
use log::info;
use std::collections::HashSet;

/// A coupon row ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub unique_code: String,
    pub link: String,
    pub created_at: String,
}

/// Storage operations the gate relies on.
pub trait CouponRepository {
    /// The single active link configuration, if any.
    fn active_link_config(&self) -> Result<Option<DynamicLinkConfig>, ServiceError>;

    /// Which of `codes` are already stored, in one lookup.
    fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>, ServiceError>;

    /// Inserts all rows in one transaction, silently skipping rows whose code
    /// is already taken. Returns how many rows were actually written.
    fn insert_new_codes(&self, rows: &[NewCoupon]) -> Result<usize, ServiceError>;
}

pub struct PersistenceGate<'a, S: CouponRepository + ?Sized> {
    store: &'a S,
}

impl<'a, S: CouponRepository + ?Sized> PersistenceGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn commit(&self, batch: &ParsedBatch) -> Result<UploadSummary, ServiceError> {
        let config = self
            .store
            .active_link_config()?
            .ok_or(ServiceError::ConfigMissing)?;

        let existing = self.store.existing_codes(&batch.codes)?;
        let created_at = timestamp_now();
        let fresh: Vec<NewCoupon> = batch
            .codes
            .iter()
            .filter(|code| !existing.contains(*code))
            .map(|code| NewCoupon {
                unique_code: code.clone(),
                link: config.link_for(code),
                created_at: created_at.clone(),
            })
            .collect();

        let inserted = if fresh.is_empty() {
            0
        } else {
            self.store.insert_new_codes(&fresh)?
        };
        if inserted < fresh.len() {
            info!(
                "{} codes were taken by a concurrent upload",
                fresh.len() - inserted
            );
        }

        Ok(UploadSummary {
            total_processed: batch.len(),
            new_codes_added: inserted,
            duplicates_skipped: existing.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory stand-in that can simulate a racing writer.
    #[derive(Default)]
    struct MemoryStore {
        config: Option<DynamicLinkConfig>,
        stored: RefCell<Vec<NewCoupon>>,
        lookups: RefCell<usize>,
        stolen_on_insert: Vec<String>,
    }

    impl CouponRepository for MemoryStore {
        fn active_link_config(&self) -> Result<Option<DynamicLinkConfig>, ServiceError> {
            Ok(self.config.clone())
        }

        fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>, ServiceError> {
            *self.lookups.borrow_mut() += 1;
            Ok(self
                .stored
                .borrow()
                .iter()
                .filter(|c| codes.contains(&c.unique_code))
                .map(|c| c.unique_code.clone())
                .collect())
        }

        fn insert_new_codes(&self, rows: &[NewCoupon]) -> Result<usize, ServiceError> {
            let mut stored = self.stored.borrow_mut();
            let mut inserted = 0;
            for row in rows {
                let taken = self.stolen_on_insert.contains(&row.unique_code)
                    || stored.iter().any(|c| c.unique_code == row.unique_code);
                if !taken {
                    stored.push(row.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        }
    }

    fn config() -> Option<DynamicLinkConfig> {
        Some(DynamicLinkConfig {
            id: 1,
            coupon_link: "https://go.example/c/".to_string(),
        })
    }

    fn batch(codes: &[&str]) -> ParsedBatch {
        ParsedBatch {
            codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn missing_config_aborts_before_lookup() {
        let store = MemoryStore::default();
        let err = PersistenceGate::new(&store).commit(&batch(&["A"])).unwrap_err();
        assert!(matches!(err, ServiceError::ConfigMissing));
        assert_eq!(*store.lookups.borrow(), 0);
        assert!(store.stored.borrow().is_empty());
    }

    #[test]
    fn new_codes_get_prefixed_links() {
        let store = MemoryStore {
            config: config(),
            ..Default::default()
        };
        let summary = PersistenceGate::new(&store).commit(&batch(&["A1", "B2"])).unwrap();
        assert_eq!(
            summary,
            UploadSummary {
                total_processed: 2,
                new_codes_added: 2,
                duplicates_skipped: 0
            }
        );
        let stored = store.stored.borrow();
        assert_eq!(stored[0].link, "https://go.example/c/A1");
        assert_eq!(stored[1].link, "https://go.example/c/B2");
        assert_eq!(*store.lookups.borrow(), 1);
    }

    #[test]
    fn second_upload_skips_everything() {
        let store = MemoryStore {
            config: config(),
            ..Default::default()
        };
        let gate = PersistenceGate::new(&store);
        gate.commit(&batch(&["A1", "B2", "C3"])).unwrap();
        let again = gate.commit(&batch(&["A1", "B2", "C3"])).unwrap();
        assert_eq!(again.new_codes_added, 0);
        assert_eq!(again.duplicates_skipped, 3);
        assert_eq!(store.stored.borrow().len(), 3);
    }

    #[test]
    fn insert_time_conflicts_only_reduce_added() {
        let store = MemoryStore {
            config: config(),
            stolen_on_insert: vec!["RACE".to_string()],
            ..Default::default()
        };
        store.stored.borrow_mut().push(NewCoupon {
            unique_code: "OLD".to_string(),
            link: "x".to_string(),
            created_at: "t".to_string(),
        });
        let summary = PersistenceGate::new(&store)
            .commit(&batch(&["OLD", "RACE", "NEW"]))
            .unwrap();
        assert_eq!(summary.total_processed, 3);
        assert_eq!(summary.new_codes_added, 1);
        assert_eq!(summary.duplicates_skipped, 1);
    }
}
