//! Sequential batch driver: CSV in, one PDF and one notification per row out.
//!
//! Records are processed strictly one after another. A failing record is
//! logged with its index and skipped; the batch always runs to the end.

use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

use crate::notify::Notifier;
use crate::pdf::Generator;
use crate::record::{load_records, InspectionRecord};

pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_millis(1200);

/// Spacing applied after every notification to stay under the provider's
/// send-rate limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub const fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub const fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::fixed(DEFAULT_NOTIFY_DELAY)
    }
}

/// What happened to each record of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    /// Paths of the written documents, in record order.
    pub documents: Vec<PathBuf>,
    /// Indices of records whose document could not be produced.
    pub failed: Vec<usize>,
    pub notified: usize,
    pub notify_failed: usize,
}

impl BatchReport {
    pub fn generated(&self) -> usize {
        self.documents.len()
    }
}

pub struct BatchDriver {
    generator: Box<dyn Generator + Send + Sync>,
    notifier: Box<dyn Notifier + Send + Sync>,
    throttle: Throttle,
}

impl BatchDriver {
    pub fn new(
        generator: Box<dyn Generator + Send + Sync>,
        notifier: Box<dyn Notifier + Send + Sync>,
        throttle: Throttle,
    ) -> Self {
        Self {
            generator,
            notifier,
            throttle,
        }
    }

    /// Load every record from `csv_path`, then process them in order.
    pub async fn run(&self, csv_path: &Path) -> BatchReport {
        let records = match load_records(csv_path) {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load records from {}: {}", csv_path.display(), e);
                return BatchReport::default();
            }
        };
        log::info!("Loaded {} records from {}", records.len(), csv_path.display());
        self.process(&records).await
    }

    pub async fn process(&self, records: &[InspectionRecord]) -> BatchReport {
        let run_id = Uuid::new_v4();
        log::info!("Batch {} started with {} records", run_id, records.len());

        let mut report = BatchReport {
            total: records.len(),
            ..BatchReport::default()
        };

        for (index, record) in records.iter().enumerate() {
            let document = match self.generator.generate(record, index) {
                Ok(document) => document,
                Err(e) => {
                    log::error!("Error creating PDF for entry: {} {}", index, e);
                    report.failed.push(index);
                    continue;
                }
            };
            log::info!("Entry {} written to {}", index, document.path.display());

            match self.notifier.notify(&document).await {
                Ok(_) => report.notified += 1,
                Err(e) => {
                    log::error!("Failed to notify for entry {} ({}): {}", index, document.filename, e);
                    report.notify_failed += 1;
                }
            }
            report.documents.push(document.path);

            self.throttle.pause().await;
        }

        log::info!(
            "All PDFs processed. Batch {}: {} generated, {} failed, {} notified, {} notification failures",
            run_id,
            report.generated(),
            report.failed.len(),
            report.notified,
            report.notify_failed
        );
        report
    }
}
