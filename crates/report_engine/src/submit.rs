use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use report_core::{validate_upload, NewReport, Report, UploadFile, PDF_MEDIA_TYPE};
use report_logging::{report_debug, report_info, report_warn};

use crate::storage_key::storage_key;
use crate::{ObjectStore, ReportTable, SubmitError, UploadError, UploadStage};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Stores a statement, then records a pending report pointing at it.
#[derive(Clone)]
pub struct UploadSubmitter {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn ReportTable>,
    clock: Clock,
}

impl UploadSubmitter {
    pub fn new(store: Arc<dyn ObjectStore>, table: Arc<dyn ReportTable>) -> Self {
        Self::with_clock(store, table, Arc::new(Utc::now))
    }

    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn ReportTable>,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            table,
            clock,
        }
    }

    /// Validation runs before any remote call. A failed insert leaves the
    /// stored object in place.
    pub async fn submit(&self, file: UploadFile) -> Result<Report, SubmitError> {
        validate_upload(&file)?;

        let key = storage_key(&file.name, &file.bytes, (self.clock)());
        report_debug!("Uploading {} ({} bytes) as {key}", file.name, file.bytes.len());
        let bytes = Bytes::from(file.bytes);
        self.store
            .put(&key, bytes, PDF_MEDIA_TYPE)
            .await
            .map_err(|source| UploadError {
                stage: UploadStage::Storage,
                source,
            })?;

        let public_url = self.store.public_url(&key).map_err(|source| UploadError {
            stage: UploadStage::Storage,
            source,
        })?;

        let report = self
            .table
            .insert(&NewReport::pending(public_url))
            .await
            .map_err(|source| {
                report_warn!("Report insert failed; object {key} stays in storage");
                UploadError {
                    stage: UploadStage::Insert,
                    source,
                }
            })?;

        report_info!("Report {} created for {}", report.id, file.name);
        Ok(report)
    }
}
