use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier assigned by the remote table on insert.
///
/// Remote tables may key rows by integer or by uuid; both decode into the
/// same string form so equality is stable across the snapshot and the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for ReportId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ReportId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(value) => ReportId(value.to_string()),
            RawId::Text(value) => ReportId(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Success,
    Error,
}

impl ReportStatus {
    /// Position in the lifecycle. Status only ever moves forward, so a lower
    /// rank is an older observation of the same record.
    pub fn rank(self) -> u8 {
        match self {
            ReportStatus::Pending => 0,
            ReportStatus::Success | ReportStatus::Error => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Success => "success",
            ReportStatus::Error => "error",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded CSE statement and, once processed, its PnL report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ReportStatus,
    pub cse_report: String,
    #[serde(default)]
    pub pl_report: Option<String>,
}

impl Report {
    pub fn document_url(&self, document: ReportDocument) -> Option<&str> {
        match document {
            ReportDocument::CseStatement => {
                Some(self.cse_report.as_str()).filter(|url| !url.is_empty())
            }
            ReportDocument::PnlReport => self.pl_report.as_deref().filter(|url| !url.is_empty()),
        }
    }
}

/// Insert payload for a freshly uploaded statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReport {
    pub status: ReportStatus,
    pub cse_report: String,
}

impl NewReport {
    pub fn pending(cse_report: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Pending,
            cse_report: cse_report.into(),
        }
    }
}

/// The downloadable documents attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDocument {
    CseStatement,
    PnlReport,
}
