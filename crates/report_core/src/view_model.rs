use crate::{ReportId, ReportStatus, Route, ToastSeverity};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub route: Route,
    pub signed_in_as: Option<String>,
    pub upload: UploadView,
    pub history: HistoryView,
    pub toasts: Vec<ToastView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadView {
    pub uploading: bool,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryView {
    pub loading: bool,
    /// The change feed is still delivering.
    pub live: bool,
    pub fetch_error: Option<String>,
    pub rows: Vec<ReportRowView>,
    /// Nothing to show and nothing loading.
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRowView {
    pub id: ReportId,
    pub created_on: String,
    pub status: ReportStatus,
    pub status_label: &'static str,
    pub badge: BadgeTone,
    pub cse_url: Option<String>,
    pub pnl_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Warning,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub title: String,
    pub description: String,
    pub severity: ToastSeverity,
}
