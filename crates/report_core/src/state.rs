use crate::view_model::{
    AppViewModel, BadgeTone, HistoryView, ReportRowView, ToastView, UploadView,
};
use crate::{Effect, Report, ReportDocument, ReportList, ReportStatus, Route, Session, UploadId};

/// Ticks a toast stays visible before `Msg::Tick` removes it.
pub const TOAST_TICKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: ToastSeverity,
    ticks_left: u32,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, ToastSeverity::Info)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, ToastSeverity::Error)
    }

    fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: ToastSeverity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            ticks_left: TOAST_TICKS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum UploadState {
    #[default]
    Idle,
    Uploading {
        upload_id: UploadId,
        file_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    route: Route,
    session: Option<Session>,
    upload: UploadState,
    next_upload_id: UploadId,
    reports: ReportList,
    toasts: Vec<Toast>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.upload, UploadState::Uploading { .. })
    }

    pub fn reports(&self) -> &ReportList {
        &self.reports
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn view(&self) -> AppViewModel {
        let loading = self.reports.is_loading();
        let rows: Vec<ReportRowView> = self.reports.reports().iter().map(row_view).collect();
        AppViewModel {
            route: self.route.clone(),
            signed_in_as: self.session.as_ref().map(|session| session.email.clone()),
            upload: UploadView {
                uploading: self.is_uploading(),
                file_name: match &self.upload {
                    UploadState::Uploading { file_name, .. } => Some(file_name.clone()),
                    UploadState::Idle => None,
                },
            },
            history: HistoryView {
                loading,
                live: self.reports.is_feed_open(),
                fetch_error: self.reports.fetch_error().map(ToOwned::to_owned),
                is_empty: !loading && rows.is_empty(),
                rows,
            },
            toasts: self
                .toasts
                .iter()
                .map(|toast| ToastView {
                    title: toast.title.clone(),
                    description: toast.description.clone(),
                    severity: toast.severity,
                })
                .collect(),
        }
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn reports_mut(&mut self) -> &mut ReportList {
        &mut self.reports
    }

    pub(crate) fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
        self.dirty = true;
    }

    /// Moves to `requested`, redirecting to login when the route needs a
    /// session. Leaving history closes its feed; entering it opens a new one.
    pub(crate) fn navigate(&mut self, requested: Route) -> Vec<Effect> {
        let target = if requested.requires_session() && self.session.is_none() {
            Route::Login
        } else {
            requested
        };
        if target == self.route {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(subscription) = self.reports.deactivate() {
            effects.push(Effect::CloseFeed { subscription });
        }
        if target == Route::History {
            let subscription = self.reports.activate();
            effects.push(Effect::LoadSnapshot { subscription });
            effects.push(Effect::OpenFeed { subscription });
        }
        self.route = target;
        self.dirty = true;
        effects
    }

    pub(crate) fn start_upload(&mut self, file_name: String) -> UploadId {
        self.next_upload_id += 1;
        let upload_id = self.next_upload_id;
        self.upload = UploadState::Uploading {
            upload_id,
            file_name,
        };
        self.dirty = true;
        upload_id
    }

    /// Clears the in-flight upload if `upload_id` is the current one.
    pub(crate) fn finish_upload(&mut self, upload_id: UploadId) -> bool {
        match self.upload {
            UploadState::Uploading { upload_id: current, .. } if current == upload_id => {
                self.upload = UploadState::Idle;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Forgets any in-flight upload so its late result is discarded.
    pub(crate) fn abandon_upload(&mut self) {
        if self.is_uploading() {
            self.upload = UploadState::Idle;
            self.dirty = true;
        }
    }

    pub(crate) fn push_toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
        self.dirty = true;
    }

    pub(crate) fn age_toasts(&mut self) {
        let before = self.toasts.len();
        for toast in &mut self.toasts {
            toast.ticks_left = toast.ticks_left.saturating_sub(1);
        }
        self.toasts.retain(|toast| toast.ticks_left > 0);
        if self.toasts.len() != before {
            self.dirty = true;
        }
    }
}

fn row_view(report: &Report) -> ReportRowView {
    let (status_label, badge) = match report.status {
        ReportStatus::Pending => ("Pending", BadgeTone::Warning),
        ReportStatus::Success => ("Success", BadgeTone::Positive),
        ReportStatus::Error => ("Error", BadgeTone::Negative),
    };
    ReportRowView {
        id: report.id.clone(),
        created_on: report.created_at.date_naive().to_string(),
        status: report.status,
        status_label,
        badge,
        cse_url: report
            .document_url(ReportDocument::CseStatement)
            .map(ToOwned::to_owned),
        pnl_url: report
            .document_url(ReportDocument::PnlReport)
            .map(ToOwned::to_owned),
    }
}
