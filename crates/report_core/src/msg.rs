use crate::{
    ChangeEvent, Report, ReportDocument, ReportId, Route, SubscriptionId, UploadFile, UploadId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked for a path (header link, navigation button, typed address).
    Navigate(Route),
    /// User submitted the login form.
    LoginSubmitted { email: String, password: String },
    /// User clicked Sign out in the header.
    SignOutClicked,
    /// User dropped or picked a file on the dashboard.
    FileChosen(UploadFile),
    /// The platform could not read the chosen file.
    FileUnreadable { name: String, reason: String },
    /// Engine finished storing and recording an upload.
    UploadFinished {
        upload_id: UploadId,
        result: Result<ReportId, String>,
    },
    /// Engine finished the bulk read for a subscription.
    SnapshotLoaded {
        subscription: SubscriptionId,
        result: Result<Vec<Report>, String>,
    },
    /// Engine delivered a change-feed event.
    ChangeReceived {
        subscription: SubscriptionId,
        event: ChangeEvent,
    },
    /// Engine reports the change feed stopped.
    FeedClosed {
        subscription: SubscriptionId,
        reason: Option<String>,
    },
    /// User clicked a download button in the history table.
    DownloadRequested {
        id: ReportId,
        document: ReportDocument,
    },
    /// Periodic tick that ages transient notifications.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
