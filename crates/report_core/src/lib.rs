//! Report core: domain records, the report list synchronizer, and the pure
//! state machine behind the login, dashboard and history screens.
mod change;
mod effect;
mod msg;
mod report;
mod route;
mod session;
mod state;
mod sync;
mod update;
mod upload;
mod view_model;

pub use change::{ChangeEvent, ChangeKind};
pub use effect::Effect;
pub use msg::Msg;
pub use report::{NewReport, Report, ReportDocument, ReportId, ReportStatus};
pub use route::Route;
pub use session::{sign_in, Session, DEMO_EMAIL, DEMO_PASSWORD};
pub use state::{AppState, Toast, ToastSeverity, TOAST_TICKS};
pub use sync::{ReportList, SubscriptionId};
pub use update::update;
pub use upload::{validate_upload, UploadFile, UploadId, ValidationError, PDF_MEDIA_TYPE};
pub use view_model::{AppViewModel, BadgeTone, HistoryView, ReportRowView, ToastView, UploadView};
