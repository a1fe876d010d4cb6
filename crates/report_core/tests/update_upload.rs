use std::sync::Once;

use chrono::{TimeZone, Utc};
use report_core::{
    update, AppState, BadgeTone, ChangeEvent, Effect, Msg, Report, ReportDocument, ReportId,
    ReportStatus, Route, ToastSeverity, UploadFile, DEMO_EMAIL, DEMO_PASSWORD,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(report_logging::initialize_for_tests);
}

fn signed_in() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::LoginSubmitted {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        },
    );
    state
}

fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, "application/pdf", b"%PDF-1.7 statement".to_vec())
}

fn pending_report(id: &str) -> Report {
    Report {
        id: ReportId::new(id),
        created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
        status: ReportStatus::Pending,
        cse_report: format!("https://storage.example.com/{id}.pdf"),
        pl_report: None,
    }
}

#[test]
fn non_pdf_is_rejected_without_effects() {
    init_logging();
    let file = UploadFile::new("photo.png", "image/png", vec![0x89, 0x50]);

    let (state, effects) = update(signed_in(), Msg::FileChosen(file));

    assert!(effects.is_empty());
    assert!(!state.is_uploading());
    let toast = state.view().toasts.last().cloned().unwrap();
    assert_eq!(toast.title, "Invalid file type");
    assert_eq!(toast.description, "Please upload a PDF file");
    assert_eq!(toast.severity, ToastSeverity::Error);
}

#[test]
fn pdf_starts_exactly_one_upload() {
    init_logging();
    let file = pdf("march.pdf");

    let (state, effects) = update(signed_in(), Msg::FileChosen(file.clone()));

    assert_eq!(effects, vec![Effect::SubmitUpload { upload_id: 1, file }]);
    let view = state.view();
    assert!(view.upload.uploading);
    assert_eq!(view.upload.file_name.as_deref(), Some("march.pdf"));

    // A second file while uploading is ignored.
    let (state, effects) = update(state, Msg::FileChosen(pdf("april.pdf")));
    assert!(effects.is_empty());
    assert_eq!(state.view().upload.file_name.as_deref(), Some("march.pdf"));
}

#[test]
fn files_outside_dashboard_are_ignored() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::FileChosen(pdf("a.pdf")));
    assert!(effects.is_empty());
    assert!(!state.is_uploading());
}

#[test]
fn successful_upload_navigates_to_history_without_local_insert() {
    init_logging();
    let (state, _) = update(signed_in(), Msg::FileChosen(pdf("march.pdf")));

    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Ok(ReportId::new("r-1")),
        },
    );

    assert_eq!(*state.route(), Route::History);
    assert!(!state.is_uploading());
    assert_eq!(
        effects,
        vec![
            Effect::LoadSnapshot { subscription: 1 },
            Effect::OpenFeed { subscription: 1 },
        ]
    );
    assert!(state.reports().is_empty());
    assert_eq!(
        state.view().toasts.last().map(|t| t.description.as_str()),
        Some("Report uploaded successfully")
    );

    // The row arrives through the feed.
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            subscription: 1,
            result: Ok(Vec::new()),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChangeReceived {
            subscription: 1,
            event: ChangeEvent::Insert(pending_report("r-1")),
        },
    );
    let rows = state.view().history.rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_label, "Pending");
    assert_eq!(rows[0].badge, BadgeTone::Warning);
    assert_eq!(rows[0].created_on, "2024-03-15");
    assert_eq!(rows[0].pnl_url, None);
}

#[test]
fn failed_upload_surfaces_message_and_stays() {
    init_logging();
    let (state, _) = update(signed_in(), Msg::FileChosen(pdf("march.pdf")));

    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Err("storage upload failed: http status 413".to_string()),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.route(), Route::Dashboard);
    assert!(!state.is_uploading());
    let toast = state.view().toasts.last().cloned().unwrap();
    assert_eq!(toast.severity, ToastSeverity::Error);
    assert_eq!(toast.description, "storage upload failed: http status 413");
}

#[test]
fn upload_result_after_sign_out_is_discarded() {
    init_logging();
    let (state, _) = update(signed_in(), Msg::FileChosen(pdf("march.pdf")));
    let (state, _) = update(state, Msg::SignOutClicked);

    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            upload_id: 1,
            result: Ok(ReportId::new("r-1")),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(*state.route(), Route::Login);
}

#[test]
fn unreadable_file_shows_error() {
    init_logging();
    let (state, effects) = update(
        signed_in(),
        Msg::FileUnreadable {
            name: "missing.pdf".to_string(),
            reason: "not found".to_string(),
        },
    );
    assert!(effects.is_empty());
    let toast = state.view().toasts.last().cloned().unwrap();
    assert_eq!(toast.description, "missing.pdf: not found");
}

#[test]
fn download_opens_only_present_documents() {
    init_logging();
    let (state, _) = update(signed_in(), Msg::Navigate(Route::History));
    let mut done = pending_report("r-9");
    done.status = ReportStatus::Success;
    done.pl_report = Some("https://storage.example.com/pnl-9.pdf".to_string());
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            subscription: 1,
            result: Ok(vec![done, pending_report("r-8")]),
        },
    );

    let (state, effects) = update(
        state,
        Msg::DownloadRequested {
            id: ReportId::new("r-9"),
            document: ReportDocument::PnlReport,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenUrl {
            url: "https://storage.example.com/pnl-9.pdf".to_string()
        }]
    );

    let (state, effects) = update(
        state,
        Msg::DownloadRequested {
            id: ReportId::new("r-8"),
            document: ReportDocument::PnlReport,
        },
    );
    assert!(effects.is_empty());

    let (_state, effects) = update(
        state,
        Msg::DownloadRequested {
            id: ReportId::new("r-8"),
            document: ReportDocument::CseStatement,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenUrl {
            url: "https://storage.example.com/r-8.pdf".to_string()
        }]
    );
}

#[test]
fn history_view_reflects_loading_empty_and_feed_state() {
    init_logging();
    let (state, _) = update(signed_in(), Msg::Navigate(Route::History));
    assert!(state.view().history.loading);
    assert!(state.view().history.live);

    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            subscription: 1,
            result: Err("timeout".to_string()),
        },
    );
    let history = state.view().history;
    assert!(!history.loading);
    assert!(history.is_empty);
    assert_eq!(history.fetch_error.as_deref(), Some("timeout"));

    let (state, _) = update(
        state,
        Msg::FeedClosed {
            subscription: 1,
            reason: Some("eof".to_string()),
        },
    );
    assert!(!state.view().history.live);
}
