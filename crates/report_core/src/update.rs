use report_logging::{report_debug, report_info, report_warn};

use crate::state::Toast;
use crate::{
    session, validate_upload, AppState, Effect, Msg, ReportDocument, ReportId, Route, UploadFile,
    UploadId,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Navigate(route) => state.navigate(route),
        Msg::LoginSubmitted { email, password } => match session::sign_in(&email, &password) {
            Some(session) => {
                report_info!("signed in as {}", session.email);
                state.set_session(Some(session));
                state.push_toast(Toast::info("Welcome back!", "Successfully logged in."));
                state.navigate(Route::Dashboard)
            }
            None => {
                report_warn!("rejected sign-in attempt for {:?}", email.trim());
                state.push_toast(Toast::error("Error", "Invalid credentials"));
                Vec::new()
            }
        },
        Msg::SignOutClicked => {
            if state.session().is_none() {
                return (state, Vec::new());
            }
            state.set_session(None);
            state.abandon_upload();
            state.navigate(Route::Login)
        }
        Msg::FileChosen(file) => file_chosen(&mut state, file),
        Msg::FileUnreadable { name, reason } => {
            state.push_toast(Toast::error("Could not read file", format!("{name}: {reason}")));
            Vec::new()
        }
        Msg::UploadFinished { upload_id, result } => {
            upload_finished(&mut state, upload_id, result)
        }
        Msg::SnapshotLoaded {
            subscription,
            result,
        } => {
            if state.reports_mut().apply_snapshot(subscription, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChangeReceived {
            subscription,
            event,
        } => {
            if state.reports_mut().apply_change(subscription, event) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FeedClosed {
            subscription,
            reason,
        } => {
            if state
                .reports_mut()
                .feed_closed(subscription, reason.as_deref())
            {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DownloadRequested { id, document } => download(&state, &id, document),
        Msg::Tick => {
            state.age_toasts();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn file_chosen(state: &mut AppState, file: UploadFile) -> Vec<Effect> {
    if *state.route() != Route::Dashboard {
        report_debug!("ignoring file {:?} outside the dashboard", file.name);
        return Vec::new();
    }
    if state.is_uploading() {
        report_debug!("ignoring file {:?} while an upload is running", file.name);
        return Vec::new();
    }
    if let Err(err) = validate_upload(&file) {
        report_warn!("rejected upload {:?}: {}", file.name, err);
        state.push_toast(Toast::error("Invalid file type", "Please upload a PDF file"));
        return Vec::new();
    }

    let upload_id = state.start_upload(file.name.clone());
    report_info!(
        "submitting upload_id={} name={:?} bytes={}",
        upload_id,
        file.name,
        file.bytes.len()
    );
    vec![Effect::SubmitUpload { upload_id, file }]
}

fn upload_finished(
    state: &mut AppState,
    upload_id: UploadId,
    result: Result<ReportId, String>,
) -> Vec<Effect> {
    if !state.finish_upload(upload_id) {
        report_debug!("discarding result for stale upload_id={upload_id}");
        return Vec::new();
    }
    match result {
        Ok(id) => {
            // The row itself shows up through the change feed.
            report_info!("upload_id={upload_id} recorded as report {id}");
            state.push_toast(Toast::info("Success", "Report uploaded successfully"));
            state.navigate(Route::History)
        }
        Err(message) => {
            state.push_toast(Toast::error("Error", message));
            Vec::new()
        }
    }
}

fn download(state: &AppState, id: &ReportId, document: ReportDocument) -> Vec<Effect> {
    if *state.route() != Route::History {
        return Vec::new();
    }
    match state
        .reports()
        .get(id)
        .and_then(|report| report.document_url(document))
    {
        Some(url) => vec![Effect::OpenUrl {
            url: url.to_string(),
        }],
        None => {
            report_debug!("no {document:?} to download for report {id}");
            Vec::new()
        }
    }
}
