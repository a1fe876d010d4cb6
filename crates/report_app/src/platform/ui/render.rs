use std::fmt::Write;

use report_core::{AppViewModel, BadgeTone, HistoryView, Route, ToastSeverity, UploadView};

use super::constants::*;

/// The whole screen as text, redrawn after every dirty update.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    render_header(&mut out, view);

    match &view.route {
        Route::Login => render_login(&mut out),
        Route::Dashboard => render_dashboard(&mut out, &view.upload),
        Route::History => render_history(&mut out, &view.history),
        Route::NotFound(path) => {
            let _ = writeln!(out, "404: no page at {path}");
            let _ = writeln!(out, "Type `open /` to return home.");
        }
    }

    if !view.toasts.is_empty() {
        out.push('\n');
        for toast in &view.toasts {
            let tag = match toast.severity {
                ToastSeverity::Info => "info",
                ToastSeverity::Error => "error",
            };
            let _ = writeln!(out, "[{tag}] {}: {}", toast.title, toast.description);
        }
    }
    out
}

fn render_header(out: &mut String, view: &AppViewModel) {
    let _ = write!(out, "{APP_TITLE}  {}", view.route);
    if let Some(email) = &view.signed_in_as {
        let _ = write!(out, "  | {email} (logout)");
    }
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
}

fn render_login(out: &mut String) {
    out.push_str("Sign in to upload statements.\n");
    out.push_str("  login <email> <password>\n");
}

fn render_dashboard(out: &mut String, upload: &UploadView) {
    out.push_str("Upload CSE statement\n");
    match (&upload.file_name, upload.uploading) {
        (Some(name), true) => {
            let _ = writeln!(out, "  Uploading {name}...");
        }
        _ => out.push_str("  upload <file.pdf>   (PDF only)\n"),
    }
    out.push_str("  open /history       view past reports\n");
}

fn render_history(out: &mut String, history: &HistoryView) {
    let live = if history.live { "live" } else { "not updating" };
    let _ = writeln!(out, "Report history ({live})");

    if let Some(error) = &history.fetch_error {
        let _ = writeln!(out, "Could not load reports: {error}");
    }
    if history.loading {
        out.push_str("Loading...\n");
        return;
    }
    if history.is_empty {
        out.push_str("No reports available\n");
        return;
    }

    let _ = writeln!(
        out,
        "{:<COL_ROW$}{:<COL_DATE$}{:<COL_STATUS$}{:<COL_DOCS$}",
        "#", "Date", "Status", "Documents"
    );
    for (index, row) in history.rows.iter().enumerate() {
        let mut docs = Vec::new();
        if row.cse_url.is_some() {
            docs.push("cse");
        }
        if row.pnl_url.is_some() {
            docs.push("pnl");
        }
        let docs = if docs.is_empty() {
            "-".to_string()
        } else {
            docs.join(" ")
        };
        let _ = writeln!(
            out,
            "{:<COL_ROW$}{:<COL_DATE$}{:<COL_STATUS$}{:<COL_DOCS$}",
            index + 1,
            row.created_on,
            badge(row.status_label, row.badge),
            docs
        );
    }
}

fn badge(label: &str, tone: BadgeTone) -> String {
    match tone {
        BadgeTone::Warning => format!("{label}~"),
        BadgeTone::Positive => format!("{label}+"),
        BadgeTone::Negative => format!("{label}!"),
    }
}

#[cfg(test)]
mod tests {
    use report_core::{ReportId, ReportRowView, ReportStatus, ToastView};

    use super::*;

    fn row(id: &str, status: ReportStatus, label: &'static str, tone: BadgeTone) -> ReportRowView {
        ReportRowView {
            id: ReportId::new(id),
            created_on: "2024-03-01".to_string(),
            status,
            status_label: label,
            badge: tone,
            cse_url: Some(format!("https://files.example/{id}.pdf")),
            pnl_url: (status == ReportStatus::Success).then(|| "https://files.example/pnl".into()),
        }
    }

    #[test]
    fn login_screen_has_no_account() {
        let text = render(&AppViewModel::default());
        assert!(text.starts_with("CSE Reports  /\n"));
        assert!(text.contains("login <email> <password>"));
        assert!(!text.contains("(logout)"));
    }

    #[test]
    fn history_lists_rows_with_documents() {
        let view = AppViewModel {
            route: Route::History,
            signed_in_as: Some("user@example.com".into()),
            history: HistoryView {
                live: true,
                rows: vec![
                    row("2", ReportStatus::Success, "Success", BadgeTone::Positive),
                    row("1", ReportStatus::Pending, "Pending", BadgeTone::Warning),
                ],
                ..HistoryView::default()
            },
            ..AppViewModel::default()
        };
        let text = render(&view);
        assert!(text.contains("user@example.com (logout)"));
        assert!(text.contains("Report history (live)"));
        let lines: Vec<&str> = text.lines().filter(|l| l.contains("2024-03-01")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1   2024-03-01  Success+"));
        assert!(lines[0].contains("cse pnl"));
        assert!(lines[1].contains("Pending~"));
        assert!(!lines[1].contains("pnl"));
    }

    #[test]
    fn history_states_loading_and_empty() {
        let mut view = AppViewModel {
            route: Route::History,
            history: HistoryView {
                loading: true,
                ..HistoryView::default()
            },
            ..AppViewModel::default()
        };
        assert!(render(&view).contains("Loading..."));

        view.history = HistoryView {
            is_empty: true,
            fetch_error: Some("network error: offline".into()),
            ..HistoryView::default()
        };
        let text = render(&view);
        assert!(text.contains("Could not load reports: network error: offline"));
        assert!(text.contains("No reports available"));
    }

    #[test]
    fn toasts_follow_the_screen() {
        let view = AppViewModel {
            route: Route::NotFound("/nope".into()),
            toasts: vec![ToastView {
                title: "Error".into(),
                description: "Invalid credentials".into(),
                severity: ToastSeverity::Error,
            }],
            ..AppViewModel::default()
        };
        let text = render(&view);
        assert!(text.contains("404: no page at /nope"));
        assert!(text.ends_with("[error] Error: Invalid credentials\n"));
    }
}
