use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use report_core::{update, AppState, Msg};
use report_engine::{Backend, EngineHandle, RemoteSettings};
use report_logging::{report_error, report_info};

use super::effects::EffectRunner;
use super::files::{display_name, read_upload};
use super::input::{parse_command, Command};
use super::logging;
use super::ui::constants::{HELP_TEXT, PROMPT};
use super::ui::render::render;

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Everything the main loop reacts to, in arrival order.
pub enum AppEvent {
    Msg(Msg),
    Line(String),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    logging::initialize();

    let settings = RemoteSettings::from_env().context("reading backend settings")?;
    report_info!(
        "Starting against {} (bucket {}, table {})",
        settings.base_url,
        settings.bucket,
        settings.table
    );
    let backend = Backend::remote(settings).context("setting up backend clients")?;
    let engine = EngineHandle::new(backend).context("starting engine")?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(engine, event_tx.clone());
    spawn_stdin_reader(event_tx.clone());
    spawn_ticker(event_tx);

    let mut state = AppState::new();
    print_screen(&state);

    while let Ok(event) = event_rx.recv() {
        let msg = match event {
            AppEvent::Msg(msg) => msg,
            AppEvent::Line(line) => match handle_line(&state, &line) {
                LineOutcome::Dispatch(msg) => msg,
                LineOutcome::Print(text) => {
                    println!("{text}");
                    prompt();
                    continue;
                }
                LineOutcome::Quit => break,
                LineOutcome::Nothing => {
                    prompt();
                    continue;
                }
            },
            AppEvent::InputClosed => break,
        };

        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);
        if state.consume_dirty() {
            print_screen(&state);
        }
    }

    // Leaving with the history open still closes its feed.
    let (_, effects) = update(state, Msg::SignOutClicked);
    runner.run(effects);
    runner.shutdown();
    report_info!("Shutting down");
    Ok(())
}

enum LineOutcome {
    Dispatch(Msg),
    Print(String),
    Quit,
    Nothing,
}

fn handle_line(state: &AppState, line: &str) -> LineOutcome {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return LineOutcome::Nothing,
        Err(err) => return LineOutcome::Print(err.to_string()),
    };

    match command {
        Command::Login { email, password } => {
            LineOutcome::Dispatch(Msg::LoginSubmitted { email, password })
        }
        Command::Logout => LineOutcome::Dispatch(Msg::SignOutClicked),
        Command::Open(route) => LineOutcome::Dispatch(Msg::Navigate(route)),
        Command::Upload(path) => match read_upload(&path) {
            Ok(file) => LineOutcome::Dispatch(Msg::FileChosen(file)),
            Err(err) => {
                report_error!("Reading {} failed: {err}", path.display());
                LineOutcome::Dispatch(Msg::FileUnreadable {
                    name: display_name(&path),
                    reason: err.to_string(),
                })
            }
        },
        Command::Download { row, document } => {
            match state.reports().reports().get(row - 1) {
                Some(report) => LineOutcome::Dispatch(Msg::DownloadRequested {
                    id: report.id.clone(),
                    document,
                }),
                None => LineOutcome::Print(format!("No report in row {row}")),
            }
        }
        Command::Help => LineOutcome::Print(HELP_TEXT.to_string()),
        Command::Quit => LineOutcome::Quit,
    }
}

fn print_screen(state: &AppState) {
    println!("\n{}", render(&state.view()));
    prompt();
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

fn spawn_stdin_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if event_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

fn spawn_ticker(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        while event_tx.send(AppEvent::Msg(Msg::Tick)).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
}
