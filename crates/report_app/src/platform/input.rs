use std::path::PathBuf;

use report_core::{ReportDocument, Route};
use thiserror::Error;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Open(Route),
    Upload(PathBuf),
    /// `row` is 1-based, as printed in the history table.
    Download { row: usize, document: ReportDocument },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command {0:?}; type `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let line = line.trim();
    let Some((word, rest)) = split_word(line) else {
        return Ok(None);
    };
    let rest = rest.trim();

    let command = match word.to_ascii_lowercase().as_str() {
        "login" => {
            let (email, password) = split_word(rest)
                .map(|(email, password)| (email, password.trim()))
                .filter(|(_, password)| !password.is_empty())
                .ok_or(InputError::Usage("login <email> <password>"))?;
            Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            }
        }
        "logout" | "signout" => Command::Logout,
        "open" | "go" => {
            if rest.is_empty() {
                return Err(InputError::Usage("open <path>"));
            }
            Command::Open(Route::parse(rest))
        }
        "upload" => {
            if rest.is_empty() {
                return Err(InputError::Usage("upload <file>"));
            }
            Command::Upload(PathBuf::from(unquote(rest)))
        }
        "download" => parse_download(rest)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_download(rest: &str) -> Result<Command, InputError> {
    const USAGE: &str = "download <row> cse|pnl";
    let mut parts = rest.split_whitespace();
    let row = parts
        .next()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|row| *row > 0)
        .ok_or(InputError::Usage(USAGE))?;
    let document = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("cse") => ReportDocument::CseStatement,
        Some("pnl") | Some("pl") => ReportDocument::PnlReport,
        _ => return Err(InputError::Usage(USAGE)),
    };
    if parts.next().is_some() {
        return Err(InputError::Usage(USAGE));
    }
    Ok(Command::Download { row, document })
}

fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    Some(match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (input, ""),
    })
}

fn unquote(input: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = input
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    input
}
