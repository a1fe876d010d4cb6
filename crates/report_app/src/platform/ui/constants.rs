pub const APP_TITLE: &str = "CSE Reports";
pub const PROMPT: &str = "> ";
pub const RULE_WIDTH: usize = 72;

pub const COL_ROW: usize = 4;
pub const COL_DATE: usize = 12;
pub const COL_STATUS: usize = 10;
pub const COL_DOCS: usize = 14;

pub const HELP_TEXT: &str = "\
Commands:
  login <email> <password>   sign in
  logout                     sign out
  open <path>                go to /, /dashboard or /history
  upload <file>              submit a PDF statement (dashboard)
  download <row> cse|pnl     open a document from the history table
  help                       show this text
  quit                       leave";
