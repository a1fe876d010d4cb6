mod app;
mod effects;
mod files;
mod input;
mod logging;
mod ui;

pub use app::run_app;
