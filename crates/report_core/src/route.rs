use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Login,
    Dashboard,
    History,
    /// Catch-all for any other path.
    NotFound(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.trim();
        let normalized = match path.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        match normalized {
            "/" => Route::Login,
            "/dashboard" => Route::Dashboard,
            "/history" => Route::History,
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::History => "/history",
            Route::NotFound(path) => path,
        }
    }

    /// Routes that only make sense with a signed-in session.
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::History)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
