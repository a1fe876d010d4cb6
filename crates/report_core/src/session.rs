/// Placeholder credentials. This is a demo gate, not authentication.
pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_PASSWORD: &str = "password";

/// The signed-in user. Owned by `AppState` and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
}

pub fn sign_in(email: &str, password: &str) -> Option<Session> {
    let email = email.trim();
    if email.eq_ignore_ascii_case(DEMO_EMAIL) && password == DEMO_PASSWORD {
        Some(Session {
            email: email.to_ascii_lowercase(),
        })
    } else {
        None
    }
}
