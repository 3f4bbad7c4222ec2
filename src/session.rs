//! Who is using the app right now.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Please enter your Player Name, Email, and Code!")]
    MissingFields,
}

/// Values typed into the login form.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Values typed into the signup form.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub hero_name: String,
    pub email: String,
    pub password: String,
    pub avatar: usize,
}

pub const AVATARS: [&str; 5] = ["👷", "🔧", "⚡", "🛠", "🦾"];

impl Registration {
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.hero_name.trim().is_empty() {
            return Err(LoginError::MissingFields);
        }
        Ok(())
    }

    pub fn avatar_glyph(&self) -> &'static str {
        AVATARS[self.avatar % AVATARS.len()]
    }
}

/// Session state created at startup as a guest and cleared on logout.
#[derive(Debug, Clone, Default)]
pub struct Session {
    name: Option<String>,
}

impl Session {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn login(&mut self, credentials: &Credentials) -> Result<(), LoginError> {
        let name = credentials.name.trim();
        if name.is_empty() || credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(LoginError::MissingFields);
        }
        self.name = Some(name.to_string());
        tracing::info!(name = %name, "User logged in");
        Ok(())
    }

    pub fn logout(&mut self) {
        if let Some(name) = self.name.take() {
            tracing::info!(name = %name, "User logged out");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.name.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// First word of the name, or "Worker" for a guest.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("Worker")
    }
}

pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 17 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}
