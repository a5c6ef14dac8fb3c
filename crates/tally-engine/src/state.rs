//! Session-scoped application state.
//!
//! One [`AppState`] value is owned by the front end and passed to whatever
//! needs it (the API client takes it behind a lock). There are no globals;
//! [`AppState::clear`] is the logout reset.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Category, User};

/// Cached bearer tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    user: Option<User>,
    session: Option<Session>,
    categories: Vec<Category>,
    notifications: Vec<Notification>,
    theme: Theme,
    next_notification_id: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── session ─────────────────────────────────────────────────────────

    pub fn sign_in(&mut self, user: Option<User>, session: Session) {
        self.user = user;
        self.session = Some(session);
    }

    /// Replace tokens after a refresh, keeping the old refresh token when the
    /// backend does not rotate it.
    pub fn update_tokens(&mut self, access_token: String, refresh_token: Option<String>) {
        let refresh_token = refresh_token.or_else(|| {
            self.session
                .as_ref()
                .and_then(|s| s.refresh_token.clone())
        });
        self.session = Some(Session {
            access_token,
            refresh_token,
        });
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.refresh_token.as_deref())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Logout reset. The theme is a device preference and survives.
    pub fn clear(&mut self) {
        self.user = None;
        self.session = None;
        self.categories.clear();
        self.notifications.clear();
    }

    // ── categories ──────────────────────────────────────────────────────

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_name(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    // ── notifications ───────────────────────────────────────────────────

    pub fn push_notification(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notifications.push(Notification {
            id,
            level,
            message: message.into(),
        });
        id
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    // ── theme ───────────────────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}
