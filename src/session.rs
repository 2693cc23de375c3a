use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::models::SESSION_COOKIE;

/// Checks a username/password pair and returns the principal name to store
/// in the session.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Option<String>;
}

/// Fixed in-memory user table. Usernames match case-insensitively,
/// passwords exactly.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, (String, String)>,
}

impl StaticCredentials {
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let users = users
            .into_iter()
            .map(|(username, password)| {
                let username = username.into();
                (username.to_lowercase(), (username, password.into()))
            })
            .collect();
        Self { users }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<String> {
        let (principal, expected) = self.users.get(&username.trim().to_lowercase())?;
        (expected == password).then(|| principal.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub principal: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn age(&self) -> TimeDelta {
        Utc::now() - self.created_at
    }
}

/// Random v4 UUID in its 32-character hex form.
pub fn random_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Process-local session table; everything is lost on restart.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn create(&self, principal: impl Into<String>) -> String {
        let id = random_token();
        let session = Session {
            principal: principal.into(),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn destroy(&self, id: &str) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Live sessions, reported in login and logout logs.
    pub(crate) fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Session referenced by the request's cookie, if it is still live.
    pub fn from_jar(&self, jar: &CookieJar) -> Option<Session> {
        jar.get(SESSION_COOKIE).and_then(|cookie| self.get(cookie.value()))
    }
}

pub fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
