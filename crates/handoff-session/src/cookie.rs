//! Session handle cookies.

use crate::record::SessionHandle;
use handoff_core::{CookieConfig, SessionConfig};

/// Builds and reads the cookie carrying a session handle.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    config: CookieConfig,
    max_age_seconds: i64,
}

impl SessionCookie {
    pub fn new(config: CookieConfig, max_age_seconds: i64) -> Self {
        Self {
            config,
            max_age_seconds,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie.clone(), config.ttl_seconds())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// `Set-Cookie` value that stores `handle`.
    pub fn set(&self, handle: &SessionHandle) -> String {
        self.render(handle.token(), self.max_age_seconds)
    }

    /// `Set-Cookie` value that removes the cookie.
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    /// Pull the handle out of a `Cookie` request header.
    pub fn extract<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.config.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; SameSite={}",
            self.config.name,
            value,
            self.config.path,
            max_age,
            self.config.same_site.as_str()
        );
        if self.config.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
