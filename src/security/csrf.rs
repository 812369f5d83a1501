//! Session-scoped CSRF token issuance and validation.
//!
//! The token rides in a signed cookie as `"{token}:{issued_at}"`; the
//! signature comes from the jar's key, so a tampered cookie simply fails to
//! parse. Tokens expire after a configurable ttl, and an expired token is
//! treated exactly like an invalid one; callers cannot distinguish the two.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use rand::RngCore;

/// Cookie carrying the session's CSRF state.
pub const SESSION_COOKIE: &str = "mdview_session";

/// Bytes of entropy behind each token (hex-encoded on the wire).
const TOKEN_BYTES: usize = 32;

/// Issues and validates per-session anti-forgery tokens.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    ttl: Duration,
}

impl CsrfGuard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Return the session's current token, minting a fresh one when the
    /// session has none or the existing token has aged past the ttl.
    ///
    /// The returned jar must be sent back to the client so a newly minted
    /// cookie actually reaches the browser.
    pub fn get_or_issue(&self, jar: SignedCookieJar) -> (SignedCookieJar, String) {
        if let Some(token) = self.current(&jar) {
            return (jar, token);
        }

        let mut entropy = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let token = hex::encode(entropy);

        let cookie = Cookie::build((SESSION_COOKIE, format!("{}:{}", token, now_unix())))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .permanent()
            .build();

        (jar.add(cookie), token)
    }

    /// Check a presented token against the session.
    ///
    /// Fails when no token was ever issued, when the presented value does
    /// not match exactly, or when the session token has expired.
    pub fn validate(&self, jar: &SignedCookieJar, presented: &str) -> bool {
        match self.current(jar) {
            Some(token) => !presented.is_empty() && token == presented,
            None => false,
        }
    }

    /// The session's token, if present and still fresh.
    fn current(&self, jar: &SignedCookieJar) -> Option<String> {
        let cookie = jar.get(SESSION_COOKIE)?;
        let (token, issued_at) = parse_value(cookie.value())?;
        let age = now_unix().saturating_sub(issued_at);
        if age < self.ttl.as_secs() {
            Some(token)
        } else {
            None
        }
    }
}

fn parse_value(value: &str) -> Option<(String, u64)> {
    let (token, issued_at) = value.rsplit_once(':')?;
    if token.is_empty() {
        return None;
    }
    Some((token.to_string(), issued_at.parse().ok()?))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn guard_and_jar(ttl_secs: u64) -> (CsrfGuard, SignedCookieJar) {
        let guard = CsrfGuard::new(Duration::from_secs(ttl_secs));
        let jar = SignedCookieJar::new(Key::generate());
        (guard, jar)
    }

    #[test]
    fn test_issue_and_validate() {
        let (guard, jar) = guard_and_jar(3600);
        let (jar, token) = guard.get_or_issue(jar);
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(guard.validate(&jar, &token));
    }

    #[test]
    fn test_token_persists_while_fresh() {
        let (guard, jar) = guard_and_jar(3600);
        let (jar, first) = guard.get_or_issue(jar);
        let (_jar, second) = guard.get_or_issue(jar);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_token_denied() {
        let (guard, jar) = guard_and_jar(3600);
        assert!(!guard.validate(&jar, "anything"));
        assert!(!guard.validate(&jar, ""));
    }

    #[test]
    fn test_wrong_token_denied() {
        let (guard, jar) = guard_and_jar(3600);
        let (jar, token) = guard.get_or_issue(jar);
        assert!(!guard.validate(&jar, "not-the-token"));
        assert!(guard.validate(&jar, &token));
    }

    #[test]
    fn test_expired_token_denied_and_rotated() {
        let (guard, jar) = guard_and_jar(3600);
        let stale = now_unix() - 3601;
        let jar = jar.add(Cookie::new(
            SESSION_COOKIE,
            format!("{}:{}", "a".repeat(64), stale),
        ));

        assert!(!guard.validate(&jar, &"a".repeat(64)));

        let (_jar, fresh) = guard.get_or_issue(jar);
        assert_ne!(fresh, "a".repeat(64));
    }

    #[test]
    fn test_garbage_cookie_treated_as_absent() {
        let (guard, jar) = guard_and_jar(3600);
        let jar = jar.add(Cookie::new(SESSION_COOKIE, "no-separator-here"));
        assert!(!guard.validate(&jar, "no-separator-here"));
    }
}
