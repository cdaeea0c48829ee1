use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::AuthError;

const SESSION_TOKEN_LEN: usize = 48;

/// Name of the browser session cookie
pub const SESSION_COOKIE: &str = "marketplace_session";

/// Redis-backed session store for cookie authentication.
///
/// Sessions are opaque random tokens mapping to a user id with a TTL;
/// nothing about the user is stored in the cookie itself.
#[derive(Clone)]
pub struct SessionStore {
    redis: Arc<redis::Client>,
    ttl: Duration,
    namespace: String,
}

impl SessionStore {
    pub fn new(redis: Arc<redis::Client>, ttl: Duration) -> Self {
        Self {
            redis,
            ttl,
            namespace: "marketplace:session".to_string(),
        }
    }

    fn key(&self, token: &str) -> String {
        format!("{}:{}", self.namespace, token)
    }

    /// Create a session for a user and return the opaque token.
    pub async fn create(&self, user_id: Uuid) -> Result<String, AuthError> {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_TOKEN_LEN)
            .map(char::from)
            .collect();

        let mut conn = self
            .redis
            .get_async_connection()
            .await
            .map_err(|e| AuthError::SessionError(e.to_string()))?;

        let _: () = conn
            .set_ex(
                self.key(&token),
                user_id.to_string(),
                self.ttl.as_secs() as usize,
            )
            .await
            .map_err(|e: redis::RedisError| AuthError::SessionError(e.to_string()))?;

        debug!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Resolve a session token to a user id, if the session is live.
    pub async fn get(&self, token: &str) -> Result<Option<Uuid>, AuthError> {
        let mut conn = self
            .redis
            .get_async_connection()
            .await
            .map_err(|e| AuthError::SessionError(e.to_string()))?;

        let value: Option<String> = conn
            .get(self.key(token))
            .await
            .map_err(|e: redis::RedisError| AuthError::SessionError(e.to_string()))?;

        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    /// Destroy a session (logout).
    pub async fn destroy(&self, token: &str) -> Result<(), AuthError> {
        let mut conn = self
            .redis
            .get_async_connection()
            .await
            .map_err(|e| AuthError::SessionError(e.to_string()))?;

        let _: () = conn
            .del(self.key(token))
            .await
            .map_err(|e: redis::RedisError| AuthError::SessionError(e.to_string()))?;

        Ok(())
    }
}

/// Pull the session token out of a Cookie header value.
pub fn session_token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_session_cookie_among_others() {
        let header = "theme=dark; marketplace_session=abc123; lang=en";
        assert_eq!(session_token_from_cookie_header(header), Some("abc123"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(session_token_from_cookie_header("theme=dark"), None);
        assert_eq!(session_token_from_cookie_header(""), None);
    }
}
