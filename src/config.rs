use std::env;

/// AppConfig
///
/// The gateway's configuration, loaded once at startup and immutable after.
/// Reaches the auth components and the dispatcher through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and secret strictness.
    pub env: Env,
    // Prefix in front of every route, e.g. "/api". Empty means none.
    pub api_prefix: String,
    // HMAC secret for bearer JWTs.
    pub jwt_secret: String,
    // Lifetime of tokens minted by `JwtVerifier::issue`.
    pub token_max_age_secs: u64,
    // Socket address the HTTP server binds.
    pub bind_addr: String,
}

/// Env
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "forum-gateway-local-development-secret";
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_MAX_AGE_SECS: u64 = 24 * 60 * 60;

impl Default for AppConfig {
    /// Safe values for tests; reads no environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_max_age_secs: DEFAULT_TOKEN_MAX_AGE_SECS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` is missing, and whenever
    /// `TOKEN_MAX_AGE` is set but is not a whole number of seconds. The
    /// gateway must not start with an insecure or half-read configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let token_max_age_secs = match env::var("TOKEN_MAX_AGE") {
            Ok(raw) => raw
                .parse()
                .expect("FATAL: TOKEN_MAX_AGE must be a number of seconds."),
            Err(_) => DEFAULT_TOKEN_MAX_AGE_SECS,
        };

        Self {
            env,
            api_prefix: normalize_prefix(
                &env::var("API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string()),
            ),
            jwt_secret,
            token_max_age_secs,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

/// Forces a leading `/` and drops trailing ones; `/` and "" both mean no prefix.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api"), "/api");
        assert_eq!(normalize_prefix("api/"), "/api");
        assert_eq!(normalize_prefix("/api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }
}
