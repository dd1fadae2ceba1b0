use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";

/// AppConfig
///
/// The application's entire configuration. Loaded once at startup, never mutated, and
/// pulled into handlers and the token issuer through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls which settings are mandatory.
    pub env: Env,
    // Postgres connection string. `None` is only accepted locally and selects the
    // in-memory repository.
    pub db_url: Option<String>,
    pub db_max_connections: u32,
    // Upper bound on waiting for a pooled connection.
    pub db_acquire_timeout: Duration,
    // Process-wide HMAC secret for access tokens.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
    // Single browser origin allowed by CORS; any origin when unset.
    pub cors_origin: Option<String>,
    // JSON message catalogue overriding the built-in English texts.
    pub messages_path: Option<PathBuf>,
}

/// Env
///
/// Runtime context: `Local` tolerates missing settings, `Production` refuses to start
/// without them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(5),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(15 * 60),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bind_addr: "0.0.0.0:3000".to_string(),
            cors_origin: None,
            messages_path: None,
        }
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

// bcrypt rejects costs outside this range at hashing time.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

fn bcrypt_cost(default: u32) -> u32 {
    let cost = parsed("BCRYPT_COST", default);
    if BCRYPT_COST_RANGE.contains(&cost) {
        cost
    } else {
        tracing::warn!("ignoring out-of-range BCRYPT_COST={}", cost);
        default
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// load
    ///
    /// Reads every setting from the environment.
    ///
    /// # Panics
    /// In production, panics when `DATABASE_URL` or `JWT_SECRET` is missing so the
    /// server never starts with an in-memory store or a guessable signing key.
    pub fn load() -> Self {
        let defaults = Self::default();

        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(non_empty("DATABASE_URL").expect("FATAL: DATABASE_URL must be set in production.")),
                non_empty("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                non_empty("DATABASE_URL"),
                non_empty("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            ),
        };

        Self {
            env,
            db_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            db_acquire_timeout: Duration::from_secs(parsed(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout.as_secs(),
            )),
            jwt_secret,
            token_ttl: Duration::from_secs(parsed("TOKEN_TTL_SECS", defaults.token_ttl.as_secs())),
            bcrypt_cost: bcrypt_cost(defaults.bcrypt_cost),
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_origin: non_empty("CORS_ORIGIN"),
            messages_path: non_empty("MESSAGES_PATH").map(PathBuf::from),
        }
    }
}
