//! API server configuration.

use judge_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable       | Default                                |
    /// |----------------|----------------------------------------|
    /// | `BIND_ADDR`    | `127.0.0.1:3000`                       |
    /// | `DATABASE_URL` | `postgres://localhost:5432/judge`      |
    /// | `JWT_SECRET`   | generated & persisted to file          |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/judge".into()),
            jwt_secret: resolve_jwt_secret(),
        }
    }

    /// Fixed configuration for tests and throwaway runs.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            jwt_secret: jwt_secret.into(),
        }
    }
}
