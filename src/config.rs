use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_minutes: i64,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub max_body_size: usize,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub recover: RecoverConfig,
    pub smtp: Option<SmtpConfig>,
}

/// Password recovery settings.
#[derive(Debug, Clone)]
pub struct RecoverConfig {
    /// Lifetime of an issued token.
    pub token_minutes: i64,
    /// Prefix of the link mailed to the user; the raw token is appended.
    pub uri: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let jwt_minutes: i64 = env_or("CATALOG_JWT_MINUTES", "60")
            .parse()
            .map_err(|e| format!("Invalid CATALOG_JWT_MINUTES: {e}"))?;

        let host: IpAddr = env_or("CATALOG_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CATALOG_HOST: {e}"))?;

        let port: u16 = env_or("CATALOG_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid CATALOG_PORT: {e}"))?;

        let base_url = env_or("CATALOG_BASE_URL", &format!("http://{host}:{port}"));

        let max_body_size: usize = env_or("CATALOG_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid CATALOG_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = env_or("CATALOG_CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let log_level = env_or("CATALOG_LOG_LEVEL", "info");

        let token_minutes: i64 = env_or("CATALOG_RECOVER_TOKEN_MINUTES", "30")
            .parse()
            .map_err(|e| format!("Invalid CATALOG_RECOVER_TOKEN_MINUTES: {e}"))?;
        if token_minutes <= 0 {
            return Err("CATALOG_RECOVER_TOKEN_MINUTES must be positive".to_string());
        }

        let recover = RecoverConfig {
            token_minutes,
            uri: env_or("CATALOG_RECOVER_URI", "http://localhost:5173/recover-password/"),
        };

        let smtp = match (
            std::env::var("CATALOG_SMTP_HOST").ok(),
            std::env::var("CATALOG_SMTP_PORT").ok(),
            std::env::var("CATALOG_SMTP_USER").ok(),
            std::env::var("CATALOG_SMTP_PASS").ok(),
            std::env::var("CATALOG_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid CATALOG_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_minutes,
            host,
            port,
            base_url,
            max_body_size,
            cors_origins,
            log_level,
            recover,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Minimal settings for unit tests that need an `AppState`.
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/catalog_unit".to_string(),
            jwt_secret: "unit-test-secret".to_string(),
            jwt_minutes: 60,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            max_body_size: 1024,
            cors_origins: Vec::new(),
            log_level: "warn".to_string(),
            recover: RecoverConfig {
                token_minutes: 30,
                uri: "http://localhost/recover/".to_string(),
            },
            smtp: None,
        }
    }
}
