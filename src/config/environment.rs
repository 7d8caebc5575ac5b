use std::env;

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub bind_addr: String,
    pub app: AppConfig,
}

/// Settings the router and services need at runtime.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub session_cookie_secure: bool,
    pub rate_limit_burst: u32,
    pub mfa_salt: String,
    pub mfa_issuer: String,
    pub mfa_totp_skew: u8,
    pub mfa_pending_window_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        // Sessions fall back to the in-memory store when REDIS_URL is absent.
        let redis_url = env::var("REDIS_URL").ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set".to_string())?;

        let mfa_salt = env::var("MFA_SALT")
            .map_err(|_| "MFA_SALT must be set".to_string())?;

        let mfa_issuer = env::var("MFA_ISSUER").unwrap_or_else(|_| "WalletAuth".to_string());

        let session_ttl_secs = parse_or("SESSION_TTL_SECS", 86_400)?;
        let session_cookie_secure = parse_or("SESSION_COOKIE_SECURE", false)?;
        let rate_limit_burst = parse_or("RATE_LIMIT_BURST", 10)?;
        let mfa_totp_skew = parse_or("MFA_TOTP_SKEW", 2)?;
        let mfa_pending_window_secs = parse_or("MFA_PENDING_WINDOW_SECS", 300)?;

        Ok(Self {
            database_url,
            redis_url,
            bind_addr,
            app: AppConfig {
                session_secret,
                session_ttl_secs,
                session_cookie_secure,
                rate_limit_burst,
                mfa_salt,
                mfa_issuer,
                mfa_totp_skew,
                mfa_pending_window_secs,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| format!("{name} has an invalid value")),
        Err(_) => Ok(default),
    }
}
