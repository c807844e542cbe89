use std::{net::SocketAddr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub cron: CronConfig,
    pub nav: NavConfig,
    pub provider: ProviderConfig,
    pub auth: AuthConfig,
}

pub struct CronConfig {
    pub schedule: String,
    pub timezone: String,
}

pub struct NavConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub req_delay: Duration,
    pub batch_delay: Duration,
    pub retry_max: u32,
    pub history_cap: usize,
}

pub struct ProviderConfig {
    pub base_url: String,
    pub timeout: Duration,
}

pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = env_or("FUNDFOLIO_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .expect("Invalid FUNDFOLIO_LISTEN_ADDR");
        let db_path = env_or("FUNDFOLIO_DB_PATH", "./db/fundfolio.db");
        let cors_allow = env_or("FUNDFOLIO_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout =
            Duration::from_millis(env_parse("FUNDFOLIO_REQUEST_TIMEOUT_MS", 30_000));

        let cron = CronConfig {
            schedule: env_or("CRON_SCHEDULE", "0 0 0 * * *"),
            timezone: env_or("CRON_TIMEZONE", "Asia/Kolkata"),
        };

        let nav = NavConfig {
            batch_size: env_parse("NAV_BATCH_SIZE", 10),
            concurrency: env_parse("NAV_CONCURRENCY", 10),
            req_delay: Duration::from_millis(env_parse("NAV_REQ_DELAY_MS", 300)),
            batch_delay: Duration::from_millis(env_parse("NAV_BATCH_DELAY_MS", 2_000)),
            retry_max: env_parse("NAV_RETRY_MAX", 3),
            history_cap: env_parse("NAV_HISTORY_CAP", 30),
        };

        let provider = ProviderConfig {
            base_url: env_or("PROVIDER_BASE_URL", "https://api.mfapi.in"),
            timeout: Duration::from_millis(env_parse("PROVIDER_TIMEOUT_MS", 15_000)),
        };

        let auth = AuthConfig {
            token_secret: std::env::var("AUTH_TOKEN_SECRET")
                .expect("AUTH_TOKEN_SECRET must be set"),
            token_ttl: Duration::from_secs(env_parse("AUTH_TOKEN_TTL_HOURS", 24) * 3600),
        };

        Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout,
            cron,
            nav,
            provider,
            auth,
        }
    }
}
