use anyhow::{Context, Result};

/// Application configuration loaded from environment variables once at
/// startup. Components receive it by reference; nothing reads the process
/// environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    /// Tenant prefix baked into every object-storage key.
    pub organization_id: String,
    /// Max documents claimed per scheduler pass.
    pub scheduler_batch_size: usize,
    /// Max in-flight uploads in a single batch.
    pub upload_concurrency: usize,
    /// Per-file upload deadline, in seconds.
    pub upload_timeout_secs: u64,
    /// Lifetime of presigned GET/PUT URLs, in seconds.
    pub presign_expiry_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            organization_id: std::env::var("ORGANIZATION_ID")
                .unwrap_or_else(|_| "default".to_string()),
            scheduler_batch_size: env_parse("SCHEDULER_BATCH_SIZE", 5)?,
            upload_concurrency: env_parse("UPLOAD_CONCURRENCY", 5)?,
            upload_timeout_secs: env_parse("UPLOAD_TIMEOUT_SECS", 30)?,
            presign_expiry_secs: env_parse("PRESIGN_EXPIRY_SECS", 3600)?,
            port: env_parse("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
