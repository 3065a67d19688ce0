use crate::error::{Error, Result};
use crate::logging::{self, LogFormat};
use jsonwebtoken::Algorithm;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use url::Url;

/// Resolved application settings.
///
/// Built once at startup and shared as an `Arc<Settings>`; nothing in the
/// process re-reads the environment after that.
#[derive(Clone)]
pub struct Settings {
    pub app_name: String,
    pub app_env: String,
    pub debug: bool,
    pub api_host: String,
    pub api_port: u16,

    pub secret_key: String,
    pub jwt_secret_key: String,
    pub jwt_algorithm: Algorithm,
    pub jwt_access_token_expire_minutes: i64,

    pub database_url: String,
    pub database_pool_size: u32,
    pub database_max_overflow: u32,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,

    pub redis_url: String,

    pub max_upload_size_mb: u64,
    pub allowed_extensions: BTreeSet<String>,
    pub upload_dir: PathBuf,

    pub log_level: LevelFilter,
    pub log_format: LogFormat,

    pub cors_origins: Vec<String>,
}

const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

impl Settings {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves settings once and freezes them behind an `Arc`.
    pub fn load() -> Result<Arc<Self>> {
        Ok(Arc::new(Self::from_env()?))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get_env(&src, "DATABASE_URL")?;
        check_url_scheme("DATABASE_URL", &database_url, &["postgres", "postgresql"])?;

        let redis_url = get_env_or(&src, "REDIS_URL", "redis://localhost:6379/0");
        check_url_scheme("REDIS_URL", &redis_url, &["redis", "rediss"])?;

        let log_level_raw = get_env_or(&src, "LOG_LEVEL", "INFO");
        let log_level = logging::parse_level(&log_level_raw)
            .map_err(|e| Error::Config(format!("Invalid value for LOG_LEVEL: {}", e)))?;

        let allowed_extensions = get_env_list(&src, "ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS)?
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Ok(Self {
            app_name: get_env_or(&src, "APP_NAME", "QuestionCraft"),
            app_env: get_env_or(&src, "APP_ENV", "development"),
            debug: get_env_bool(&src, "DEBUG", true)?,
            api_host: get_env_or(&src, "API_HOST", "0.0.0.0"),
            api_port: get_env_parse(&src, "API_PORT", 8000)?,

            secret_key: get_env(&src, "SECRET_KEY")?,
            jwt_secret_key: get_env_or(&src, "JWT_SECRET_KEY", "your-jwt-secret-key"),
            jwt_algorithm: get_env_parse(&src, "JWT_ALGORITHM", Algorithm::HS256)?,
            jwt_access_token_expire_minutes: get_env_parse(
                &src,
                "JWT_ACCESS_TOKEN_EXPIRE_MINUTES",
                30,
            )?,

            database_url,
            database_pool_size: get_env_parse(&src, "DATABASE_POOL_SIZE", 5)?,
            database_max_overflow: get_env_parse(&src, "DATABASE_MAX_OVERFLOW", 10)?,

            openai_api_key: get_env(&src, "OPENAI_API_KEY")?,
            openai_model: get_env_or(&src, "OPENAI_MODEL", "gpt-4o"),
            openai_temperature: get_env_parse(&src, "OPENAI_TEMPERATURE", 0.7)?,
            openai_max_tokens: get_env_parse(&src, "OPENAI_MAX_TOKENS", 2000)?,

            redis_url,

            max_upload_size_mb: get_env_parse(&src, "MAX_UPLOAD_SIZE_MB", 10)?,
            allowed_extensions,
            upload_dir: PathBuf::from(get_env_or(&src, "UPLOAD_DIR", "./uploads")),

            log_level,
            log_format: LogFormat::from_setting(&get_env_or(&src, "LOG_FORMAT", "json")),

            cors_origins: get_env_list(&src, "CORS_ORIGINS", DEFAULT_CORS_ORIGINS)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_pool_connections(&self) -> u32 {
        self.database_pool_size.saturating_add(self.database_max_overflow)
    }

    /// Checks the extension of `filename` against ALLOWED_EXTENSIONS.
    pub fn is_allowed_extension(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.allowed_extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("app_env", &self.app_env)
            .field("debug", &self.debug)
            .field("api_host", &self.api_host)
            .field("api_port", &self.api_port)
            .field("secret_key", &"***")
            .field("jwt_secret_key", &"***")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field(
                "jwt_access_token_expire_minutes",
                &self.jwt_access_token_expire_minutes,
            )
            .field("database_url", &redact_url(&self.database_url))
            .field("database_pool_size", &self.database_pool_size)
            .field("database_max_overflow", &self.database_max_overflow)
            .field("openai_api_key", &"***")
            .field("openai_model", &self.openai_model)
            .field("openai_temperature", &self.openai_temperature)
            .field("openai_max_tokens", &self.openai_max_tokens)
            .field("redis_url", &redact_url(&self.redis_url))
            .field("max_upload_size_mb", &self.max_upload_size_mb)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("upload_dir", &self.upload_dir)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

fn get_env(src: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    src(name).ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(src: &dyn Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    src(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse<T>(src: &dyn Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match src(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

fn get_env_bool(src: &dyn Fn(&str) -> Option<String>, name: &str, default: bool) -> Result<bool> {
    let Some(raw) = src(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" | "t" => Ok(true),
        "0" | "false" | "no" | "off" | "n" | "f" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid value for {}: '{}' is not a boolean",
            name, other
        ))),
    }
}

/// Lists are accepted either as a JSON array or as comma-separated values.
fn get_env_list(
    src: &dyn Fn(&str) -> Option<String>,
    name: &str,
    default: &[&str],
) -> Result<Vec<String>> {
    let Some(raw) = src(name) else {
        return Ok(default.iter().map(|s| s.to_string()).collect());
    };
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

fn check_url_scheme(name: &str, raw: &str, schemes: &[&str]) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    if !schemes.contains(&url.scheme()) {
        return Err(Error::Config(format!(
            "Invalid value for {}: unsupported scheme '{}'",
            name,
            url.scheme()
        )));
    }
    Ok(())
}

fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
