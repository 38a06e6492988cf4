//! Configuration file management for fitforge.
//!
//! Provides a TOML-based config file at `~/.config/fitforge/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use fitforge_core::auth::TokenConfig;
use fitforge_db::config::DbConfig;

pub const JWT_SECRET_ENV: &str = "FITFORGE_JWT_SECRET";
pub const TOKEN_EXPIRE_ENV: &str = "FITFORGE_TOKEN_EXPIRE_MINUTES";
pub const ALLOWED_ORIGINS_ENV: &str = "FITFORGE_ALLOWED_ORIGINS";

/// Browser origins allowed by CORS when nothing else is configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded JWT signing secret (64 hex chars = 32 bytes).
    pub jwt_secret: String,
    #[serde(default = "default_expire_minutes")]
    pub token_expire_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
        }
    }
}

fn default_expire_minutes() -> i64 {
    TokenConfig::DEFAULT_EXPIRE_MINUTES
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the fitforge config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/fitforge` or `~/.config/fitforge`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("fitforge");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fitforge")
}

/// Return the path to the fitforge config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Secret generation
// -----------------------------------------------------------------------

/// Generate a random JWT secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_jwt_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct FitforgeConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    pub allowed_origins: Vec<String>,
}

impl FitforgeConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `FITFORGE_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - JWT secret: `FITFORGE_JWT_SECRET` > `auth.jwt_secret` > error
    /// - Token lifetime: `FITFORGE_TOKEN_EXPIRE_MINUTES` > `auth.token_expire_minutes` > 30
    /// - CORS origins: `server.allowed_origins` > localhost dev servers, plus any extra origins in
    ///   `FITFORGE_ALLOWED_ORIGINS` (comma-separated)
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let expire_minutes = if let Ok(raw) = std::env::var(TOKEN_EXPIRE_ENV) {
            let minutes: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{TOKEN_EXPIRE_ENV} is not an integer: {raw:?}"))?;
            if minutes <= 0 {
                bail!("{TOKEN_EXPIRE_ENV} must be positive, got {minutes}");
            }
            minutes
        } else if let Some(ref cfg) = file_config {
            cfg.auth.token_expire_minutes
        } else {
            TokenConfig::DEFAULT_EXPIRE_MINUTES
        };

        let token_config = if let Ok(secret_hex) = std::env::var(JWT_SECRET_ENV) {
            TokenConfig::from_hex(&secret_hex, expire_minutes)
                .with_context(|| format!("{JWT_SECRET_ENV} env var is invalid"))?
        } else if let Some(ref cfg) = file_config {
            TokenConfig::from_hex(&cfg.auth.jwt_secret, expire_minutes)
                .context("invalid jwt_secret in config file")?
        } else {
            bail!(
                "JWT secret not found; set {JWT_SECRET_ENV} or run `fitforge init` to create a config file"
            );
        };

        let mut allowed_origins = match file_config {
            Some(cfg) => cfg.server.allowed_origins,
            None => default_origins(),
        };
        if let Ok(raw) = std::env::var(ALLOWED_ORIGINS_ENV) {
            for origin in parse_origins(&raw) {
                if !allowed_origins.contains(&origin) {
                    allowed_origins.push(origin);
                }
            }
        }

        Ok(Self {
            db_config,
            token_config,
            allowed_origins,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookup at an empty temp dir and clear every fitforge var.
    fn isolate(tmp: &tempfile::TempDir) {
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        for var in [
            DbConfig::URL_ENV,
            JWT_SECRET_ENV,
            TOKEN_EXPIRE_ENV,
            ALLOWED_ORIGINS_ENV,
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    fn restore(orig_xdg: Option<String>) {
        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        for var in [
            DbConfig::URL_ENV,
            JWT_SECRET_ENV,
            TOKEN_EXPIRE_ENV,
            ALLOWED_ORIGINS_ENV,
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    fn sample_file() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: "postgresql://filehost:5432/filedb".to_string(),
            },
            auth: AuthSection {
                jwt_secret: "bb".repeat(32),
                token_expire_minutes: 90,
            },
            server: ServerSection {
                allowed_origins: vec!["https://fitforge.example".to_string()],
            },
        }
    }

    #[test]
    fn generate_jwt_secret_is_64_hex_chars() {
        let secret = generate_jwt_secret();
        assert_eq!(secret.len(), 64);
        assert!(
            secret.chars().all(|c| c.is_ascii_hexdigit()),
            "expected all hex digits, got: {secret}"
        );
        assert_ne!(secret, generate_jwt_secret());
    }

    #[test]
    fn minimal_config_file_fills_defaults() {
        let contents = "[database]\nurl = \"postgresql://h:5432/db\"\n\n[auth]\njwt_secret = \"abcd\"\n";
        let cfg: ConfigFile = toml::from_str(contents).unwrap();
        assert_eq!(cfg.auth.token_expire_minutes, 30);
        assert_eq!(cfg.server.allowed_origins, default_origins());
    }

    #[cfg(unix)]
    #[test]
    fn save_and_load_config_roundtrip() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);

        save_config(&sample_file()).unwrap();
        let path = config_path();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        let loaded = load_config();

        restore(orig_xdg);

        assert!(path.starts_with(tmp.path()));
        assert_eq!(mode & 0o777, 0o600);
        let loaded = loaded.unwrap();
        assert_eq!(loaded.database.url, "postgresql://filehost:5432/filedb");
        assert_eq!(loaded.auth.token_expire_minutes, 90);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);

        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(JWT_SECRET_ENV, SECRET) };

        let result = FitforgeConfig::resolve(Some("postgresql://cli:5432/clidb"));
        restore(orig_xdg);

        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
        assert_eq!(config.token_config.expire_minutes, 30);
        assert_eq!(config.allowed_origins, default_origins());
    }

    #[test]
    fn resolve_with_env_vars_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);
        save_config(&sample_file()).unwrap();

        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(JWT_SECRET_ENV, SECRET) };
        unsafe { std::env::set_var(TOKEN_EXPIRE_ENV, "5") };
        unsafe { std::env::set_var(ALLOWED_ORIGINS_ENV, "https://a.example, https://b.example,") };

        let result = FitforgeConfig::resolve(None);
        restore(orig_xdg);

        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.token_config.secret, hex::decode(SECRET).unwrap());
        assert_eq!(config.token_config.expire_minutes, 5);
        assert_eq!(
            config.allowed_origins,
            vec![
                "https://fitforge.example".to_string(),
                "https://a.example".to_string(),
                "https://b.example".to_string(),
            ]
        );
    }

    #[test]
    fn env_origins_extend_the_defaults() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);

        unsafe { std::env::set_var(JWT_SECRET_ENV, SECRET) };
        unsafe {
            std::env::set_var(
                ALLOWED_ORIGINS_ENV,
                format!("https://app.example,{}", DEFAULT_ALLOWED_ORIGINS[0]),
            )
        };

        let result = FitforgeConfig::resolve(None);
        restore(orig_xdg);

        let config = result.unwrap();
        let mut expected = default_origins();
        expected.push("https://app.example".to_string());
        assert_eq!(config.allowed_origins, expected);
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);
        save_config(&sample_file()).unwrap();

        let result = FitforgeConfig::resolve(None);
        restore(orig_xdg);

        let config = result.unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://filehost:5432/filedb");
        assert_eq!(config.token_config.secret, vec![0xbb; 32]);
        assert_eq!(config.token_config.expire_minutes, 90);
        assert_eq!(config.allowed_origins, vec!["https://fitforge.example".to_string()]);
    }

    #[test]
    fn resolve_defaults_db_url_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);
        unsafe { std::env::set_var(JWT_SECRET_ENV, SECRET) };

        let result = FitforgeConfig::resolve(None);
        restore(orig_xdg);

        assert_eq!(result.unwrap().db_config.database_url, DbConfig::DEFAULT_URL);
    }

    #[test]
    fn resolve_rejects_bad_expiry() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);
        unsafe { std::env::set_var(JWT_SECRET_ENV, SECRET) };
        unsafe { std::env::set_var(TOKEN_EXPIRE_ENV, "soon") };

        let result = FitforgeConfig::resolve(None);
        restore(orig_xdg);

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains(TOKEN_EXPIRE_ENV), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_errors_when_no_jwt_secret() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        isolate(&tmp);

        let result = FitforgeConfig::resolve(Some("postgresql://localhost:5432/fitforge"));
        restore(orig_xdg);

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("JWT secret not found"), "unexpected error: {msg}");
        assert!(msg.contains("fitforge init"), "unexpected error: {msg}");
    }

    #[test]
    fn parse_origins_drops_blanks() {
        assert_eq!(parse_origins(" , "), Vec::<String>::new());
        assert_eq!(parse_origins("http://x"), vec!["http://x".to_string()]);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("fitforge/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
