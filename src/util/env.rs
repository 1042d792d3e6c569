//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).

use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Database DSN: `DATABASE_URL` if set, otherwise composed from the `DB_*`
/// component variables.
pub fn db_url() -> anyhow::Result<String> {
    init_env();
    if let Some(v) = env_opt("DATABASE_URL") {
        return Ok(v);
    }
    if let Some(dsn) = build_dsn_from_components() {
        return Ok(dsn);
    }
    Err(anyhow::anyhow!("no database URL env vars set"))
}

/// Compose a DSN from DB_HOST / DB_USERNAME / DB_PASSWORD / DB_DATABASE /
/// DB_PORT / DB_SSLMODE. Built via `url::Url` so credentials containing
/// reserved characters are percent-encoded correctly.
fn build_dsn_from_components() -> Option<String> {
    let host = env_opt("DB_HOST")?;
    let user = env_opt("DB_USERNAME")?;
    let password = env_opt("DB_PASSWORD");
    let database = env_opt("DB_DATABASE").unwrap_or_else(|| "postgres".into());
    let port: u16 = env_opt("DB_PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(5432);
    let ssl_mode = env_opt("DB_SSLMODE").unwrap_or_else(|| "prefer".into());

    let mut out = url::Url::parse("postgresql://localhost").ok()?;
    out.set_username(&user).ok()?;
    if let Some(pass) = password {
        out.set_password(Some(&pass)).ok()?;
    }
    out.set_host(Some(host.trim())).ok()?;
    out.set_port(Some(port)).ok()?;
    out.set_path(&format!("/{database}"));
    if ssl_mode != "disable" {
        out.query_pairs_mut().append_pair("sslmode", &ssl_mode);
    }

    Some(out.to_string())
}
