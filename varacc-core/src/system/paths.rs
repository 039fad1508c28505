use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static VARACC_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Generate a UTC timestamp for run identifiers
/// Returns format: YYYYMMDD_HHMMSS (in UTC timezone)
pub fn generate_utc_timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Get the varacc home directory
/// Checks VARACC_HOME environment variable, falls back to ${HOME}/.varacc
pub fn varacc_home() -> PathBuf {
    VARACC_HOME
        .get_or_init(|| resolve_home(std::env::var("VARACC_HOME").ok()))
        .clone()
}

fn resolve_home(env_value: Option<String>) -> PathBuf {
    match env_value {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".varacc"),
    }
}

/// Default location of the frozen legacy store
pub fn legacy_store_dir() -> PathBuf {
    varacc_home().join("legacy")
}

/// Default location of the live store
pub fn live_store_dir() -> PathBuf {
    varacc_home().join("live")
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    varacc_home().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_home_prefers_env() {
        assert_eq!(
            resolve_home(Some("/srv/varacc".to_string())),
            PathBuf::from("/srv/varacc")
        );
    }

    #[test]
    fn test_resolve_home_ignores_empty_env() {
        let home = resolve_home(Some(String::new()));
        assert!(home.ends_with(".varacc"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = generate_utc_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }
}
