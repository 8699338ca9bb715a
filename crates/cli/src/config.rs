//! CLI configuration utilities

use anyhow::Result;
use lims_portal_core::PortalSettings;
use std::path::{Path, PathBuf};

/// Environment override for the data directory
pub const STATE_DIR_ENV: &str = "LIMS_PORTAL_STATE_DIR";

const SETTINGS_FILE: &str = "portal.toml";
const SESSION_FILE: &str = "session.json";

/// Pick the data directory: the flag, then the environment, then the
/// platform data dir.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    resolve_data_dir_with(flag, std::env::var_os(STATE_DIR_ENV).map(PathBuf::from))
}

fn resolve_data_dir_with(flag: Option<PathBuf>, env: Option<PathBuf>) -> PathBuf {
    flag.or(env).unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lims-portal")
    })
}

/// Load settings from the explicit file, or `<data_dir>/portal.toml` when it
/// exists, layered under `LIMS_PORTAL_*` variables.
pub fn load_settings(explicit: Option<&Path>, data_dir: &Path) -> Result<PortalSettings> {
    let implicit = data_dir.join(SETTINGS_FILE);
    let path = explicit.or_else(|| implicit.exists().then_some(implicit.as_path()));

    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "Loading settings file");
    }
    Ok(PortalSettings::load(path)?)
}

/// Session jar location for these settings
pub fn session_path(settings: &PortalSettings, data_dir: &Path) -> PathBuf {
    settings
        .session_file
        .clone()
        .unwrap_or_else(|| data_dir.join(SESSION_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_beats_environment() {
        let dir = resolve_data_dir_with(Some("/flag".into()), Some("/env".into()));
        assert_eq!(dir, PathBuf::from("/flag"));

        let dir = resolve_data_dir_with(None, Some("/env".into()));
        assert_eq!(dir, PathBuf::from("/env"));

        let dir = resolve_data_dir_with(None, None);
        assert!(dir.ends_with("lims-portal"));
    }

    #[test]
    fn test_session_path_defaults_into_data_dir() {
        let settings = PortalSettings::default();
        assert_eq!(
            session_path(&settings, Path::new("/data")),
            PathBuf::from("/data/session.json")
        );

        let settings = PortalSettings {
            session_file: Some("/elsewhere/jar.json".into()),
            ..PortalSettings::default()
        };
        assert_eq!(
            session_path(&settings, Path::new("/data")),
            PathBuf::from("/elsewhere/jar.json")
        );
    }

    #[test]
    fn test_implicit_settings_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "token_ttl_days = 3\n").unwrap();

        let settings = load_settings(None, dir.path()).unwrap();
        assert_eq!(settings.token_ttl_days, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_settings(Some(&missing), dir.path()).is_err());
    }
}
