pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{Credentials, DEFAULT_ORGANIZATION, DEFAULT_POLL_INTERVAL, Settings};

use std::path::PathBuf;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "INVSYNC_CONFIG_DIR";

/// Environment variable pointing directly at a run file
pub const RUN_PATH_ENV: &str = "INVSYNC_RUN_PATH";

const RUN_FILE_CANDIDATES: [&str; 4] = ["run.local.kdl", ".run.local.kdl", "run.kdl", ".run.kdl"];

/// invsync's configuration directory, without creating it
pub fn config_dir_path() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("invsync"))
}

/// invsync's configuration directory, created if missing
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = config_dir_path()?;

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the run file.
///
/// Search order:
/// 1. `INVSYNC_RUN_PATH`
/// 2. current directory: run.local.kdl, .run.local.kdl, run.kdl, .run.kdl
/// 3. `./.invsync/`, same order
/// 4. `<config dir>/run.kdl`
pub fn find_run_file() -> Result<PathBuf> {
    if let Ok(run_path) = std::env::var(RUN_PATH_ENV) {
        let path = PathBuf::from(run_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file", RUN_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;

    for filename in &RUN_FILE_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let local_dir = current_dir.join(".invsync");
    if local_dir.is_dir() {
        for filename in &RUN_FILE_CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Ok(config_dir) = config_dir_path() {
        let global = config_dir.join("run.kdl");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::RunFileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Run `f` inside `dir`, restoring the working directory afterwards
    fn in_dir<T>(dir: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = f();
        std::env::set_current_dir(original).unwrap();
        result
    }

    #[test]
    #[serial]
    fn test_get_config_dir_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("nested").join("invsync");

        temp_env::with_var(CONFIG_DIR_ENV, Some(&target), || {
            let dir = get_config_dir().unwrap();
            assert_eq!(dir, target);
            assert!(dir.is_dir());
        });
    }

    #[test]
    #[serial]
    fn test_default_config_dir_name() {
        temp_env::with_var_unset(CONFIG_DIR_ENV, || {
            let dir = config_dir_path().unwrap();
            assert!(dir.ends_with("invsync"));
        });
    }

    #[test]
    #[serial]
    fn test_find_run_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("run.kdl"), "// test").unwrap();

        let result = temp_env::with_var_unset(RUN_PATH_ENV, || in_dir(temp_dir.path(), find_run_file));
        assert!(result.unwrap().ends_with("run.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_run_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("run.kdl"), "// shared").unwrap();
        fs::write(temp_dir.path().join(".run.local.kdl"), "// local").unwrap();

        let result = temp_env::with_var_unset(RUN_PATH_ENV, || in_dir(temp_dir.path(), find_run_file));
        assert!(result.unwrap().ends_with(".run.local.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_run_file_in_invsync_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let local_dir = temp_dir.path().join(".invsync");
        fs::create_dir(&local_dir).unwrap();
        fs::write(local_dir.join("run.kdl"), "// in .invsync").unwrap();

        let result = temp_env::with_var_unset(RUN_PATH_ENV, || in_dir(temp_dir.path(), find_run_file));
        assert!(result.unwrap().ends_with(".invsync/run.kdl"));
    }

    #[test]
    #[serial]
    fn test_find_run_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let run_path = temp_dir.path().join("custom.kdl");
        fs::write(&run_path, "// custom").unwrap();

        let result = temp_env::with_var(RUN_PATH_ENV, Some(&run_path), find_run_file);
        assert_eq!(result.unwrap(), run_path);
    }

    #[test]
    #[serial]
    fn test_find_run_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join("config");

        let result = temp_env::with_vars(
            [
                (RUN_PATH_ENV, None),
                (CONFIG_DIR_ENV, Some(config_dir.as_os_str())),
            ],
            || in_dir(temp_dir.path(), find_run_file),
        );
        assert!(matches!(result, Err(ConfigError::RunFileNotFound)));
    }
}
