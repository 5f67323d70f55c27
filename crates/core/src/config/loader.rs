//! Config path resolution

use std::path::PathBuf;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "MIRROR_CONFIG";

/// File name used when the environment variable is unset
pub const CONFIG_FILE: &str = "mirror.toml";

/// Returns the config file path.
///
/// `$MIRROR_CONFIG` if set and non-empty, otherwise `mirror.toml` in the
/// working directory.
pub fn config_path() -> PathBuf {
    resolve(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn resolve(from_env: Option<PathBuf>) -> PathBuf {
    from_env
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_resolution() {
        assert_eq!(resolve(None), PathBuf::from("mirror.toml"));
        assert_eq!(resolve(Some(PathBuf::new())), PathBuf::from("mirror.toml"));
        assert_eq!(
            resolve(Some(PathBuf::from("/etc/app/reflect.toml"))),
            PathBuf::from("/etc/app/reflect.toml")
        );
    }
}
