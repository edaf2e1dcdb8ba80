//! Mapper configuration
//!
//! Supports configuration loading with precedence: env > file > defaults

mod builder;
mod env;
mod file;

pub use builder::{ConfigBuilder, MapperConfig};
pub use env::{load_from_env, load_from_lookup};
pub use file::{find_config_file, load_from_file};

use crate::Result;

/// Defaults, then the first file on the search path, then `ROWBIND_*`
/// variables. Later sources win.
///
/// # Errors
///
/// Returns the first invalid file or variable.
pub fn load_config() -> Result<ConfigBuilder> {
    let mut builder = ConfigBuilder::new();

    if let Some(path) = find_config_file() {
        tracing::info!(config.path = %path.display(), "loading rowbind configuration file");
        builder = load_from_file(&path, builder)?;
    }

    load_from_env(builder)
}

/// Like [`load_config`] with an explicit file.
///
/// # Errors
///
/// Returns an error when the file is missing or invalid, or when a
/// variable is invalid.
pub fn load_config_from_path(path: &std::path::Path) -> Result<ConfigBuilder> {
    let builder = load_from_file(path, ConfigBuilder::new())?;
    load_from_env(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_missing_path() {
        let missing = std::path::Path::new("/nonexistent/rowbind.toml");
        let err = load_config_from_path(missing).unwrap_err();
        assert!(err.is_invalid_config());
    }
}
