//! TOML configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::coercion::InvalidEnumValueHandling;
use crate::{MappingError, Result};

/// Searched in order; the first existing file wins.
const SEARCH_PATHS: [&str; 3] = [
    "rowbind.toml",
    "~/.config/rowbind/config.toml",
    "/etc/rowbind/config.toml",
];

/// First existing configuration file on the search path.
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    search_paths(home.as_deref()).into_iter().find(|p| p.is_file())
}

/// Search path with `~` expanded. Home-relative entries are skipped when
/// no home directory is known.
fn search_paths(home: Option<&Path>) -> Vec<PathBuf> {
    SEARCH_PATHS
        .iter()
        .filter_map(|entry| match entry.strip_prefix("~/") {
            Some(rest) => home.map(|h| h.join(rest)),
            None => Some(PathBuf::from(entry)),
        })
        .collect()
}

/// Apply the TOML file at `path` on top of `builder`.
///
/// # Errors
///
/// Returns an invalid-configuration error when the file cannot be read or
/// parsed, and an invalid-policy error for an unknown `enum_handling`.
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let at = path.display();
    let content = std::fs::read_to_string(path)
        .map_err(|e| MappingError::invalid_config(format!("cannot read {at}: {e}")))?;
    let file_config: FileConfig = toml::from_str(&content)
        .map_err(|e| MappingError::invalid_config(format!("{at} is not valid rowbind TOML: {e}")))?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(mapping) = config.mapping {
        if let Some(policy) = mapping.enum_handling {
            builder = builder.enum_handling(policy.parse::<InvalidEnumValueHandling>()?);
        }

        if let Some(enabled) = mapping.match_names_with_underscores {
            builder = builder.match_names_with_underscores(enabled);
        }

        if let Some(prefix) = mapping.parameter_prefix {
            builder = builder.parameter_prefix(prefix);
        }
    }

    if let Some(cache) = config.cache
        && let Some(threshold) = cache.warn_threshold
    {
        builder = builder.routine_warn_threshold(threshold);
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    mapping: Option<MappingSection>,
    cache: Option<CacheSection>,
}

#[derive(Debug, Deserialize)]
struct MappingSection {
    enum_handling: Option<String>,
    match_names_with_underscores: Option<bool>,
    parameter_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CacheSection {
    warn_threshold: Option<usize>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[mapping]
enum_handling = "use_default"
match_names_with_underscores = true
parameter_prefix = ":"

[cache]
warn_threshold = 2000
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();
        let mapping = config.mapping.unwrap();
        assert_eq!(mapping.enum_handling.as_deref(), Some("use_default"));
        assert_eq!(mapping.match_names_with_underscores, Some(true));
        assert_eq!(config.cache.unwrap().warn_threshold, Some(2000));
    }

    #[test]
    fn test_load_from_file_success() {
        let temp_file = create_temp_config(
            r#"
[mapping]
enum_handling = "Cast"
parameter_prefix = "@"

[cache]
warn_threshold = 10
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build();
        assert_eq!(config.enum_handling, InvalidEnumValueHandling::Cast);
        assert_eq!(config.parameter_prefix.as_deref(), Some("@"));
        assert_eq!(config.routine_warn_threshold, Some(10));
        assert!(!config.match_names_with_underscores);
    }

    #[test]
    fn test_empty_file_keeps_builder() {
        let temp_file = create_temp_config("");
        let builder = ConfigBuilder::new().match_names_with_underscores(true);
        let config = load_from_file(temp_file.path(), builder).unwrap().build();
        assert!(config.match_names_with_underscores);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Path::new("/nonexistent/path/config.toml"), ConfigBuilder::new())
            .unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("cannot read /nonexistent/path/config.toml"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("is not valid rowbind TOML"));
    }

    #[test]
    fn test_search_paths_expand_home() {
        let paths = search_paths(Some(Path::new("/home/ada")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("rowbind.toml"),
                PathBuf::from("/home/ada/.config/rowbind/config.toml"),
                PathBuf::from("/etc/rowbind/config.toml"),
            ]
        );

        let paths = search_paths(None);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| !p.starts_with("~")));
    }

    #[test]
    fn test_load_from_file_invalid_policy() {
        let temp_file = create_temp_config("[mapping]\nenum_handling = \"ignore\"\n");
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.is_invalid_policy());
        assert!(err.to_string().contains("ignore"));
    }
}
