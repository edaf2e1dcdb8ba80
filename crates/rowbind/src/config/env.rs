//! Environment variable loading for configuration

use super::builder::ConfigBuilder;
use crate::coercion::InvalidEnumValueHandling;
use crate::{MappingError, Result};

/// Environment variable names
mod vars {
    pub const ENUM_HANDLING: &str = "ROWBIND_ENUM_HANDLING";
    pub const MATCH_UNDERSCORES: &str = "ROWBIND_MATCH_UNDERSCORES";
    pub const PARAMETER_PREFIX: &str = "ROWBIND_PARAMETER_PREFIX";
    pub const ROUTINE_WARN_THRESHOLD: &str = "ROWBIND_ROUTINE_WARN_THRESHOLD";
}

/// Load configuration from environment variables
///
/// # Errors
///
/// See [`load_from_lookup`].
pub fn load_from_env(builder: ConfigBuilder) -> Result<ConfigBuilder> {
    load_from_lookup(builder, |name| std::env::var(name).ok())
}

/// Load configuration from any name-to-value lookup
///
/// # Errors
///
/// Returns an invalid-policy error for an unknown enum handling mode and an
/// invalid-configuration error for any other unparsable value.
pub fn load_from_lookup<F>(mut builder: ConfigBuilder, lookup: F) -> Result<ConfigBuilder>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(policy) = lookup(vars::ENUM_HANDLING) {
        builder = builder.enum_handling(policy.parse::<InvalidEnumValueHandling>()?);
    }

    if let Some(val) = lookup(vars::MATCH_UNDERSCORES) {
        builder = builder.match_names_with_underscores(parse_bool(vars::MATCH_UNDERSCORES, &val)?);
    }

    if let Some(prefix) = lookup(vars::PARAMETER_PREFIX) {
        builder = builder.parameter_prefix(prefix);
    }

    if let Some(val) = lookup(vars::ROUTINE_WARN_THRESHOLD) {
        let threshold = val.trim().parse::<usize>().map_err(|e| {
            MappingError::invalid_config(format!(
                "Invalid {}: {}",
                vars::ROUTINE_WARN_THRESHOLD,
                e
            ))
        })?;
        builder = builder.routine_warn_threshold(threshold);
    }

    Ok(builder)
}

fn parse_bool(name: &str, s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(MappingError::invalid_config(format!(
            "Invalid {name}: expected a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let config = load_from_lookup(ConfigBuilder::new(), lookup(&[])).unwrap().build();
        assert_eq!(config, ConfigBuilder::new().build());
    }

    #[test]
    fn test_all_variables() {
        let config = load_from_lookup(
            ConfigBuilder::new(),
            lookup(&[
                ("ROWBIND_ENUM_HANDLING", "UseDefault"),
                ("ROWBIND_MATCH_UNDERSCORES", "yes"),
                ("ROWBIND_PARAMETER_PREFIX", "$"),
                ("ROWBIND_ROUTINE_WARN_THRESHOLD", "64"),
            ]),
        )
        .unwrap()
        .build();

        assert_eq!(config.enum_handling, InvalidEnumValueHandling::UseDefault);
        assert!(config.match_names_with_underscores);
        assert_eq!(config.parameter_prefix.as_deref(), Some("$"));
        assert_eq!(config.routine_warn_threshold, Some(64));
    }

    #[test]
    fn test_env_overrides_builder() {
        let builder = ConfigBuilder::new().enum_handling(InvalidEnumValueHandling::Cast);
        let config = load_from_lookup(builder, lookup(&[("ROWBIND_ENUM_HANDLING", "throw")]))
            .unwrap()
            .build();
        assert_eq!(config.enum_handling, InvalidEnumValueHandling::ThrowError);
    }

    #[test]
    fn test_invalid_values() {
        let invalid = |name: &str, value: &str| {
            load_from_lookup(ConfigBuilder::new(), lookup(&[(name, value)])).unwrap_err()
        };

        let err = invalid("ROWBIND_ENUM_HANDLING", "maybe");
        assert!(err.is_invalid_policy());

        let err = invalid("ROWBIND_MATCH_UNDERSCORES", "sometimes");
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("ROWBIND_MATCH_UNDERSCORES"));

        let err = invalid("ROWBIND_ROUTINE_WARN_THRESHOLD", "-1");
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(parse_bool("X", "").is_err());
    }
}
