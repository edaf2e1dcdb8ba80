//! Configuration builder

use serde::Deserialize;

use crate::coercion::InvalidEnumValueHandling;

/// Settings baked into every routine a mapper builds.
///
/// Changing any of them means building a new mapper; routines already built
/// keep the settings they were built with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub enum_handling: InvalidEnumValueHandling,
    /// Let `user_name` bind `UserName` when no closer match exists.
    pub match_names_with_underscores: bool,
    /// Overrides the parameter prefix the sink reports.
    pub parameter_prefix: Option<String>,
    /// Log one warning when the routine cache grows past this many entries.
    pub routine_warn_threshold: Option<usize>,
}

impl MapperConfig {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`MapperConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    enum_handling: Option<InvalidEnumValueHandling>,
    match_names_with_underscores: Option<bool>,
    parameter_prefix: Option<String>,
    routine_warn_threshold: Option<usize>,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enum_handling: None,
            match_names_with_underscores: None,
            parameter_prefix: None,
            routine_warn_threshold: None,
        }
    }

    #[must_use]
    pub const fn enum_handling(mut self, policy: InvalidEnumValueHandling) -> Self {
        self.enum_handling = Some(policy);
        self
    }

    #[must_use]
    pub const fn match_names_with_underscores(mut self, enabled: bool) -> Self {
        self.match_names_with_underscores = Some(enabled);
        self
    }

    #[must_use]
    pub fn parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn routine_warn_threshold(mut self, threshold: usize) -> Self {
        self.routine_warn_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn build(self) -> MapperConfig {
        MapperConfig {
            enum_handling: self.enum_handling.unwrap_or_default(),
            match_names_with_underscores: self.match_names_with_underscores.unwrap_or(false),
            parameter_prefix: self.parameter_prefix,
            routine_warn_threshold: self.routine_warn_threshold,
        }
    }
}
