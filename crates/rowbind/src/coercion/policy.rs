//! Handling of enum values that name no member.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::MappingError;

/// What to do when a raw value is not a member of the target enum.
///
/// Flag enums accept any value regardless of the policy. The policy is fixed
/// when a routine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvalidEnumValueHandling {
    /// Keep the raw value unchecked.
    Cast,
    /// Fail the row, naming the value and the enum.
    #[default]
    ThrowError,
    /// Substitute the zero value.
    UseDefault,
}

impl InvalidEnumValueHandling {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cast => "cast",
            Self::ThrowError => "throw_error",
            Self::UseDefault => "use_default",
        }
    }
}

impl fmt::Display for InvalidEnumValueHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvalidEnumValueHandling {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cast" => Ok(Self::Cast),
            "throw" | "throw_error" | "throwerror" => Ok(Self::ThrowError),
            "default" | "use_default" | "usedefault" => Ok(Self::UseDefault),
            _ => Err(MappingError::invalid_policy(s)),
        }
    }
}

impl<'de> Deserialize<'de> for InvalidEnumValueHandling {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        let cast = "Cast".parse::<InvalidEnumValueHandling>().unwrap();
        assert_eq!(cast, InvalidEnumValueHandling::Cast);
        assert_eq!(
            "ThrowError".parse::<InvalidEnumValueHandling>().unwrap(),
            InvalidEnumValueHandling::ThrowError
        );
        assert_eq!(
            " use_default ".parse::<InvalidEnumValueHandling>().unwrap(),
            InvalidEnumValueHandling::UseDefault
        );
        assert_eq!(
            "default".parse::<InvalidEnumValueHandling>().unwrap(),
            InvalidEnumValueHandling::UseDefault
        );
    }

    #[test]
    fn test_parse_invalid() {
        let err = "ignore".parse::<InvalidEnumValueHandling>().unwrap_err();
        assert!(err.is_invalid_policy());
        assert!(err.to_string().contains("ignore"));
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(InvalidEnumValueHandling::default(), InvalidEnumValueHandling::ThrowError);
        assert_eq!(InvalidEnumValueHandling::UseDefault.to_string(), "use_default");
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: InvalidEnumValueHandling,
        }
        let w: Wrapper = toml::from_str("policy = \"cast\"").unwrap();
        assert_eq!(w.policy, InvalidEnumValueHandling::Cast);
        assert!(toml::from_str::<Wrapper>("policy = \"nope\"").is_err());
    }
}
