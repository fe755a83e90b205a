//! Store container formats

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::validation::ConfigurationError;

/// The container format a trust or key store file is declared to use.
///
/// The format is never sniffed from file contents. A file whose contents do
/// not match its declared type fails to load with a `StoreFormat` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StoreType {
    /// The Java-native keystore format.
    #[default]
    Jks,
    /// PKCS#12, also known as PFX.
    Pkcs12,
}

impl StoreType {
    /// The canonical name, as accepted in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StoreType::Jks => "JKS",
            StoreType::Pkcs12 => "PKCS12",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JKS" => Ok(StoreType::Jks),
            "PKCS12" | "P12" | "PFX" => Ok(StoreType::Pkcs12),
            _ => Err(ConfigurationError::UnknownStoreType(s.to_string())),
        }
    }
}

impl TryFrom<String> for StoreType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("jks".parse::<StoreType>(), Ok(StoreType::Jks));
        assert_eq!("PKCS12".parse::<StoreType>(), Ok(StoreType::Pkcs12));
        assert_eq!("pkcs12".parse::<StoreType>(), Ok(StoreType::Pkcs12));
        assert_eq!("p12".parse::<StoreType>(), Ok(StoreType::Pkcs12));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "JCEKS".parse::<StoreType>(),
            Err(ConfigurationError::UnknownStoreType("JCEKS".to_string()))
        );
    }

    #[test]
    fn defaults_to_jks() {
        assert_eq!(StoreType::default(), StoreType::Jks);
        assert_eq!(StoreType::Pkcs12.to_string(), "PKCS12");
    }
}
