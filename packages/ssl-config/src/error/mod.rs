pub(crate) mod constructors;
pub mod types;

pub(crate) use constructors::*;
pub use types::{Error, Kind, Result};

impl From<crate::config::ConfigurationError> for Error {
    fn from(e: crate::config::ConfigurationError) -> Self {
        configuration(e)
    }
}
