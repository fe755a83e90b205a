use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

/// A Result alias where the Err case is `remoting_ssl::Error`.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Represents errors that can occur while turning an `SslConfiguration` into a
/// socket factory.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    path: Option<PathBuf>,
    alias: Option<String>,
}

/// The category of an [`Error`]. Match on this instead of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Kind {
    /// The configuration violates one of its invariants.
    Configuration,
    /// The store file does not exist.
    StoreNotFound,
    /// The store file exists but could not be read.
    StoreRead,
    /// The store contents do not decode under the declared store type.
    StoreFormat,
    /// The password is wrong or the store has been tampered with.
    StoreIntegrity,
    /// The configured key alias has no private key entry.
    AliasNotFound,
    /// Several private keys are present and no alias selects one.
    AmbiguousKey,
    /// The TLS layer rejected the resolved trust or key material.
    Context,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                path: None,
                alias: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub(crate) fn with<E: Into<BoxError>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub(crate) fn with_path(mut self, path: impl Into<PathBuf>) -> Error {
        self.inner.path = Some(path.into());
        self
    }

    #[must_use]
    pub(crate) fn with_alias(mut self, alias: impl Into<String>) -> Error {
        self.inner.alias = Some(alias.into());
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// The store file this error relates to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// The key alias this error relates to, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.inner.alias.as_deref()
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.inner.kind == Kind::Configuration
    }

    /// Returns true for failures caused by the contents or location of a store
    /// file rather than by the configuration itself.
    #[must_use]
    pub fn is_store(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::StoreNotFound | Kind::StoreRead | Kind::StoreFormat | Kind::StoreIntegrity
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("remoting_ssl::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref path) = self.inner.path {
            f.field("path", path);
        }

        if let Some(ref alias) = self.inner.alias {
            f.field("alias", alias);
        }

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.inner.path.as_deref().map(Path::display);
        let alias = self.inner.alias.as_deref().unwrap_or_default();

        match (self.inner.kind, path) {
            (Kind::Configuration, _) => f.write_str("invalid ssl configuration")?,
            (Kind::StoreNotFound, Some(path)) => write!(f, "store file not found: {path}")?,
            (Kind::StoreRead, Some(path)) => write!(f, "failed to read store file {path}")?,
            (Kind::StoreFormat, Some(path)) => write!(f, "invalid keystore format in {path}")?,
            (Kind::StoreIntegrity, Some(path)) => write!(
                f,
                "failed to load {path}: keystore was tampered with, or password was incorrect"
            )?,
            (Kind::AliasNotFound, Some(path)) => {
                write!(f, "Could not find key with alias {alias} in {path}")?
            }
            (Kind::AmbiguousKey, Some(path)) => write!(
                f,
                "{path} holds more than one private key and no keyStoreKeyAlias selects one"
            )?,
            (Kind::StoreNotFound, None) => f.write_str("store file not found")?,
            (Kind::StoreRead, None) => f.write_str("failed to read store file")?,
            (Kind::StoreFormat, None) => f.write_str("invalid keystore format")?,
            (Kind::StoreIntegrity, None) => {
                f.write_str("keystore was tampered with, or password was incorrect")?
            }
            (Kind::AliasNotFound, None) => write!(f, "Could not find key with alias {alias}")?,
            (Kind::AmbiguousKey, None) => {
                f.write_str("more than one private key and no keyStoreKeyAlias selects one")?
            }
            (Kind::Context, _) => f.write_str("failed to build TLS client context")?,
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
