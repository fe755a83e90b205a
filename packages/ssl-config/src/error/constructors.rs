use std::io;
use std::path::Path;

use super::types::{BoxError, Error, Kind};

/// Creates an `Error` for a configuration invariant violation.
pub(crate) fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Configuration).with(e)
}

/// Creates an `Error` for a failed read of a store file, distinguishing a
/// missing file from every other I/O failure.
pub(crate) fn store_io(path: &Path, e: io::Error) -> Error {
    let kind = if e.kind() == io::ErrorKind::NotFound {
        Kind::StoreNotFound
    } else {
        Kind::StoreRead
    };
    Error::new(kind).with_path(path).with(e)
}

/// Creates an `Error` for store contents that do not match the declared type.
pub(crate) fn store_format<E: Into<BoxError>>(path: &Path, e: E) -> Error {
    Error::new(Kind::StoreFormat).with_path(path).with(e)
}

/// Creates an `Error` for a wrong password or a tampered store.
pub(crate) fn store_integrity<E: Into<BoxError>>(path: &Path, e: E) -> Error {
    Error::new(Kind::StoreIntegrity).with_path(path).with(e)
}

pub(crate) fn alias_not_found(path: &Path, alias: &str) -> Error {
    Error::new(Kind::AliasNotFound)
        .with_path(path)
        .with_alias(alias)
}

/// Creates an `Error` listing the aliases a caller could choose between.
pub(crate) fn ambiguous_key(path: &Path, aliases: &[&str]) -> Error {
    Error::new(Kind::AmbiguousKey)
        .with_path(path)
        .with(format!("candidate aliases: {}", aliases.join(", ")))
}

/// Creates an `Error` for material rustls refused to accept.
pub(crate) fn context<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Context).with(e)
}
