//! Socket factory construction
//!
//! Turns an [`SslConfiguration`] into a ready-to-use rustls client context.
//! Building reads the configured files synchronously and never touches the
//! network.

use std::fmt;
use std::io;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::key::{KeyMaterial, resolve_key};
use super::trust::{TrustAnchors, resolve_trust};
use crate::config::SslConfiguration;
use crate::error::{self, Result};
use crate::store;

/// Entry points for building TLS client contexts from an
/// [`SslConfiguration`].
#[derive(Debug)]
pub enum SslSocketFactories {}

impl SslSocketFactories {
    /// Builds a socket factory trusting the configured trust store and, when
    /// a key store is configured, presenting its key for mutual TLS.
    ///
    /// # Errors
    ///
    /// Any failure to read, decode or use either store. See [`Kind`](crate::Kind).
    pub fn create_ssl_socket_factory(config: &SslConfiguration) -> Result<SslSocketFactory> {
        let client_config = Self::create_client_config(config)?;
        Ok(SslSocketFactory::new(client_config))
    }

    /// Builds the rustls client configuration backing a socket factory.
    ///
    /// # Errors
    ///
    /// See [`create_ssl_socket_factory`](Self::create_ssl_socket_factory).
    pub fn create_client_config(config: &SslConfiguration) -> Result<Arc<ClientConfig>> {
        let anchors = Self::create_trust_anchors(config)?;
        let key = Self::create_key_material(config)?;
        build_client_config(anchors, key.as_ref()).map(Arc::new)
    }

    /// Loads the trust store and returns its trusted certificates.
    ///
    /// # Errors
    ///
    /// Store errors for the trust store.
    pub fn create_trust_anchors(config: &SslConfiguration) -> Result<TrustAnchors> {
        let handle = store::load(config.trust_store_path(), config.trust_store_type(), None)?;
        Ok(resolve_trust(&handle))
    }

    /// Loads the key store, if any, and selects the client key.
    ///
    /// Returns `Ok(None)` when no key store is configured or it holds no
    /// private key.
    ///
    /// # Errors
    ///
    /// Store errors for the key store, plus alias selection errors.
    pub fn create_key_material(config: &SslConfiguration) -> Result<Option<KeyMaterial>> {
        let Some(key_store) = config.key_store() else {
            return Ok(None);
        };

        let handle = store::load(key_store.path(), key_store.store_type(), Some(key_store.password()))?;
        resolve_key(&handle, key_store.key_alias())
    }
}

fn build_client_config(anchors: TrustAnchors, key: Option<&KeyMaterial>) -> Result<ClientConfig> {
    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(anchors);
    if ignored > 0 {
        tracing::warn!(added, ignored, "skipped trust anchors rustls could not parse");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(error::context)?
        .with_root_certificates(roots);

    let client_config = match key {
        Some(key) => {
            let chain = key.certificate_chain().to_vec();
            if chain.is_empty() {
                return Err(error::context(format!(
                    "private key {} has no certificate chain",
                    key.alias()
                )));
            }
            builder
                .with_client_auth_cert(chain, key.private_key())
                .map_err(error::context)?
        }
        None => builder.with_no_client_auth(),
    };

    tracing::info!(
        roots = added,
        client_auth = key.is_some(),
        alias = key.map(KeyMaterial::alias),
        "built TLS client context"
    );

    Ok(client_config)
}

/// An immutable TLS client context. Cheap to clone and safe to share across
/// threads.
#[derive(Clone)]
pub struct SslSocketFactory {
    config: Arc<ClientConfig>,
}

impl SslSocketFactory {
    fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn client_config(&self) -> &Arc<ClientConfig> {
        &self.config
    }

    /// A connector sharing this factory's configuration.
    #[must_use]
    pub fn connector(&self) -> TlsConnector {
        TlsConnector::from(Arc::clone(&self.config))
    }

    /// Performs the client handshake over `stream`, verifying the server
    /// against `host`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `host` is not a valid DNS name or IP address, or the
    /// I/O error the handshake failed with.
    pub async fn connect<IO>(&self, host: &str, stream: IO) -> io::Result<TlsStream<IO>>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let stream = self.connector().connect(server_name, stream).await?;
        tracing::debug!(host, "TLS handshake complete");
        Ok(stream)
    }
}

impl fmt::Debug for SslSocketFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslSocketFactory")
            .field("client_auth", &self.config.client_auth_cert_resolver.has_certs())
            .finish()
    }
}
