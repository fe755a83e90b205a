use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use remoting_ssl::{SslConfiguration, SslSocketFactories, StoreType};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_rustls::TlsAcceptor;

const CA_DER: &[u8] = include_bytes!("resources/testCA/testCA.der");

fn resource(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(relative)
}

fn server_identity() -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
    let cert_pem = std::fs::read(resource("testServer/serverCert.pem")).unwrap();
    let key_pem = std::fs::read(resource("testServer/serverKey.pem")).unwrap();

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .unwrap()
        .unwrap();
    (certs, key)
}

fn server_config(require_client_auth: bool) -> ServerConfig {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut roots = RootCertStore::empty();
    roots.add(CertificateDer::from(CA_DER)).unwrap();

    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .unwrap();
    let builder = if require_client_auth {
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .unwrap();
        builder.with_client_cert_verifier(verifier)
    } else {
        builder.with_no_client_auth()
    };

    let (certs, key) = server_identity();
    builder.with_single_cert(certs, key).unwrap()
}

/// Runs one echo exchange and returns the client certificates the server saw.
async fn handshake(
    config: &SslConfiguration,
    server: ServerConfig,
) -> io::Result<Option<Vec<CertificateDer<'static>>>> {
    let factory = SslSocketFactories::create_ssl_socket_factory(config).unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(server));
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(async move {
        let mut stream = acceptor.accept(server_io).await?;
        let peer = stream
            .get_ref()
            .1
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.clone().into_owned()).collect());

        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await?;
        stream.write_all(&buf).await?;
        stream.flush().await?;
        Ok::<_, io::Error>(peer)
    });

    let mut client = factory.connect("localhost", client_io).await?;
    client.write_all(b"hello").await?;
    client.flush().await?;

    let mut echoed = [0u8; 5];
    client.read_exact(&mut echoed).await?;
    assert_eq!(&echoed, b"hello");

    server.await.map_err(io::Error::other)?
}

#[tokio::test]
async fn presents_client_certificate_from_pkcs12_key_store() {
    let config = SslConfiguration::builder()
        .trust_store_path(resource("testCA/testCATrustStore.jks"))
        .key_store_path(resource("testClient/clientKeyStore.p12"))
        .key_store_type(StoreType::Pkcs12)
        .key_store_password("multiple")
        .build()
        .unwrap();
    let expected = SslSocketFactories::create_key_material(&config)
        .unwrap()
        .unwrap();

    let peer = handshake(&config, server_config(true)).await.unwrap().unwrap();

    assert_eq!(peer.first(), expected.leaf());
}

#[tokio::test]
async fn presents_aliased_client_certificate_from_jks_key_store() {
    let config = SslConfiguration::builder()
        .trust_store_path(resource("testCA/testCATrustStore.p12"))
        .trust_store_type(StoreType::Pkcs12)
        .key_store_path(resource("multiple/multiple.jks"))
        .key_store_password("multiple")
        .key_store_key_alias("client")
        .build()
        .unwrap();

    let peer = handshake(&config, server_config(true)).await.unwrap().unwrap();
    let leaf = remoting_ssl::tls::certificate::summarize(&peer[0]).unwrap();

    assert_eq!(leaf.common_name.as_deref(), Some("client"));
}

#[tokio::test]
async fn trust_only_factory_connects_without_client_auth() {
    let config = SslConfiguration::new(resource("testCA/testCATrustStore.jks"));

    let peer = handshake(&config, server_config(false)).await.unwrap();

    assert!(peer.is_none());
}

#[tokio::test]
async fn server_requiring_client_auth_rejects_trust_only_factory() {
    let config = SslConfiguration::new(resource("testCA/testCATrustStore.jks"));

    assert!(handshake(&config, server_config(true)).await.is_err());
}

#[tokio::test]
async fn server_outside_trust_store_is_rejected() {
    // read without a password, the key entries are skipped and nothing is trusted
    let config = SslConfiguration::new(resource("multiple/multiple.jks"));
    let anchors = SslSocketFactories::create_trust_anchors(&config).unwrap();
    assert!(anchors.is_empty());

    assert!(handshake(&config, server_config(false)).await.is_err());
}

#[tokio::test]
async fn mac_protected_pkcs12_trust_store_is_read_without_password() {
    let config = SslConfiguration::builder()
        .trust_store_path(resource("testCA/testCATrustStoreMac.p12"))
        .trust_store_type(StoreType::Pkcs12)
        .build()
        .unwrap();
    let anchors = SslSocketFactories::create_trust_anchors(&config).unwrap();
    assert_eq!(anchors.len(), 1);
    assert!(anchors.contains(CA_DER));

    let peer = handshake(&config, server_config(false)).await.unwrap();

    assert!(peer.is_none());
}

#[tokio::test]
async fn encrypted_pkcs12_trust_store_trusts_nothing_without_password() {
    let config = SslConfiguration::builder()
        .trust_store_path(resource("testCA/testCATrustStoreEncrypted.p12"))
        .trust_store_type(StoreType::Pkcs12)
        .build()
        .unwrap();
    let anchors = SslSocketFactories::create_trust_anchors(&config).unwrap();
    assert!(anchors.is_empty());

    assert!(handshake(&config, server_config(false)).await.is_err());
}

#[tokio::test]
async fn invalid_host_name_is_invalid_input() {
    let config = SslConfiguration::new(resource("testCA/testCATrustStore.jks"));
    let factory = SslSocketFactories::create_ssl_socket_factory(&config).unwrap();
    let (client_io, _server_io) = tokio::io::duplex(1024);

    let err = factory.connect("not a host", client_io).await.unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
