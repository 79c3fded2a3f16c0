//! TLS listener setup
//!
//! Loads the PEM certificate chain and private key once at startup. Any
//! failure here is fatal: the HTTPS variant never starts without them.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

use crate::config::TlsConfig;
use crate::error::StartupError;

pub fn load_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, StartupError> {
    let certs = load_certificates(&config.cert_path)?;
    let key = load_private_key(&config.key_path)?;

    let mut server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    server_config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn open(what: &'static str, path: &str) -> Result<BufReader<File>, StartupError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| StartupError::TlsFile {
            what,
            path: path.to_string(),
            source,
        })
}

fn load_certificates(path: &str) -> Result<Vec<CertificateDer<'static>>, StartupError> {
    let mut reader = open("certificate", path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| StartupError::TlsFile {
            what: "certificate",
            path: path.to_string(),
            source,
        })?;

    if certs.is_empty() {
        return Err(StartupError::TlsMissing {
            what: "certificate",
            path: path.to_string(),
        });
    }
    Ok(certs)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, StartupError> {
    let mut reader = open("private key", path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| StartupError::TlsFile {
            what: "private key",
            path: path.to_string(),
            source,
        })?
        .ok_or_else(|| StartupError::TlsMissing {
            what: "private key",
            path: path.to_string(),
        })
}
