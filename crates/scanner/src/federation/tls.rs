//! Shared TLS client configurations.
//!
//! Federation servers frequently present self-signed or mismatched
//! certificates, so two configurations are kept side by side: one verifying
//! against the webpki roots and one that accepts any certificate. Both are
//! built once per process.

use once_cell::sync::OnceCell;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;

/// Whether the peer certificate must chain to a trusted root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsMode {
    Verify,
    Insecure,
}

static VERIFYING_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();
static INSECURE_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

pub fn client_config(mode: TlsMode) -> Result<Arc<ClientConfig>, rustls::Error> {
    let cell = match mode {
        TlsMode::Verify => &VERIFYING_CONFIG,
        TlsMode::Insecure => &INSECURE_CONFIG,
    };
    cell.get_or_try_init(|| build_config(mode)).cloned()
}

fn build_config(mode: TlsMode) -> Result<Arc<ClientConfig>, rustls::Error> {
    let provider = provider();
    let algorithms = provider.signature_verification_algorithms;
    let builder =
        ClientConfig::builder_with_provider(provider).with_safe_default_protocol_versions()?;

    let config = match mode {
        TlsMode::Verify => {
            let mut root_cert_store = RootCertStore::empty();
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder
                .with_root_certificates(root_cert_store)
                .with_no_client_auth()
        }
        TlsMode::Insecure => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { algorithms }))
            .with_no_client_auth(),
    };
    Ok(Arc::new(config))
}

/// Skips chain and name validation but still checks handshake signatures,
/// so the session itself is sound even when the certificate is not trusted.
#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
