//! # Providers
//!
//! Capability traits implemented by callers of this crate. Trust
//! establishment consumes three external capabilities (an HTTP client, a
//! JWT signature-verification primitive, and an X.509 certificate-chain
//! verifier) and none of them carry implicit defaults:
//! every public entry point takes its provider explicitly.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::document::PublicKeyJwk;

/// A raw HTTP response as returned by the [`HttpClient`] capability.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// `HttpClient` proxies the retrieval of federation documents over HTTP.
///
/// Implementers simply implement the transport protocol and return the raw
/// response; status handling and body parsing happen in this crate. Fetch
/// timeouts are the implementer's responsibility.
pub trait HttpClient: Send + Sync {
    /// Execute a GET request against `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be executed.
    fn get(&self, url: &str) -> impl Future<Output = anyhow::Result<HttpResponse>> + Send;
}

/// Signature-verification primitive.
///
/// The single choke point through which an unverified token becomes trusted
/// for one hop of the chain delegates to this trait.
pub trait SignatureVerifier: Send + Sync {
    /// Verify the compact `token`'s signature using the public key `jwk`.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature does not verify.
    fn verify(
        &self, token: &str, jwk: &PublicKeyJwk,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Options passed through to the X.509 certificate-chain verifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct X509Options {
    /// Connection timeout, in milliseconds.
    pub connect_timeout: u32,

    /// Read timeout, in milliseconds.
    pub read_timeout: u32,

    /// Require CRL-based revocation checking.
    pub require_crl: bool,
}

impl Default for X509Options {
    fn default() -> Self {
        Self {
            connect_timeout: 10_000,
            read_timeout: 10_000,
            require_crl: true,
        }
    }
}

/// Outcome reported by the [`CertificateVerifier`] capability.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CertificateValidation {
    /// Whether the certificate chain is valid.
    pub is_valid: bool,

    /// Validation status reported by the primitive.
    pub status: String,

    /// Error message reported by the primitive, if any.
    pub error_message: Option<String>,
}

/// X.509 certificate-chain verification primitive.
pub trait CertificateVerifier: Send + Sync {
    /// Verify that `certs` (Base64-encoded, leaf first) chains up to
    /// `trust_anchor_cert`.
    ///
    /// # Errors
    ///
    /// Returns an error if verification cannot be carried out. A chain that
    /// was examined and found invalid is reported through
    /// [`CertificateValidation::is_valid`], not as an error.
    fn verify_chain(
        &self, certs: &[String], trust_anchor_cert: &str, options: &X509Options,
    ) -> impl Future<Output = anyhow::Result<CertificateValidation>> + Send;
}

/// Provider is implemented by callers to supply all capabilities trust
/// establishment consumes.
pub trait Provider: HttpClient + SignatureVerifier + CertificateVerifier {}
