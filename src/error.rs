//! # Federation Errors
//!
//! Every failure mode of trust establishment maps to one variant of
//! [`Error`]. Callers must treat any error as "do not trust this entity";
//! there is no degraded or partial-trust mode.

use thiserror::Error;

/// Federation trust-establishment error codes.
#[derive(Error, Debug)]
pub enum Error {
    /// A token does not match the document shape expected for its position
    /// in the chain.
    #[error("token does not match expected shape: {0}")]
    ShapeMismatch(String),

    /// No JWK in the candidate key set matches the token header `kid`.
    #[error("no key matching kid '{kid}' in candidate key set")]
    UnknownSigningKey {
        /// The `kid` from the token header.
        kid: String,
    },

    /// The signature-verification primitive rejected the token.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// The verification JWK carries no X.509 certificate chain.
    #[error("JWK with kid '{kid}' does not contain an X.509 certificate chain (x5c)")]
    MissingX509Certs {
        /// The `kid` of the offending JWK.
        kid: String,
    },

    /// The X.509 certificate chain embedded in a chain element failed
    /// validation against the Trust Anchor certificate.
    #[error("X.509 validation failed for chain element {index} (kid '{kid}'): {status}: {message}")]
    X509Validation {
        /// Chain index of the offending element.
        index: usize,
        /// The `kid` of the JWK whose `x5c` chain failed.
        kid: String,
        /// Status reported by the certificate-verification primitive.
        status: String,
        /// Message reported by the certificate-verification primitive.
        message: String,
    },

    /// The trust chain is empty.
    #[error("cannot verify an empty trust chain")]
    TrustChainEmpty,

    /// A token is unexpectedly missing from the chain during processing.
    #[error("token missing at index {index} in trust chain")]
    TrustChainTokenMissing {
        /// Index of the missing token.
        index: usize,
    },

    /// A superior's Entity Configuration exposes no
    /// `federation_fetch_endpoint`, so no statement about its subordinates
    /// can be obtained.
    #[error("missing federation_fetch_endpoint in configuration of {superior} (processing {entity})")]
    MissingFederationFetchEndpoint {
        /// The subordinate whose statement was needed.
        entity: String,
        /// The superior whose configuration lacks the endpoint.
        superior: String,
    },

    /// The Trust Anchor's signing key carries no `kid`.
    #[error("missing 'kid' in provided Trust Anchor key")]
    TrustAnchorKidMissing,

    /// The entity is absent from the Trust Anchor's federation list.
    #[error("{entity} is not authorized by the Trust Anchor's federation list")]
    RelyingPartyNotAuthorized {
        /// Base URL of the unauthorized entity.
        entity: String,
        /// The federation list endpoint that was consulted.
        list_endpoint: String,
    },

    /// The federation list response is not a JSON array of strings.
    #[error("invalid federation list received from {url}: {reason}")]
    FederationListParse {
        /// The federation list endpoint.
        url: String,
        /// The underlying parse failure.
        reason: String,
    },

    /// A chain element matched neither document shape during renewal.
    #[error("failed to renew trust chain: element #{index} failed to parse")]
    TrustChainRenewal {
        /// Index of the unparseable element.
        index: usize,
    },

    /// An HTTP retrieval returned a status other than 200.
    #[error("unexpected status code {status} from {url}")]
    UnexpectedStatusCode {
        /// The requested URL.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// The trust chain could not be built.
    #[error("cannot build trust chain: {0}")]
    BuildTrustChain(String),

    /// Other federation processing failures.
    #[error("{0}")]
    Federation(String),

    /// Failures raised by a capability (transport, platform crypto).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
