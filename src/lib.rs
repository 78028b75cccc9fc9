//! # OpenID Federation
//!
//! Trust establishment for verifiable credential wallets, based on the
//! [OpenID Federation](https://openid.net/specs/openid-federation-1_0.html)
//! specification.
//!
//! Given the base URL of a leaf entity (a credential issuer or a relying
//! party), this crate discovers, assembles, and cryptographically validates
//! the unbroken chain of signed statements that connects the entity to a
//! statically known Trust Anchor, and derives the metadata that governs how
//! the entity may be used:
//!
//! - [`build_trust_chain`] walks `authority_hints` from the leaf up to the
//!   Trust Anchor and returns the ordered token chain, with the final link
//!   verified against the Trust Anchor's keys and (when the anchor publishes
//!   a federation list) the leaf's membership checked.
//! - [`verify_trust_chain`] validates a chain link by link, with each link's
//!   signing key supplied by the next link and the final link verified by the
//!   Trust Anchor, optionally cross-validating the X.509 certificate chain in
//!   each link, and renewing the chain once on failure.
//! - [`apply_metadata_policies`] merges a superior's `metadata_policy`
//!   constraints into a subordinate's self-declared metadata.
//!
//! The HTTP client, the signature-verification primitive, and the X.509
//! certificate-chain verifier are consumed as capabilities through the
//! traits in [`provider`]; implementers supply the transport and platform
//! crypto. Every invocation is stateless aside from the caller-supplied
//! [`TrustAnchorConfig`]: chains are never cached across calls, and any
//! error means "do not trust this entity".

mod build;
mod document;
mod error;
pub mod fetch;
mod jose;
mod policy;
pub mod provider;
mod verify;

pub use build::build_trust_chain;
pub use document::{
    ChainDocument, ConfigurationClaims, EntityConfiguration, EntityMetadata, EntityStatement,
    FederationEntityMetadata, Jwks, MetadataPolicy, PublicKeyJwk, StatementClaims, TokenShape,
    TrustAnchorConfig, TrustMark, ENTITY_STATEMENT_TYP,
};
pub use error::Error;
pub use jose::{decode, verify, JwtHeader, ParsedToken};
pub use policy::apply_metadata_policies;
pub use provider::{
    CertificateValidation, CertificateVerifier, HttpClient, HttpResponse, Provider,
    SignatureVerifier, X509Options,
};
pub use verify::{renew_trust_chain, validate_trust_chain, verify_trust_chain, VerifyOptions};

/// Returns federation-specific errors.
pub type Result<T> = std::result::Result<T, Error>;
