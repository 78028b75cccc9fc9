//! # Token Codec
//!
//! Compact signed-token handling for federation documents. [`decode`] splits
//! a compact token and decodes its header and payload without checking the
//! signature; [`verify`] is the single choke point through which an
//! unverified token becomes trusted for one hop of the chain.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::PublicKeyJwk;
use crate::error::Error;
use crate::provider::SignatureVerifier;
use crate::Result;

/// Header of a federation document token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwtHeader {
    /// Document type. Entity Configurations and Entity Statements both use
    /// `entity-statement+jwt`.
    pub typ: String,

    /// Digital signature algorithm identifier as per IANA "JSON Web
    /// Signature and Encryption Algorithms" registry.
    pub alg: String,

    /// Identifies the signing key within the issuer's JWK set.
    pub kid: String,
}

/// A decoded (header, payload) pair.
///
/// [`decode`] produces unverified instances; the instances returned from
/// chain validation have had their signature checked and may be treated as
/// verified entity/statement metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParsedToken {
    /// The token header.
    pub header: JwtHeader,

    /// The token payload.
    pub payload: Value,
}

/// Decode a compact token into its (header, payload) pair without verifying
/// the signature.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the token is not a 3-part compact
/// serialization or its segments are not base64url-encoded JSON.
pub fn decode(token: &str) -> Result<ParsedToken> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::ShapeMismatch("invalid compact token serialization".into()));
    }

    let header_raw = Base64UrlUnpadded::decode_vec(parts[0])
        .map_err(|e| Error::ShapeMismatch(format!("cannot decode token header: {e}")))?;
    let header = serde_json::from_slice(&header_raw)
        .map_err(|e| Error::ShapeMismatch(format!("cannot parse token header: {e}")))?;

    let payload_raw = Base64UrlUnpadded::decode_vec(parts[1])
        .map_err(|e| Error::ShapeMismatch(format!("cannot decode token payload: {e}")))?;
    let payload = serde_json::from_slice(&payload_raw)
        .map_err(|e| Error::ShapeMismatch(format!("cannot parse token payload: {e}")))?;

    Ok(ParsedToken { header, payload })
}

/// Verify a token signature against a candidate key set.
///
/// The JWK whose `kid` equals the token header's `kid` is selected from
/// `keys` and handed to the signature-verification primitive together with
/// the compact token. The decoded (header, payload) pair is returned only on
/// success.
///
/// # Errors
///
/// Returns [`Error::UnknownSigningKey`] if no key matches `kid`, or
/// [`Error::SignatureInvalid`] if the primitive rejects the token.
pub async fn verify(
    verifier: &impl SignatureVerifier, token: &str, kid: &str, keys: &[PublicKeyJwk],
) -> Result<ParsedToken> {
    let Some(jwk) = keys.iter().find(|k| k.kid.as_deref() == Some(kid)) else {
        return Err(Error::UnknownSigningKey { kid: kid.to_string() });
    };

    verifier.verify(token, jwk).await.map_err(|e| Error::SignatureInvalid(e.to_string()))?;

    decode(token)
}
