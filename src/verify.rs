//! # Chain Verification
//!
//! Validation walks a chain by position: each element's signature must
//! verify against a key supplied by the next element, and the final element
//! against the externally supplied Trust Anchor keys. Renewal re-derives a
//! fresh chain of the same length and roles by re-fetching each element, and
//! [`verify_trust_chain`] composes the two with a single
//! renew-and-revalidate retry.

use futures::future::try_join_all;
use tracing::{instrument, trace};

use crate::document::{
    EntityConfiguration, EntityStatement, PublicKeyJwk, TokenShape, TrustAnchorConfig,
};
use crate::error::Error;
use crate::jose::{self, decode, ParsedToken};
use crate::provider::{CertificateVerifier, HttpClient, Provider, SignatureVerifier, X509Options};
use crate::{fetch, Result};

/// Options governing [`verify_trust_chain`].
#[derive(Clone, Debug)]
pub struct VerifyOptions {
    /// X.509 certificate-chain validation options. `None` skips certificate
    /// checks.
    pub x509: Option<X509Options>,

    /// Renew the chain and retry once when validation fails.
    pub renew_on_fail: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self { x509: None, renew_on_fail: true }
    }
}

/// Validate a trust chain against a known Trust Anchor.
///
/// For every index `i` below the last, the signature of element `i` must
/// verify against a key found in the `jwks` of element `i`+1; the last
/// element verifies against the Trust Anchor's keys. When `x509` options are
/// supplied, the certificate chain embedded in each verification JWK is
/// additionally validated against the Trust Anchor certificate.
///
/// All per-index validations run concurrently; the chain is valid as a whole
/// or the result is discarded, so no ordering of failure reporting is
/// guaranteed.
///
/// Returns one parsed token per chain element, in chain order.
///
/// # Errors
///
/// Returns [`Error::TrustChainEmpty`] for an empty chain, and any shape,
/// signature, or certificate error raised by a chain element.
#[instrument(skip_all)]
pub async fn validate_trust_chain(
    provider: &(impl SignatureVerifier + CertificateVerifier), trust_anchor: &TrustAnchorConfig,
    chain: &[String], x509: Option<&X509Options>,
) -> Result<Vec<ParsedToken>> {
    trace!("validate_trust_chain");

    if chain.is_empty() {
        return Err(Error::TrustChainEmpty);
    }

    // The Trust Anchor certificate is only derived when X.509 checks are on.
    let x509_context = match x509 {
        Some(options) => Some((options, trust_anchor.x509_certificate()?)),
        None => None,
    };
    let x509_context = x509_context.as_ref();

    let validations = chain.iter().enumerate().map(|(index, token)| async move {
        let kid = select_kid(chain, index)?;
        let signer_jwks = select_keys(chain, trust_anchor, index)?;

        let parsed = jose::verify(provider, token, &kid, &signer_jwks).await?;

        if let Some((options, trust_anchor_cert)) = x509_context {
            let Some(jwk) = signer_jwks.iter().find(|k| k.kid.as_deref() == Some(kid.as_str()))
            else {
                return Err(Error::Federation(format!(
                    "JWK with kid '{kid}' not found in signer's JWKS for chain element {index}, \
                     though signature verification passed"
                )));
            };
            let Some(x5c) = jwk.x5c.as_ref().filter(|certs| !certs.is_empty()) else {
                return Err(Error::MissingX509Certs { kid });
            };

            // The Trust Anchor certificate is supplied separately: when it
            // also terminates the x5c chain, strip it rather than pass it
            // twice.
            let certs = if x5c.len() > 1 && x5c.last() == Some(trust_anchor_cert) {
                &x5c[..x5c.len() - 1]
            } else {
                x5c.as_slice()
            };

            let validation = provider.verify_chain(certs, trust_anchor_cert, options).await?;
            if !validation.is_valid {
                return Err(Error::X509Validation {
                    index,
                    kid,
                    status: validation.status,
                    message: validation.error_message.unwrap_or_default(),
                });
            }
        }

        Ok(parsed)
    });

    try_join_all(validations).await
}

// Select the kid of the element at `index`, via the shape expected there.
fn select_kid(chain: &[String], index: usize) -> Result<String> {
    let Some(token) = chain.get(index) else {
        return Err(Error::TrustChainTokenMissing { index });
    };
    let document = TokenShape::of(index, chain.len()).parse(&decode(token)?)?;

    Ok(document.kid().to_string())
}

// Select the candidate keys for the element at `index`: the keys attested by
// the next element, or the Trust Anchor's keys for the last element.
fn select_keys(
    chain: &[String], trust_anchor: &TrustAnchorConfig, index: usize,
) -> Result<Vec<PublicKeyJwk>> {
    if index == chain.len() - 1 {
        return Ok(trust_anchor.keys.clone());
    }

    let next = index + 1;
    let Some(token) = chain.get(next) else {
        return Err(Error::TrustChainTokenMissing { index: next });
    };
    let document = TokenShape::of(next, chain.len()).parse(&decode(token)?)?;

    Ok(document.jwks().keys.clone())
}

/// Re-derive a fresh trust chain by re-fetching every element's latest
/// published version.
///
/// Elements are classified structurally only (renewal operates on
/// possibly-expired or possibly-invalid material): a token parsing as an
/// Entity Configuration is refetched from its issuer's well-known location;
/// a token parsing as an Entity Statement is refetched from its issuer's
/// `federation_fetch_endpoint`. Chain length and role-per-index are
/// preserved.
///
/// # Errors
///
/// Returns [`Error::TrustChainRenewal`] naming the index of an element that
/// matches neither shape, and any retrieval error.
#[instrument(skip_all)]
pub async fn renew_trust_chain(client: &impl HttpClient, chain: &[String]) -> Result<Vec<String>> {
    trace!("renew_trust_chain");

    let renewals = chain.iter().enumerate().map(|(index, token)| async move {
        let decoded = decode(token)?;

        // An Entity Configuration also satisfies the statement shape, so the
        // configuration parse takes priority.
        if let Ok(configuration) = EntityConfiguration::from_token(&decoded) {
            return fetch::signed_entity_configuration(client, &configuration.payload.iss).await;
        }
        if let Ok(statement) = EntityStatement::from_token(&decoded) {
            let superior_url = statement.payload.iss;
            let superior_token = fetch::signed_entity_configuration(client, &superior_url).await?;
            let superior = EntityConfiguration::from_token(&decode(&superior_token)?)?;

            let Some(fetch_endpoint) =
                superior.payload.metadata.federation_entity.federation_fetch_endpoint
            else {
                return Err(Error::MissingFederationFetchEndpoint {
                    entity: statement.payload.sub,
                    superior: superior_url,
                });
            };

            return fetch::signed_entity_statement(client, &fetch_endpoint, &statement.payload.sub)
                .await;
        }

        Err(Error::TrustChainRenewal { index })
    });

    try_join_all(renewals).await
}

/// Verify that a trust chain is valid, renewing it once on failure.
///
/// Runs [`validate_trust_chain`] over the supplied chain, which may have
/// been built earlier, persisted, or received from a peer. On any validation
/// failure, when [`VerifyOptions::renew_on_fail`] is set, the chain is
/// renewed via [`renew_trust_chain`] and validated once more; the second
/// outcome propagates without a further retry.
///
/// # Errors
///
/// Returns the validation error (of the retry, when one ran) or any renewal
/// error.
#[instrument(skip_all)]
pub async fn verify_trust_chain(
    provider: &impl Provider, trust_anchor: &TrustAnchorConfig, chain: &[String],
    options: &VerifyOptions,
) -> Result<Vec<ParsedToken>> {
    trace!("verify_trust_chain");

    match validate_trust_chain(provider, trust_anchor, chain, options.x509.as_ref()).await {
        Ok(parsed) => Ok(parsed),
        Err(_) if options.renew_on_fail => {
            let renewed = renew_trust_chain(provider, chain).await?;
            validate_trust_chain(provider, trust_anchor, &renewed, options.x509.as_ref()).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Unused;
    impl SignatureVerifier for Unused {
        async fn verify(&self, _: &str, _: &PublicKeyJwk) -> anyhow::Result<()> {
            unreachable!("no signature should be verified")
        }
    }
    impl CertificateVerifier for Unused {
        async fn verify_chain(
            &self, _: &[String], _: &str, _: &X509Options,
        ) -> anyhow::Result<crate::provider::CertificateValidation> {
            unreachable!("no certificate should be verified")
        }
    }

    #[tokio::test]
    async fn empty_chain_fails() {
        let trust_anchor = TrustAnchorConfig::default();

        let err = validate_trust_chain(&Unused, &trust_anchor, &[], None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::TrustChainEmpty));
    }
}
