//! # Chain Building
//!
//! Discovery and assembly of a trust chain: walk `authority_hints` from a
//! leaf entity up to the Trust Anchor, collecting the leaf's Entity
//! Configuration, one Entity Statement per hierarchy level, and the Trust
//! Anchor's own Entity Configuration.

use tracing::{instrument, trace};

use crate::document::{EntityConfiguration, EntityStatement, TrustAnchorConfig};
use crate::error::Error;
use crate::jose::{self, decode};
use crate::provider::{HttpClient, Provider};
use crate::{fetch, Result};

/// Build a not-yet-verified trust chain for a leaf entity.
///
/// When the Trust Anchor exposes a `federation_list_endpoint`, membership of
/// `entity_base_url` is checked before any other network call. The chain is
/// then gathered from the leaf up to the Trust Anchor, and only the final
/// link's signature is verified, against the Trust Anchor's signing key.
/// Full validation of the returned chain is the caller's responsibility via
/// [`verify_trust_chain`](crate::verify_trust_chain).
///
/// Returns the signed tokens in chain order, from the leaf entity to the
/// Trust Anchor.
///
/// # Errors
///
/// Returns [`Error::RelyingPartyNotAuthorized`] if the entity is absent from
/// the federation list, [`Error::BuildTrustChain`] if the Trust Anchor
/// configuration carries no signing key or gathering produces no chain, and
/// any gathering or verification error.
#[instrument(skip(provider, trust_anchor))]
pub async fn build_trust_chain(
    provider: &impl Provider, entity_base_url: &str, trust_anchor: &TrustAnchorConfig,
) -> Result<Vec<String>> {
    trace!("build_trust_chain");

    // The Trust Anchor is assumed to publish a single signing key.
    let Some(trust_anchor_key) = trust_anchor.keys.first() else {
        return Err(Error::BuildTrustChain(
            "missing signing key in trust anchor configuration".into(),
        ));
    };

    // Authorization runs before any gathering retrieval.
    if let Some(list_endpoint) = &trust_anchor.federation_list_endpoint {
        let members = fetch::federation_list(provider, list_endpoint).await?;

        if !members.iter().any(|member| member == entity_base_url) {
            return Err(Error::RelyingPartyNotAuthorized {
                entity: entity_base_url.to_string(),
                list_endpoint: list_endpoint.clone(),
            });
        }
    }

    let chain = gather_trust_chain(provider, entity_base_url).await?;

    let Some(anchor_token) = chain.last() else {
        return Err(Error::BuildTrustChain(format!(
            "no entity configuration gathered for {entity_base_url}"
        )));
    };
    let Some(kid) = &trust_anchor_key.kid else {
        return Err(Error::TrustAnchorKidMissing);
    };
    jose::verify(provider, anchor_token, kid, std::slice::from_ref(trust_anchor_key)).await?;

    Ok(chain)
}

/// Gather the ordered, unverified token chain from `entity_base_url` up to
/// its federation's Trust Anchor.
///
/// At each level only the **first** authority hint is walked: the traversal
/// is a single deterministic path, and multi-root federations are not
/// supported.
async fn gather_trust_chain(
    client: &impl HttpClient, entity_base_url: &str,
) -> Result<Vec<String>> {
    let mut chain = Vec::new();
    let mut entity_url = entity_base_url.to_string();
    let mut is_leaf = true;

    loop {
        let entity_token = fetch::signed_entity_configuration(client, &entity_url).await?;
        let entity = EntityConfiguration::from_token(&decode(&entity_token)?)?;

        // Only the leaf contributes its own configuration; superiors are
        // represented by the statements they issue.
        if is_leaf {
            chain.push(entity_token.clone());
        }

        // No authority hints: this entity is the Trust Anchor.
        let hints = entity.payload.authority_hints.unwrap_or_default();
        let Some(superior_url) = hints.into_iter().next() else {
            if !is_leaf {
                chain.push(entity_token);
            }
            return Ok(chain);
        };

        let superior_token = fetch::signed_entity_configuration(client, &superior_url).await?;
        let superior = EntityConfiguration::from_token(&decode(&superior_token)?)?;

        let Some(fetch_endpoint) =
            superior.payload.metadata.federation_entity.federation_fetch_endpoint
        else {
            return Err(Error::MissingFederationFetchEndpoint {
                entity: entity_url,
                superior: superior_url,
            });
        };

        let statement_token =
            fetch::signed_entity_statement(client, &fetch_endpoint, &entity_url).await?;
        EntityStatement::from_token(&decode(&statement_token)?)?;
        chain.push(statement_token);

        entity_url = superior_url;
        is_leaf = false;
    }
}
