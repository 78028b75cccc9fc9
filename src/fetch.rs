//! # Federation Retrievals
//!
//! The three well-known HTTP retrievals federation trust establishment is
//! built on. Each is an idempotent GET requiring status 200; no retries or
//! caching occur here; all resilience is layered above.

use tracing::instrument;

use crate::document::EntityConfiguration;
use crate::error::Error;
use crate::jose::decode;
use crate::provider::{HttpClient, HttpResponse};
use crate::Result;

/// Fetch the signed Entity Configuration token an entity publishes about
/// itself.
///
/// # Errors
///
/// Returns [`Error::UnexpectedStatusCode`] on a non-200 response, or the
/// client's transport error.
#[instrument(skip(client))]
pub async fn signed_entity_configuration(
    client: &impl HttpClient, entity_base_url: &str,
) -> Result<String> {
    let url = format!("{entity_base_url}/.well-known/openid-federation");
    let response = client.get(&url).await?;

    Ok(expect_status(response, &url)?.body)
}

/// Fetch the signed Entity Statement a superior issues about the subordinate
/// identified by `subordinate_base_url`.
///
/// `federation_fetch_endpoint` is the exact endpoint published in the
/// superior's Entity Configuration metadata.
///
/// # Errors
///
/// Returns [`Error::UnexpectedStatusCode`] on a non-200 response, or the
/// client's transport error.
#[instrument(skip(client))]
pub async fn signed_entity_statement(
    client: &impl HttpClient, federation_fetch_endpoint: &str, subordinate_base_url: &str,
) -> Result<String> {
    let url =
        format!("{federation_fetch_endpoint}?sub={}", urlencoding::encode(subordinate_base_url));
    let response = client.get(&url).await?;

    Ok(expect_status(response, &url)?.body)
}

/// Fetch the federation list: the entity URLs authorized to participate in
/// the federation.
///
/// # Errors
///
/// Returns [`Error::UnexpectedStatusCode`] on a non-200 response, or
/// [`Error::FederationListParse`] if the body is not a JSON array of
/// strings.
#[instrument(skip(client))]
pub async fn federation_list(
    client: &impl HttpClient, federation_list_endpoint: &str,
) -> Result<Vec<String>> {
    let response = client.get(federation_list_endpoint).await?;
    let response = expect_status(response, federation_list_endpoint)?;

    serde_json::from_str(&response.body).map_err(|e| Error::FederationListParse {
        url: federation_list_endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Fetch and structurally parse an entity's own Entity Configuration.
///
/// Convenience over [`signed_entity_configuration`] for callers that need
/// the typed document, for example to project a Trust Anchor's
/// configuration with
/// [`TrustAnchorConfig::from_entity_configuration`](crate::TrustAnchorConfig::from_entity_configuration).
///
/// # Errors
///
/// Returns retrieval errors as above, or [`Error::ShapeMismatch`] if the
/// fetched token is not an Entity Configuration.
pub async fn entity_configuration(
    client: &impl HttpClient, entity_base_url: &str,
) -> Result<EntityConfiguration> {
    let token = signed_entity_configuration(client, entity_base_url).await?;
    EntityConfiguration::from_token(&decode(&token)?)
}

fn expect_status(response: HttpResponse, url: &str) -> Result<HttpResponse> {
    if response.status != 200 {
        return Err(Error::UnexpectedStatusCode { url: url.to_string(), status: response.status });
    }
    Ok(response)
}
