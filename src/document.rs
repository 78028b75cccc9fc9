//! # Federation Documents
//!
//! Typed bindings for the documents exchanged in an OpenID Federation: the
//! Entity Configuration an entity publishes about itself, the Entity
//! Statement a superior issues about one subordinate, and the normalized
//! Trust Anchor configuration supplied to this crate out of band.
//!
//! Two shape generations are modeled as distinct types with fallible
//! conversions: the common shape ([`EntityConfiguration`], every federation
//! endpoint optional) and the strict Trust-Anchor projection
//! ([`TrustAnchorConfig`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jose::{JwtHeader, ParsedToken};
use crate::Result;

/// The `typ` header value shared by Entity Configurations and Entity
/// Statements.
pub const ENTITY_STATEMENT_TYP: &str = "entity-statement+jwt";

/// Simplified JSON Web Key (JWK) public key structure.
///
/// Keys are handed opaquely to the signature-verification capability, so
/// key-type-specific members are kept as optional strings rather than closed
/// enums.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key identifier.
    /// For example, "_Qq0UL2Fq651Q0Fjd6TvnYE-faHiOpRlPVQcY_-tA4A".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type ("OKP", "EC", "RSA").
    pub kty: String,

    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate (OKP and EC keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate. Not required for `EdDSA` verification keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Modulus (RSA keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Exponent (RSA keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Algorithm intended for use with the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,

    /// X.509 certificate chain, Base64-encoded, leaf certificate first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
}

/// A set of JWKs.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// The set of public key JWKs.
    pub keys: Vec<PublicKeyJwk>,
}

/// A trust mark issued to an entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrustMark {
    /// Trust mark identifier.
    pub id: String,

    /// The signed trust mark token.
    pub trust_mark: String,
}

/// The `federation_entity` metadata section.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FederationEntityMetadata {
    /// Endpoint from which statements about subordinates are fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_fetch_endpoint: Option<String>,

    /// Endpoint enumerating the entities authorized by this federation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_list_endpoint: Option<String>,

    /// Endpoint resolving metadata and trust marks for an entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_resolve_endpoint: Option<String>,

    /// Endpoint reporting the status of issued trust marks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_status_endpoint: Option<String>,

    /// Endpoint enumerating entities holding a given trust mark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_list_endpoint: Option<String>,

    /// Endpoint from which trust marks are obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_trust_mark_endpoint: Option<String>,

    /// Endpoint exposing previously used signing keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_historical_keys_endpoint: Option<String>,

    /// Human-readable organization name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,

    /// Organization home page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_uri: Option<String>,

    /// Policy document location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,

    /// Logo location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,

    /// Administrative contacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<String>>,

    /// Members not bound above, passed through opaquely.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// The `metadata` member of an Entity Configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EntityMetadata {
    /// The `federation_entity` section, present in every configuration.
    pub federation_entity: FederationEntityMetadata,

    /// Entity-type sections other than `federation_entity`
    /// (`openid_credential_issuer`, `openid_relying_party`, ...), passed
    /// through opaquely.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Claims of an Entity Configuration: a token self-issued by an entity about
/// itself.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConfigurationClaims {
    /// Issuer. Equals `sub`: the document is self-signed.
    pub iss: String,

    /// Subject.
    pub sub: String,

    /// Issued-at, Unix seconds.
    pub iat: i64,

    /// Expiry, Unix seconds.
    pub exp: i64,

    /// Base URLs of this entity's immediate superiors. Empty or absent for a
    /// Trust Anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority_hints: Option<Vec<String>>,

    /// The entity's own signing keys.
    pub jwks: Jwks,

    /// Entity metadata.
    pub metadata: EntityMetadata,

    /// Claims not bound above, passed through opaquely.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// An Entity Configuration document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EntityConfiguration {
    /// The token header.
    pub header: JwtHeader,

    /// The configuration claims.
    pub payload: ConfigurationClaims,
}

impl EntityConfiguration {
    /// Structurally validate a decoded token as an Entity Configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if required claims are absent or
    /// mistyped, or the header `typ` is not `entity-statement+jwt`.
    pub fn from_token(token: &ParsedToken) -> Result<Self> {
        check_typ(&token.header)?;
        let payload = serde_json::from_value(token.payload.clone())
            .map_err(|e| Error::ShapeMismatch(format!("not an entity configuration: {e}")))?;

        Ok(Self { header: token.header.clone(), payload })
    }
}

/// Claims of an Entity Statement: a token issued by a superior about one
/// specific subordinate.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatementClaims {
    /// The issuing superior.
    pub iss: String,

    /// The subordinate the statement is about.
    pub sub: String,

    /// The subordinate's keys, as attested by the superior.
    pub jwks: Jwks,

    /// Trust marks issued to the subordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_marks: Option<Vec<TrustMark>>,

    /// Constraints the superior applies to the subordinate's self-declared
    /// metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_policy: Option<BTreeMap<String, MetadataPolicy>>,

    /// Issued-at, Unix seconds.
    pub iat: i64,

    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// An Entity Statement document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EntityStatement {
    /// The token header.
    pub header: JwtHeader,

    /// The statement claims.
    pub payload: StatementClaims,
}

impl EntityStatement {
    /// Structurally validate a decoded token as an Entity Statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if required claims are absent or
    /// mistyped, or the header `typ` is not `entity-statement+jwt`.
    pub fn from_token(token: &ParsedToken) -> Result<Self> {
        check_typ(&token.header)?;
        let payload = serde_json::from_value(token.payload.clone())
            .map_err(|e| Error::ShapeMismatch(format!("not an entity statement: {e}")))?;

        Ok(Self { header: token.header.clone(), payload })
    }
}

fn check_typ(header: &JwtHeader) -> Result<()> {
    if header.typ != ENTITY_STATEMENT_TYP {
        return Err(Error::ShapeMismatch(format!(
            "unexpected token type '{}', expected '{ENTITY_STATEMENT_TYP}'",
            header.typ
        )));
    }
    Ok(())
}

/// Operators a superior may apply to one metadata key of a subordinate.
///
/// Each policy entry carries exactly one effective operator; when several are
/// present the first in declaration order wins.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MetadataPolicy {
    /// Hard override: the subordinate's value is replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Items appended to the subordinate's array value (or used alone when
    /// the value is not an array).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<Value>>,

    /// Value to use when the subordinate declares none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// The value is kept only if every item is contained in this set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subset_of: Option<Vec<Value>>,

    /// The value is kept only if it is a member of this set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,

    /// The value is kept only if it contains every item in this set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superset_of: Option<Vec<Value>>,
}

/// Position-dependent document shape of a chain element.
///
/// Computed once per validation call from the element index and the chain
/// length: the initial state is `Leaf`, the terminal state is
/// `RootOrStatement`, and every index in between is `Middle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenShape {
    /// The first element: the leaf entity's self-signed Entity
    /// Configuration.
    Leaf,

    /// Any element between first and last: an Entity Statement issued by
    /// the entity at the next index about the entity at the previous one.
    Middle,

    /// The last element: either an Entity Statement or the Trust Anchor's
    /// own Entity Configuration.
    RootOrStatement,
}

impl TokenShape {
    /// Select the shape expected at `index` in a chain of `chain_len`
    /// elements.
    #[must_use]
    pub const fn of(index: usize, chain_len: usize) -> Self {
        if index == 0 {
            Self::Leaf
        } else if index == chain_len - 1 {
            Self::RootOrStatement
        } else {
            Self::Middle
        }
    }

    /// Structurally validate a decoded token against this shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the token does not match.
    pub fn parse(self, token: &ParsedToken) -> Result<ChainDocument> {
        match self {
            Self::Leaf => EntityConfiguration::from_token(token).map(ChainDocument::Configuration),
            Self::Middle => EntityStatement::from_token(token).map(ChainDocument::Statement),
            Self::RootOrStatement => EntityStatement::from_token(token)
                .map(ChainDocument::Statement)
                .or_else(|_| EntityConfiguration::from_token(token).map(ChainDocument::Configuration)),
        }
    }
}

/// A structurally validated chain element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainDocument {
    /// An Entity Configuration.
    Configuration(EntityConfiguration),

    /// An Entity Statement.
    Statement(EntityStatement),
}

impl ChainDocument {
    /// The signing key identifier from the document header.
    #[must_use]
    pub fn kid(&self) -> &str {
        match self {
            Self::Configuration(ec) => &ec.header.kid,
            Self::Statement(es) => &es.header.kid,
        }
    }

    /// The key set carried in the document payload.
    #[must_use]
    pub const fn jwks(&self) -> &Jwks {
        match self {
            Self::Configuration(ec) => &ec.payload.jwks,
            Self::Statement(es) => &es.payload.jwks,
        }
    }
}

/// A normalized projection of the Trust Anchor's Entity Configuration.
///
/// This is the only trust root the crate accepts, and it is supplied by the
/// caller out of band, never discovered.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrustAnchorConfig {
    /// `kid` from the Trust Anchor's Entity Configuration header,
    /// identifying its active signing key.
    pub kid: String,

    /// The Trust Anchor's signing keys.
    pub keys: Vec<PublicKeyJwk>,

    /// Endpoint from which statements about subordinates are fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_fetch_endpoint: Option<String>,

    /// Endpoint enumerating the entities authorized by this federation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_list_endpoint: Option<String>,

    /// Endpoint resolving metadata and trust marks for an entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_resolve_endpoint: Option<String>,
}

impl TrustAnchorConfig {
    /// Project a parsed Trust Anchor Entity Configuration into the
    /// normalized form consumed by chain building and validation.
    #[must_use]
    pub fn from_entity_configuration(configuration: &EntityConfiguration) -> Self {
        let federation_entity = &configuration.payload.metadata.federation_entity;

        Self {
            kid: configuration.header.kid.clone(),
            keys: configuration.payload.jwks.keys.clone(),
            federation_fetch_endpoint: federation_entity.federation_fetch_endpoint.clone(),
            federation_list_endpoint: federation_entity.federation_list_endpoint.clone(),
            federation_resolve_endpoint: federation_entity.federation_resolve_endpoint.clone(),
        }
    }

    /// Extract the Base64-encoded X.509 Trust Anchor certificate from the
    /// JWK whose `kid` matches the configuration's header `kid`.
    ///
    /// # Errors
    ///
    /// Returns an error if no JWK matches or the matching JWK carries no
    /// `x5c` certificate array.
    pub fn x509_certificate(&self) -> Result<String> {
        let Some(jwk) = self.keys.iter().find(|k| k.kid.as_deref() == Some(self.kid.as_str()))
        else {
            return Err(Error::Federation(format!(
                "cannot derive X.509 Trust Anchor certificate: no JWK with kid '{}' in Trust \
                 Anchor's JWKS",
                self.kid
            )));
        };

        match jwk.x5c.as_deref() {
            Some([root, ..]) => Ok(root.clone()),
            _ => Err(Error::Federation(format!(
                "cannot derive X.509 Trust Anchor certificate: JWK with kid '{}' does not \
                 contain a valid 'x5c' certificate array",
                self.kid
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn configuration_token() -> ParsedToken {
        ParsedToken {
            header: JwtHeader {
                typ: ENTITY_STATEMENT_TYP.into(),
                alg: "EdDSA".into(),
                kid: "leaf-1".into(),
            },
            payload: json!({
                "iss": "https://leaf.example",
                "sub": "https://leaf.example",
                "iat": 1_735_689_600,
                "exp": 1_767_225_600,
                "authority_hints": ["https://intermediate.example"],
                "jwks": {"keys": [{"kty": "OKP", "crv": "Ed25519", "kid": "leaf-1", "x": "abc"}]},
                "metadata": {
                    "federation_entity": {"organization_name": "Leaf"},
                    "openid_credential_issuer": {"credential_endpoint": "https://leaf.example/credential"}
                }
            }),
        }
    }

    #[test]
    fn shape_follows_position() {
        assert_eq!(TokenShape::of(0, 4), TokenShape::Leaf);
        assert_eq!(TokenShape::of(1, 4), TokenShape::Middle);
        assert_eq!(TokenShape::of(2, 4), TokenShape::Middle);
        assert_eq!(TokenShape::of(3, 4), TokenShape::RootOrStatement);

        // a single-element chain is a leaf configuration
        assert_eq!(TokenShape::of(0, 1), TokenShape::Leaf);
    }

    #[test]
    fn configuration_keeps_unknown_metadata() {
        let parsed =
            EntityConfiguration::from_token(&configuration_token()).expect("should parse");

        assert_eq!(
            parsed.payload.metadata.additional["openid_credential_issuer"]["credential_endpoint"],
            "https://leaf.example/credential"
        );
        assert_eq!(
            parsed.payload.metadata.federation_entity.organization_name.as_deref(),
            Some("Leaf")
        );
    }

    #[test]
    fn statement_requires_jwks() {
        let token = ParsedToken {
            header: JwtHeader {
                typ: ENTITY_STATEMENT_TYP.into(),
                alg: "EdDSA".into(),
                kid: "int-1".into(),
            },
            payload: json!({
                "iss": "https://intermediate.example",
                "sub": "https://leaf.example",
                "iat": 1_735_689_600,
                "exp": 1_767_225_600
            }),
        };

        assert!(matches!(
            EntityStatement::from_token(&token),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn rejects_wrong_typ() {
        let mut token = configuration_token();
        token.header.typ = "JWT".into();

        assert!(matches!(
            EntityConfiguration::from_token(&token),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn trust_anchor_certificate_from_matching_kid() {
        let config = TrustAnchorConfig {
            kid: "ta-1".into(),
            keys: vec![PublicKeyJwk {
                kid: Some("ta-1".into()),
                kty: "RSA".into(),
                x5c: Some(vec!["cert-root".into(), "cert-extra".into()]),
                ..PublicKeyJwk::default()
            }],
            ..TrustAnchorConfig::default()
        };

        assert_eq!(config.x509_certificate().expect("should extract"), "cert-root");
    }

    #[test]
    fn trust_anchor_certificate_requires_x5c() {
        let config = TrustAnchorConfig {
            kid: "ta-1".into(),
            keys: vec![PublicKeyJwk {
                kid: Some("ta-1".into()),
                kty: "RSA".into(),
                ..PublicKeyJwk::default()
            }],
            ..TrustAnchorConfig::default()
        };
        assert!(config.x509_certificate().is_err());

        let config = TrustAnchorConfig { kid: "absent".into(), ..TrustAnchorConfig::default() };
        assert!(config.x509_certificate().is_err());
    }
}
