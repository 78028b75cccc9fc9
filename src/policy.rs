//! # Metadata Policies
//!
//! A superior constrains a subordinate's self-declared metadata through the
//! `metadata_policy` member of the Entity Statement it issues. Applying the
//! policy derives the subordinate's effective metadata.

use serde_json::{Map, Value};

use crate::document::EntityStatement;

/// Apply a superior's metadata policies to an entity's metadata.
///
/// When the statement carries no `metadata_policy`, `entity_metadata` is
/// returned unchanged. Otherwise the result contains only the keys named in
/// the policy: keys the entity declares but the policy does not mention are
/// dropped, and policy keys the entity does not declare are skipped.
///
/// Per-key operator precedence: `value` (hard override), `add` (appended to
/// the existing array, or used alone when the existing value is not an
/// array), `subset_of`, `one_of`, `superset_of` (each keeping or dropping
/// the existing value), and otherwise the raw value passes through
/// unchanged.
#[must_use]
pub fn apply_metadata_policies(
    entity_metadata: Map<String, Value>, subordinate_statement: &EntityStatement,
) -> Map<String, Value> {
    let Some(policies) = &subordinate_statement.payload.metadata_policy else {
        return entity_metadata;
    };

    let mut result = Map::new();
    for (key, policy) in policies {
        let Some(value) = entity_metadata.get(key) else {
            continue;
        };

        let merged = if let Some(replacement) = &policy.value {
            Some(replacement.clone())
        } else if let Some(additions) = &policy.add {
            let mut items = value.as_array().cloned().unwrap_or_default();
            items.extend(additions.iter().cloned());
            Some(Value::Array(items))
        } else if let (Some(allowed), Some(items)) = (&policy.subset_of, value.as_array()) {
            items.iter().all(|item| allowed.contains(item)).then(|| value.clone())
        } else if let Some(allowed) = &policy.one_of {
            allowed.contains(value).then(|| value.clone())
        } else if let (Some(required), Some(items)) = (&policy.superset_of, value.as_array()) {
            required.iter().all(|item| items.contains(item)).then(|| value.clone())
        } else {
            Some(value.clone())
        };

        if let Some(merged) = merged {
            result.insert(key.clone(), merged);
        }
    }

    result
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::document::{MetadataPolicy, StatementClaims};

    fn statement(policies: &[(&str, MetadataPolicy)]) -> EntityStatement {
        EntityStatement {
            payload: StatementClaims {
                iss: "https://intermediate.example".into(),
                sub: "https://leaf.example".into(),
                metadata_policy: Some(
                    policies.iter().map(|(k, p)| ((*k).to_string(), p.clone())).collect(),
                ),
                ..StatementClaims::default()
            },
            ..EntityStatement::default()
        }
    }

    fn metadata(value: Value) -> Map<String, Value> {
        value.as_object().expect("should be an object").clone()
    }

    #[test]
    fn no_policy_passes_metadata_through() {
        let entity_metadata = metadata(json!({"a": [1, 2], "b": "kept"}));
        let statement = EntityStatement::default();

        let merged = apply_metadata_policies(entity_metadata.clone(), &statement);
        assert_eq!(merged, entity_metadata);
    }

    #[test]
    fn add_appends_to_existing_array() {
        let statement = statement(&[(
            "a",
            MetadataPolicy { add: Some(vec![json!(3)]), ..MetadataPolicy::default() },
        )]);

        let merged = apply_metadata_policies(metadata(json!({"a": [1, 2]})), &statement);
        assert_eq!(merged, metadata(json!({"a": [1, 2, 3]})));
    }

    #[test]
    fn add_to_non_array_uses_additions_alone() {
        let statement = statement(&[(
            "a",
            MetadataPolicy { add: Some(vec![json!(3)]), ..MetadataPolicy::default() },
        )]);

        let merged = apply_metadata_policies(metadata(json!({"a": "scalar"})), &statement);
        assert_eq!(merged, metadata(json!({"a": [3]})));
    }

    #[test]
    fn value_overrides_unconditionally() {
        let statement = statement(&[(
            "a",
            MetadataPolicy { value: Some(json!("x")), ..MetadataPolicy::default() },
        )]);

        let merged = apply_metadata_policies(metadata(json!({"a": [1, 2]})), &statement);
        assert_eq!(merged, metadata(json!({"a": "x"})));
    }

    #[test]
    fn unconstrained_keys_are_dropped() {
        let statement = statement(&[(
            "a",
            MetadataPolicy { add: Some(vec![json!(3)]), ..MetadataPolicy::default() },
        )]);

        let merged =
            apply_metadata_policies(metadata(json!({"a": [1], "unconstrained": true})), &statement);
        assert_eq!(merged, metadata(json!({"a": [1, 3]})));
    }

    #[test]
    fn absent_keys_are_skipped() {
        let statement = statement(&[(
            "missing",
            MetadataPolicy { value: Some(json!("x")), ..MetadataPolicy::default() },
        )]);

        let merged = apply_metadata_policies(metadata(json!({"a": [1]})), &statement);
        assert!(merged.is_empty());
    }

    #[test]
    fn subset_of_keeps_contained_arrays() {
        let policy = MetadataPolicy {
            subset_of: Some(vec![json!("ES256"), json!("EdDSA")]),
            ..MetadataPolicy::default()
        };

        let stmt = statement(&[("alg_values", policy.clone())]);
        let merged =
            apply_metadata_policies(metadata(json!({"alg_values": ["EdDSA"]})), &stmt);
        assert_eq!(merged, metadata(json!({"alg_values": ["EdDSA"]})));

        let stmt = statement(&[("alg_values", policy)]);
        let merged =
            apply_metadata_policies(metadata(json!({"alg_values": ["RS256"]})), &stmt);
        assert!(merged.is_empty());
    }

    #[test]
    fn one_of_keeps_members() {
        let policy = MetadataPolicy {
            one_of: Some(vec![json!("code"), json!("token")]),
            ..MetadataPolicy::default()
        };

        let stmt = statement(&[("response_type", policy.clone())]);
        let merged =
            apply_metadata_policies(metadata(json!({"response_type": "code"})), &stmt);
        assert_eq!(merged, metadata(json!({"response_type": "code"})));

        let stmt = statement(&[("response_type", policy)]);
        let merged =
            apply_metadata_policies(metadata(json!({"response_type": "id_token"})), &stmt);
        assert!(merged.is_empty());
    }

    #[test]
    fn superset_of_requires_every_item() {
        let policy = MetadataPolicy {
            superset_of: Some(vec![json!("openid")]),
            ..MetadataPolicy::default()
        };

        let stmt = statement(&[("scopes", policy.clone())]);
        let merged =
            apply_metadata_policies(metadata(json!({"scopes": ["openid", "profile"]})), &stmt);
        assert_eq!(merged, metadata(json!({"scopes": ["openid", "profile"]})));

        let stmt = statement(&[("scopes", policy)]);
        let merged = apply_metadata_policies(metadata(json!({"scopes": ["profile"]})), &stmt);
        assert!(merged.is_empty());
    }

    #[test]
    fn unmatched_operators_pass_value_through() {
        // subset_of over a non-array value falls through to passthrough
        let statement = statement(&[(
            "a",
            MetadataPolicy { subset_of: Some(vec![json!(1)]), ..MetadataPolicy::default() },
        )]);

        let merged = apply_metadata_policies(metadata(json!({"a": "scalar"})), &statement);
        assert_eq!(merged, metadata(json!({"a": "scalar"})));
    }
}
