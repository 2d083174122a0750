//! Restriction clauses carried by a capability token.
//!
//! Each caveat narrows what the bearer may do. The set of kinds is open:
//! tokens may carry caveats this crate has never heard of, and those decode
//! into [`Caveat::Unknown`] instead of failing.

pub mod action;
mod wire;

use std::collections::BTreeMap;

use serde::Deserialize;

pub use action::ActionMask;

/// Discharge location of the authentication service.
pub const LOCATION_AUTHENTICATION: &str = "https://api.fly.io/aaa/v1";

/// Resource id to the actions allowed on it. Ordered by id.
pub type ResourceSet = BTreeMap<u64, ActionMask>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "wire::RawCaveat")]
pub enum Caveat {
    /// Restricts the token to one organization.
    OrganizationScope { org_id: u64, mask: ActionMask },

    /// Restricts the token to the listed apps.
    AppScope { resources: ResourceSet },

    /// Satisfied only by a discharge credential from `location`.
    ThirdPartyDischarge { location: String },

    /// Any caveat kind without dedicated handling. Kept verbatim.
    ///
    /// `tag` must not be one of the dedicated tags (`organization`, `apps`,
    /// `3p`); serializing such a caveat fails, since it could not decode back.
    Unknown {
        tag: String,
        fields: serde_json::Value,
    },
}

impl Caveat {
    /// Wire tag of this caveat kind.
    pub fn tag(&self) -> &str {
        match self {
            Self::OrganizationScope { .. } => wire::TAG_ORGANIZATION,
            Self::AppScope { .. } => wire::TAG_APPS,
            Self::ThirdPartyDischarge { .. } => wire::TAG_THIRD_PARTY,
            Self::Unknown { tag, .. } => tag.as_str(),
        }
    }
}

/// Synthetic caveats used by the `--sample-caveats` diagnostic path to
/// exercise every rendering branch against a real token.
pub fn sample_caveats() -> Vec<Caveat> {
    const SAMPLE_ORG: u64 = 9709;

    vec![
        Caveat::OrganizationScope {
            org_id: SAMPLE_ORG,
            mask: ActionMask::READ,
        },
        Caveat::OrganizationScope {
            org_id: SAMPLE_ORG,
            mask: ActionMask::READ | ActionMask::WRITE,
        },
        Caveat::OrganizationScope {
            org_id: SAMPLE_ORG,
            mask: ActionMask::WRITE,
        },
        Caveat::AppScope {
            resources: ResourceSet::from([
                (9091, ActionMask::READ),
                (2004659, ActionMask::READ | ActionMask::WRITE),
                (5392, ActionMask::WRITE),
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn organization_caveat_from_json() {
        let caveat: Caveat =
            serde_json::from_value(json!({"type": "organization", "body": {"id": 42, "mask": 3}}))
                .unwrap();
        assert_eq!(
            caveat,
            Caveat::OrganizationScope {
                org_id: 42,
                mask: ActionMask::READ | ActionMask::WRITE,
            }
        );
    }

    #[test]
    fn apps_caveat_keys_parsed_as_ids() {
        let caveat: Caveat = serde_json::from_value(
            json!({"type": "apps", "body": {"apps": {"300": 1, "12": 31}}}),
        )
        .unwrap();
        let Caveat::AppScope { resources } = caveat else {
            panic!("expected AppScope");
        };
        let ids: Vec<u64> = resources.keys().copied().collect();
        assert_eq!(ids, vec![12, 300]);
        assert_eq!(resources[&12], ActionMask::all());
    }

    #[test]
    fn third_party_caveat_from_json() {
        let caveat: Caveat = serde_json::from_value(
            json!({"type": "3p", "body": {"location": LOCATION_AUTHENTICATION}}),
        )
        .unwrap();
        assert_eq!(
            caveat,
            Caveat::ThirdPartyDischarge {
                location: LOCATION_AUTHENTICATION.to_owned(),
            }
        );
    }

    #[test]
    fn unrecognized_tag_falls_back_to_unknown() {
        let caveat: Caveat = serde_json::from_value(
            json!({"type": "machines", "body": {"machines": ["abc"], "weird": [1, {"x": null}]}}),
        )
        .unwrap();
        assert_eq!(caveat.tag(), "machines");
        let Caveat::Unknown { fields, .. } = &caveat else {
            panic!("expected Unknown");
        };
        assert_eq!(fields["machines"][0], "abc");
    }

    #[test]
    fn unknown_without_body_is_null() {
        let caveat: Caveat = serde_json::from_value(json!({"type": "if_present"})).unwrap();
        assert_eq!(
            caveat,
            Caveat::Unknown {
                tag: "if_present".to_owned(),
                fields: serde_json::Value::Null,
            }
        );
    }

    #[test]
    fn malformed_known_body_rejected() {
        let err = serde_json::from_value::<Caveat>(
            json!({"type": "organization", "body": {"id": "nope"}}),
        );
        assert!(err.is_err());

        let err = serde_json::from_value::<Caveat>(
            json!({"type": "organization", "body": {"id": 1, "mask": 64}}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn unknown_with_dedicated_tag_not_serialized() {
        for tag in ["organization", "apps", "3p"] {
            let caveat = Caveat::Unknown {
                tag: tag.to_owned(),
                fields: json!({"anything": true}),
            };
            let err = serde_json::to_string(&caveat).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{tag}: {err}");
        }
    }

    #[test]
    fn unknown_serializes_verbatim() {
        let caveat = Caveat::Unknown {
            tag: "machines".to_owned(),
            fields: json!({"machines": ["abc"]}),
        };
        let value = serde_json::to_value(&caveat).unwrap();
        assert_eq!(value, json!({"type": "machines", "body": {"machines": ["abc"]}}));
        assert_eq!(serde_json::from_value::<Caveat>(value).unwrap(), caveat);
    }

    #[test]
    fn caveat_order_survives_json() {
        let caveats = sample_caveats();
        let json = serde_json::to_string(&caveats).unwrap();
        let back: Vec<Caveat> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, caveats);
    }

    #[test]
    fn sample_caveats_cover_scopes() {
        let caveats = sample_caveats();
        let tags: Vec<&str> = caveats.iter().map(Caveat::tag).collect();
        assert_eq!(tags, ["organization", "organization", "organization", "apps"]);
    }
}
