//! JSON shape of a caveat: `{"type": <tag>, "body": <fields>}`.
//!
//! Known tags get a typed body. Anything else is kept verbatim as
//! [`Caveat::Unknown`] so tokens minted with newer caveat kinds still decode.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

use super::{ActionMask, Caveat, ResourceSet};

pub(super) const TAG_ORGANIZATION: &str = "organization";
pub(super) const TAG_APPS: &str = "apps";
pub(super) const TAG_THIRD_PARTY: &str = "3p";

#[derive(Serialize, Deserialize)]
pub(super) struct RawCaveat {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct OrganizationBody {
    id: u64,
    mask: ActionMask,
}

#[derive(Deserialize)]
struct AppsBody {
    apps: ResourceSet,
}

#[derive(Deserialize)]
struct ThirdPartyBody {
    location: String,
}

impl TryFrom<RawCaveat> for Caveat {
    type Error = serde_json::Error;

    fn try_from(raw: RawCaveat) -> Result<Self, Self::Error> {
        let caveat = match raw.tag.as_str() {
            TAG_ORGANIZATION => {
                let body: OrganizationBody = serde_json::from_value(raw.body)?;
                Caveat::OrganizationScope {
                    org_id: body.id,
                    mask: body.mask,
                }
            }
            TAG_APPS => {
                let body: AppsBody = serde_json::from_value(raw.body)?;
                Caveat::AppScope {
                    resources: body.apps,
                }
            }
            TAG_THIRD_PARTY => {
                let body: ThirdPartyBody = serde_json::from_value(raw.body)?;
                Caveat::ThirdPartyDischarge {
                    location: body.location,
                }
            }
            _ => Caveat::Unknown {
                tag: raw.tag,
                fields: raw.body,
            },
        };

        Ok(caveat)
    }
}

impl Serialize for Caveat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawCaveat::try_from(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl TryFrom<&Caveat> for RawCaveat {
    type Error = String;

    fn try_from(caveat: &Caveat) -> Result<Self, Self::Error> {
        let (tag, body) = match caveat {
            Caveat::OrganizationScope { org_id, mask } => (
                TAG_ORGANIZATION.to_owned(),
                json!({ "id": org_id, "mask": mask }),
            ),
            Caveat::AppScope { resources } => {
                // JSON object keys are strings; the ids are parsed back on decode.
                let apps: Map<String, Value> = resources
                    .iter()
                    .map(|(id, mask)| (id.to_string(), json!(mask)))
                    .collect();
                (TAG_APPS.to_owned(), json!({ "apps": apps }))
            }
            Caveat::ThirdPartyDischarge { location } => {
                (TAG_THIRD_PARTY.to_owned(), json!({ "location": location }))
            }
            Caveat::Unknown { tag, .. }
                if [TAG_ORGANIZATION, TAG_APPS, TAG_THIRD_PARTY].contains(&tag.as_str()) =>
            {
                return Err(format!("unknown caveat uses reserved tag '{tag}'"));
            }
            Caveat::Unknown { tag, fields } => (tag.clone(), fields.clone()),
        };

        Ok(Self { tag, body })
    }
}
