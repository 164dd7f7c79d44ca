/*!
This module defines structs that can be deserialized from the JSON (or YAML) dump of
GoBGP's `ListPath` RPC for the BGP-LS address family, and turns them into classified
`LsaRecord`s.

They follow the protobuf JSON mapping, where `google.protobuf.Any` fields are objects
carrying an `@type` URL next to the message's own fields.
*/

/*

JSON structure (one entry per destination):
[
    {
        "destination": {
            "prefix": [string],
            "paths": [
                {
                    "nlri": {
                        "@type": "type.googleapis.com/apipb.LsAddrPrefix",
                        "type": "LS_NLRI_LINK" | "LS_NLRI_NODE" | "LS_NLRI_PREFIX_V4" | ...,
                        "nlri": {
                            "@type": "type.googleapis.com/apipb.LsLinkNLRI",
                            "localNode": {
                                "asn": [int],
                                "igpRouterId": [string],
                                "pseudonode": [bool]
                            },
                            "remoteNode": { ... },
                            "linkDescriptor": { ... }
                        }
                    },
                    "pattrs": [
                        { "@type": "type.googleapis.com/apipb.OriginAttribute", ... },
                        {
                            "@type": "type.googleapis.com/apipb.LsAttribute",
                            "node": { "name": [string], ... },
                            "link": { "igpMetric": [int], ... },
                            "prefix": { ... }
                        }
                    ],
                    "best": [bool] // omitted when false
                },
                ...
            ]
        }
    },
    ...
]

*/

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::parsers::bgp_ls::record::{Attributes, LinkLsa, LsaRecord, NodeLsa, PrefixLsa};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("destination {prefix}: path NLRI has no inner LS NLRI")]
    MissingInnerNlri { prefix: String },
    #[error("destination {prefix}: {message} could not be decoded: {source}")]
    Decode {
        prefix: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("destination {prefix}: IGP metric {metric} does not fit in 32 bits")]
    MetricOutOfRange { prefix: String, metric: u64 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct ListPathResponse {
    pub destination: Destination,
}

#[derive(Debug, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub paths: Vec<Path>,
}

#[derive(Debug, Deserialize)]
pub struct Path {
    pub nlri: AnyMessage,
    #[serde(default)]
    pub pattrs: Vec<AnyMessage>,
    #[serde(default)]
    pub best: bool,
}

/// A `google.protobuf.Any` in its JSON form.
#[derive(Debug, Clone, Deserialize)]
pub struct AnyMessage {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(flatten)]
    pub fields: Attributes,
}

impl AnyMessage {
    /// Message name without the package, e.g. `LsLinkNLRI` for both the
    /// `gobgpapi.` and `apipb.` packages.
    pub fn message_name(&self) -> &str {
        self.type_url
            .rsplit(['.', '/'])
            .next()
            .unwrap_or(&self.type_url)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonNodeDescriptor {
    #[serde(default)]
    igp_router_id: String,
    #[serde(default)]
    pseudonode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonNodeNlri {
    #[serde(default)]
    local_node: JsonNodeDescriptor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLinkNlri {
    #[serde(default)]
    local_node: JsonNodeDescriptor,
    #[serde(default)]
    remote_node: JsonNodeDescriptor,
    #[serde(default)]
    link_descriptor: Option<Attributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonPrefixNlri {
    #[serde(default)]
    local_node: JsonNodeDescriptor,
    #[serde(default)]
    prefix_descriptor: Option<Attributes>,
}

/// The `node`, `link` and `prefix` sections of the LS attribute. Any of them
/// may be missing or `null` depending on how the dump was produced.
#[derive(Debug, Default, Deserialize)]
struct JsonLsAttribute {
    #[serde(default)]
    node: Option<Attributes>,
    #[serde(default)]
    link: Option<Attributes>,
    #[serde(default)]
    prefix: Option<Attributes>,
}

impl Path {
    fn ls_attribute(&self, prefix: &str) -> Result<JsonLsAttribute, ClassifyError> {
        match self.pattrs.iter().find(|p| p.message_name() == "LsAttribute") {
            Some(attr) => decode_fields(&attr.fields, prefix, "LsAttribute"),
            None => Ok(JsonLsAttribute::default()),
        }
    }

    fn inner_nlri(&self, prefix: &str) -> Result<AnyMessage, ClassifyError> {
        let inner = self
            .nlri
            .fields
            .get("nlri")
            .cloned()
            .ok_or_else(|| ClassifyError::MissingInnerNlri {
                prefix: prefix.to_string(),
            })?;
        serde_json::from_value(inner).map_err(|source| ClassifyError::Decode {
            prefix: prefix.to_string(),
            message: "LS NLRI".to_string(),
            source,
        })
    }

    /// Turns the path into one classified record.
    pub fn classify(&self, prefix: &str) -> Result<LsaRecord, ClassifyError> {
        let nlri = self.inner_nlri(prefix)?;
        let attribute = self.ls_attribute(prefix)?;
        let message = nlri.message_name();

        let record = match message {
            "LsNodeNLRI" => {
                let parsed: JsonNodeNlri = decode_fields(&nlri.fields, prefix, message)?;
                let node_attributes = attribute.node.filter(|attrs| !attrs.is_empty());
                let name = node_attributes
                    .as_ref()
                    .and_then(|attrs| attrs.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                LsaRecord::Node(NodeLsa {
                    igp_router_id: parsed.local_node.igp_router_id,
                    is_pseudonode: parsed.local_node.pseudonode,
                    name,
                    node_attributes,
                })
            }
            "LsLinkNLRI" => {
                let parsed: JsonLinkNlri = decode_fields(&nlri.fields, prefix, message)?;
                let link = attribute.link.unwrap_or_default();
                let metric = match link.get("igpMetric").and_then(Value::as_u64) {
                    Some(m) => Some(u32::try_from(m).map_err(|_| ClassifyError::MetricOutOfRange {
                        prefix: prefix.to_string(),
                        metric: m,
                    })?),
                    None => None,
                };
                let mut link_attributes = parsed.link_descriptor.unwrap_or_default();
                link_attributes.extend(link);
                LsaRecord::Link(LinkLsa {
                    local_igp_router_id: parsed.local_node.igp_router_id,
                    remote_igp_router_id: parsed.remote_node.igp_router_id,
                    remote_is_pseudonode: parsed.remote_node.pseudonode,
                    metric,
                    link_attributes,
                })
            }
            "LsPrefixV4NLRI" | "LsPrefixV6NLRI" => {
                let parsed: JsonPrefixNlri = decode_fields(&nlri.fields, prefix, message)?;
                let mut prefix_attributes = parsed.prefix_descriptor.unwrap_or_default();
                prefix_attributes.extend(attribute.prefix.unwrap_or_default());
                LsaRecord::Prefix(PrefixLsa {
                    owner_igp_router_id: parsed.local_node.igp_router_id,
                    prefix_attributes,
                })
            }
            other => LsaRecord::Unrecognized {
                kind: other.to_string(),
            },
        };
        Ok(record)
    }
}

fn decode_fields<T: serde::de::DeserializeOwned>(
    fields: &Attributes,
    prefix: &str,
    message: &str,
) -> Result<T, ClassifyError> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|source| ClassifyError::Decode {
        prefix: prefix.to_string(),
        message: message.to_string(),
        source,
    })
}

/// Classifies the best path of every destination. Destinations without a path
/// flagged `best` are skipped.
pub fn classify_destinations(
    responses: &[ListPathResponse],
) -> Result<Vec<LsaRecord>, ClassifyError> {
    let mut records = Vec::with_capacity(responses.len());
    for response in responses {
        let destination = &response.destination;
        let Some(best) = destination.paths.iter().find(|p| p.best) else {
            warn!(prefix = %destination.prefix, "destination has no best path, skipping");
            continue;
        };
        records.push(best.classify(&destination.prefix)?);
    }
    debug!(
        destinations = responses.len(),
        records = records.len(),
        "classified GoBGP BGP-LS table"
    );
    Ok(records)
}

pub fn records_from_json(json: &str) -> Result<Vec<LsaRecord>, ClassifyError> {
    let responses: Vec<ListPathResponse> = serde_json::from_str(json)?;
    classify_destinations(&responses)
}
