//! # Identifier Codec
//!
//! Every Spark entity is addressed by an opaque string. Under the hood it is a
//! tiny URI, UTF-8 encoded and then base64url encoded with the padding stripped:
//!
//! ```text
//! ciscospark://{region}/{TYPE}/{id-segment}
//!
//! ciscospark://us/ROOM/bbceb1ad-43f1-3b58-9147-f14bb0c4d154
//!   -> Y2lzY29zcGFyazovL3VzL1JPT00vYmJjZWIxYWQtNDNmMS0zYjU4LTkxNDctZjE0YmIwYzRkMTU0
//! ```
//!
//! `TYPE` is a fixed uppercase token looked up in [`ResourceType`]'s table.
//! The id segment is a UUID, one of the sentinel tokens `me` / `consumer`, or
//! for relationship resources (room and team memberships) `{parent}:{child}`.
//!
//! ## Validation Levels
//!
//! - [`is_identifier`]: prefix-only test. Cheap, but a `true` answer does not
//!   guarantee that [`decode`] will succeed.
//! - [`decode`]: full structural parse. This is the only real validity check.
//! - [`is_uuid`]: hyphenated UUID syntax (any version bits, since the service
//!   hands out v1 and v3 ids too) or a sentinel token.

use crate::error::{Result, SparkError};
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

pub const SCHEME: &str = "ciscospark";

/// `base64("ciscospark://")` minus the partial trailing quantum.
pub const MAGIC_PREFIX: &str = "Y2lzY29zcGFyazovL";

pub const DEFAULT_REGION: &str = "us";

/// Literal id segments for well-known singleton resources.
pub const SENTINEL_IDS: &[&str] = &["me", "consumer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Messages,
    Rooms,
    People,
    Memberships,
    Teams,
    TeamMemberships,
    Webhooks,
    Organizations,
    Licenses,
    Roles,
}

/// `(type, endpoint path, wire token)`; the single source of truth for both
/// directions of the mapping.
const TYPE_TABLE: &[(ResourceType, &str, &str)] = &[
    (ResourceType::Messages, "messages", "MESSAGE"),
    (ResourceType::Rooms, "rooms", "ROOM"),
    (ResourceType::People, "people", "PEOPLE"),
    (ResourceType::Memberships, "memberships", "MEMBERSHIP"),
    (ResourceType::Teams, "teams", "TEAM"),
    (ResourceType::TeamMemberships, "team/memberships", "TEAM_MEMBERSHIP"),
    (ResourceType::Webhooks, "webhooks", "WEBHOOK"),
    (ResourceType::Organizations, "organizations", "ORGANIZATION"),
    (ResourceType::Licenses, "licenses", "LICENSE"),
    (ResourceType::Roles, "roles", "ROLE"),
];

impl ResourceType {
    pub const ALL: [ResourceType; 10] = [
        ResourceType::Messages,
        ResourceType::Rooms,
        ResourceType::People,
        ResourceType::Memberships,
        ResourceType::Teams,
        ResourceType::TeamMemberships,
        ResourceType::Webhooks,
        ResourceType::Organizations,
        ResourceType::Licenses,
        ResourceType::Roles,
    ];

    // TYPE_TABLE is declared in variant order.
    fn entry(self) -> &'static (ResourceType, &'static str, &'static str) {
        &TYPE_TABLE[self as usize]
    }

    /// Endpoint path relative to the API base (e.g. `team/memberships`).
    pub fn path(self) -> &'static str {
        self.entry().1
    }

    /// Uppercase token used inside identifiers (e.g. `TEAM_MEMBERSHIP`).
    pub fn wire_token(self) -> &'static str {
        self.entry().2
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_matches('/');
        TYPE_TABLE
            .iter()
            .find(|(_, p, _)| *p == path)
            .map(|(rt, _, _)| *rt)
    }

    pub fn from_wire_token(token: &str) -> Option<Self> {
        TYPE_TABLE
            .iter()
            .find(|(_, _, t)| *t == token)
            .map(|(rt, _, _)| *rt)
    }

    /// Relationship resources carry `{parent}:{child}` as their id segment.
    pub fn is_relationship(self) -> bool {
        matches!(self, ResourceType::Memberships | ResourceType::TeamMemberships)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ResourceType {
    type Err = SparkError;

    /// Accepts either the endpoint path (`rooms`) or the wire token (`ROOM`).
    fn from_str(s: &str) -> Result<Self> {
        ResourceType::from_path(s)
            .or_else(|| ResourceType::from_wire_token(s))
            .ok_or_else(|| SparkError::UnknownResourceType(s.to_string()))
    }
}

/// An encoded Spark API identifier.
///
/// Construction goes through the codec, so a `ResourceId` always decodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Validate and wrap an identifier string.
    pub fn parse(raw: &str) -> Result<Self> {
        decode(raw)?;
        Ok(ResourceId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn decode(&self) -> Result<DecodedId> {
        decode(&self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ResourceId {
    type Err = SparkError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceId::parse(s)
    }
}

/// The structural components of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedId {
    pub resource_type: ResourceType,
    pub region: String,
    pub uuid: String,
    /// Only set for relationship resources.
    pub parent_uuid: Option<String>,
}

impl DecodedId {
    /// The id segment as it appears in the logical URI.
    pub fn id_segment(&self) -> String {
        match &self.parent_uuid {
            Some(parent) => format!("{}:{}", parent, self.uuid),
            None => self.uuid.clone(),
        }
    }

    pub fn encode(&self) -> ResourceId {
        ResourceId(encode_uri(
            &self.region,
            self.resource_type,
            &self.id_segment(),
        ))
    }
}

fn encode_uri(region: &str, resource_type: ResourceType, segment: &str) -> String {
    let uri = format!(
        "{}://{}/{}/{}",
        SCHEME,
        region,
        resource_type.wire_token(),
        segment
    );
    URL_SAFE_NO_PAD.encode(uri.as_bytes())
}

fn check_region(region: &str) -> Result<()> {
    let valid = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SparkError::InvalidIdentifier(format!(
            "invalid region \"{}\"",
            region
        )))
    }
}

/// Encode a non-relationship resource in the default region.
pub fn encode(resource_type: ResourceType, uuid: &str) -> Result<ResourceId> {
    encode_in(DEFAULT_REGION, resource_type, uuid)
}

/// Encode a non-relationship resource in an explicit region.
pub fn encode_in(region: &str, resource_type: ResourceType, uuid: &str) -> Result<ResourceId> {
    check_region(region)?;
    if resource_type.is_relationship() {
        return Err(SparkError::InvalidIdentifier(format!(
            "{} requires two uuids separated by a colon",
            resource_type
        )));
    }
    if !is_uuid(uuid) {
        return Err(SparkError::InvalidIdentifier(format!(
            "invalid uuid \"{}\"",
            uuid
        )));
    }
    Ok(ResourceId(encode_uri(region, resource_type, uuid)))
}

/// Encode a relationship resource (`{parent}:{child}`) in the default region.
pub fn encode_compound(
    resource_type: ResourceType,
    parent_uuid: &str,
    child_uuid: &str,
) -> Result<ResourceId> {
    encode_compound_in(DEFAULT_REGION, resource_type, parent_uuid, child_uuid)
}

pub fn encode_compound_in(
    region: &str,
    resource_type: ResourceType,
    parent_uuid: &str,
    child_uuid: &str,
) -> Result<ResourceId> {
    check_region(region)?;
    if !resource_type.is_relationship() {
        return Err(SparkError::InvalidIdentifier(format!(
            "{} does not take a parent uuid",
            resource_type
        )));
    }
    for part in [parent_uuid, child_uuid] {
        if !is_uuid(part) {
            return Err(SparkError::InvalidIdentifier(format!(
                "invalid uuid \"{}\"",
                part
            )));
        }
    }
    let segment = format!("{}:{}", parent_uuid, child_uuid);
    Ok(ResourceId(encode_uri(region, resource_type, &segment)))
}

/// Put back the `=` padding the service strips.
fn add_padding(raw: &str) -> String {
    let mut padded = raw.to_string();
    let rem = padded.len() % 4;
    if rem != 0 {
        padded.push_str(&"=".repeat(4 - rem));
    }
    padded
}

/// Decode an identifier into its components.
pub fn decode(identifier: &str) -> Result<DecodedId> {
    let invalid = |reason: &str| SparkError::InvalidIdentifier(format!("{}: {}", reason, identifier));

    if !identifier.starts_with(MAGIC_PREFIX) {
        return Err(invalid("missing ciscospark prefix"));
    }

    // Tolerate the standard alphabet as well as the url-safe one.
    let normalized: String = identifier
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE
        .decode(add_padding(&normalized))
        .map_err(|_| invalid("not base64"))?;
    let text = String::from_utf8(bytes).map_err(|_| invalid("not utf-8"))?;

    let uri = Url::parse(&text).map_err(|_| invalid("not a uri"))?;
    if uri.scheme() != SCHEME {
        return Err(invalid("wrong scheme"));
    }
    let region = uri
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing region"))?
        .to_string();

    let segments: Vec<&str> = uri
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let (token, segment) = match segments.as_slice() {
        [token, segment] if !segment.is_empty() => (*token, *segment),
        _ => return Err(invalid("expected /TYPE/id")),
    };

    let resource_type = ResourceType::from_wire_token(token)
        .ok_or_else(|| SparkError::UnknownResourceType(token.to_string()))?;

    let (parent_uuid, uuid) = if resource_type.is_relationship() {
        match segment.split_once(':') {
            Some((parent, child)) if is_uuid(parent) && is_uuid(child) => {
                (Some(parent.to_string()), child.to_string())
            }
            _ => return Err(invalid("expected parent:child uuids")),
        }
    } else if is_uuid(segment) {
        (None, segment.to_string())
    } else {
        return Err(invalid("invalid uuid"));
    };

    Ok(DecodedId {
        resource_type,
        region,
        uuid,
        parent_uuid,
    })
}

/// Prefix-only check: necessary, not sufficient, for [`decode`] to succeed.
pub fn is_identifier(candidate: &str) -> bool {
    candidate.starts_with(MAGIC_PREFIX)
}

/// Hyphenated UUID syntax, or one of the [`SENTINEL_IDS`].
pub fn is_uuid(candidate: &str) -> bool {
    if SENTINEL_IDS.contains(&candidate) {
        return true;
    }
    candidate.len() == 36 && Uuid::parse_str(candidate).is_ok()
}

/// Turn a user-supplied uuid key into an identifier for `resource_type`.
///
/// Relationship types need both halves (`parent:child`); other types take a
/// single uuid.
pub fn compound_uuid_to_identifier(resource_type: ResourceType, key: &str) -> Result<ResourceId> {
    compound_uuid_to_identifier_in(DEFAULT_REGION, resource_type, key)
}

pub fn compound_uuid_to_identifier_in(
    region: &str,
    resource_type: ResourceType,
    key: &str,
) -> Result<ResourceId> {
    let invalid = || SparkError::InvalidKey {
        resource_type: resource_type.to_string(),
        key: key.to_string(),
    };

    if resource_type.is_relationship() {
        let (parent, child) = key.split_once(':').ok_or_else(invalid)?;
        encode_compound_in(region, resource_type, parent, child).map_err(|_| invalid())
    } else {
        if key.contains(':') {
            return Err(invalid());
        }
        encode_in(region, resource_type, key).map_err(|_| invalid())
    }
}
