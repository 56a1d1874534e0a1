//! # Resource Proxies
//!
//! A [`Resource`] is the local stand-in for one remote entity. It is cheap to
//! build from an identifier and does no I/O until a field is read.
//!
//! ## Load States
//!
//! ```text
//! Unloaded --(read of an uncached field)--> Loaded
//! ```
//!
//! There is no way back to `Unloaded`. Proxies built from a page item start
//! out `Loaded`.
//!
//! ## Reads
//!
//! [`Resource::get`] checks the field against the type's schema, then serves
//! it from the cache. An uncached field on an unloaded proxy triggers exactly
//! one full-record fetch. Once loaded, an absent optional field reads as
//! [`FieldValue::Null`] without refetching, and an absent required field is a
//! [`SparkError::MissingRequiredField`].
//!
//! An undecodable fetch body leaves the proxy unloaded with nothing cached.
//!
//! ## Writes
//!
//! [`Resource::set`] only accepts mutable fields. The remote update happens
//! first; the cache changes only if it succeeds.
//!
//! ## Deletion
//!
//! After a successful [`Resource::delete`], cached fields stay readable but
//! anything that would reach the remote fails with [`SparkError::Deleted`].

use crate::container::Container;
use crate::error::{Result, SparkError};
use crate::ident::{DecodedId, ResourceId, ResourceType};
use crate::schema::{schema_for, PropertySpec, Schema};
use crate::session::Spark;
use crate::transport::{Request, Transport};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

const WEB_BASE: &str = "https://web.ciscospark.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

#[derive(Debug, Clone)]
struct ProxyState {
    load: LoadState,
    loaded_at: Option<DateTime<Utc>>,
    /// Raw wire values of declared fields. Null values are never stored.
    fields: HashMap<String, Value>,
    deleted: bool,
}

impl ProxyState {
    fn unloaded() -> Self {
        Self {
            load: LoadState::Unloaded,
            loaded_at: None,
            fields: HashMap::new(),
            deleted: false,
        }
    }
}

pub struct Resource<'s, T: Transport> {
    session: &'s Spark<T>,
    id: ResourceId,
    decoded: DecodedId,
    parent: Option<ResourceId>,
    state: RefCell<ProxyState>,
}

impl<'s, T: Transport> Resource<'s, T> {
    /// An unloaded proxy. No remote calls.
    pub(crate) fn new(
        session: &'s Spark<T>,
        id: ResourceId,
        parent: Option<ResourceId>,
    ) -> Result<Self> {
        let decoded = id.decode()?;
        Ok(Self {
            session,
            id,
            decoded,
            parent,
            state: RefCell::new(ProxyState::unloaded()),
        })
    }

    /// A loaded proxy built from a record the service already returned.
    pub(crate) fn from_record(
        session: &'s Spark<T>,
        resource_type: ResourceType,
        record: &Value,
        parent: Option<ResourceId>,
    ) -> Result<Self> {
        let record = record.as_object().ok_or_else(|| {
            SparkError::UnexpectedResponse(format!("{} record is not an object", resource_type))
        })?;
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SparkError::UnexpectedResponse(format!("{} record has no id", resource_type))
            })?;
        let proxy = Self::new(session, ResourceId::parse(id)?, parent)?;
        proxy.populate(record);
        Ok(proxy)
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn uuid(&self) -> &str {
        &self.decoded.uuid
    }

    pub fn parent_uuid(&self) -> Option<&str> {
        self.decoded.parent_uuid.as_deref()
    }

    pub fn region(&self) -> &str {
        &self.decoded.region
    }

    pub fn resource_type(&self) -> ResourceType {
        self.decoded.resource_type
    }

    /// The resource whose relationship collection produced this proxy.
    pub fn parent(&self) -> Option<&ResourceId> {
        self.parent.as_ref()
    }

    pub fn session(&self) -> &'s Spark<T> {
        self.session
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state() == LoadState::Loaded
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().loaded_at
    }

    pub fn is_deleted(&self) -> bool {
        self.state.borrow().deleted
    }

    /// Path of this resource relative to the API base.
    pub fn url(&self) -> String {
        format!("{}/{}", self.resource_type().path(), self.id)
    }

    pub fn schema(&self) -> &'static Schema {
        schema_for(self.resource_type())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.schema().names()
    }

    fn spec(&self, name: &str) -> Result<&'static PropertySpec> {
        self.schema()
            .get(name)
            .ok_or_else(|| SparkError::UnknownAttribute {
                resource: self.resource_type().to_string(),
                name: name.to_string(),
            })
    }

    fn cached(&self, name: &str) -> Option<Value> {
        self.state.borrow().fields.get(name).cloned()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_deleted() {
            Err(SparkError::Deleted(self.id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Cache the declared fields of `record` and mark the proxy loaded.
    fn populate(&self, record: &Map<String, Value>) {
        let schema = self.schema();
        let mut state = self.state.borrow_mut();
        for (name, value) in record {
            if schema.get(name).is_none() {
                warn!("Ignoring extra field {}.{}", schema.resource_type, name);
                continue;
            }
            if value.is_null() {
                state.fields.remove(name);
            } else {
                state.fields.insert(name.clone(), value.clone());
            }
        }
        state.load = LoadState::Loaded;
        state.loaded_at = Some(Utc::now());
    }

    fn fetch(&self) -> Result<()> {
        self.ensure_live()?;
        debug!("Fetching {} {}", self.resource_type(), self.id);
        let response = self.session.transport().request(&Request::get(self.url()))?;
        if !response.is_success() {
            return Err(SparkError::RequestFailed {
                status: response.status,
                body: response.body,
            });
        }
        match response.json() {
            Ok(Value::Object(record)) => self.populate(&record),
            Ok(other) => warn!("Expected a record for {}, got {}", self.id, other),
            Err(e) => warn!("Could not decode record for {}: {}", self.id, e),
        }
        Ok(())
    }

    /// Read a field, fetching the record first if needed.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        let spec = self.spec(name)?;

        if !self.is_loaded() && self.cached(name).is_none() {
            self.fetch()?;
        }

        match self.cached(name) {
            Some(raw) => FieldValue::coerce(spec, &raw, &self.id),
            None if spec.optional => Ok(FieldValue::Null),
            None => Err(SparkError::MissingRequiredField {
                resource: self.resource_type().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Write a mutable field through to the remote.
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let spec = self.spec(name)?;
        if !spec.mutable {
            return Err(SparkError::ReadOnlyField {
                resource: self.resource_type().to_string(),
                name: name.to_string(),
            });
        }
        let value = value.into();
        value.check_kind(spec)?;
        self.ensure_live()?;

        // Some endpoints reject an update that does not resend its companions.
        if !self.is_loaded() {
            self.fetch()?;
        }

        let mut body = Map::new();
        {
            let state = self.state.borrow();
            for companion in self.schema().update_companions {
                if let Some(current) = state.fields.get(*companion) {
                    body.insert(companion.to_string(), current.clone());
                }
            }
        }
        body.insert(name.to_string(), value.to_json());

        debug!("Updating {}.{} on {}", self.resource_type(), name, self.id);
        let response = self
            .session
            .transport()
            .request(&Request::put(self.url(), Value::Object(body)))?;
        if !response.is_success() {
            return Err(SparkError::RemoteUpdateFailed {
                status: response.status,
                body: response.body,
            });
        }

        let mut state = self.state.borrow_mut();
        if value.is_null() {
            state.fields.remove(name);
        } else {
            state.fields.insert(name.to_string(), value.to_json());
        }
        Ok(())
    }

    /// Delete the remote resource. Only `204` with an empty body counts.
    pub fn delete(&self) -> Result<()> {
        self.ensure_live()?;
        debug!("Deleting {} {}", self.resource_type(), self.id);
        let response = self
            .session
            .transport()
            .request(&Request::delete(self.url()))?;
        if response.status != 204 || !response.body.trim().is_empty() {
            return Err(SparkError::DeleteFailed {
                status: response.status,
                body: response.body,
            });
        }
        self.state.borrow_mut().deleted = true;
        Ok(())
    }

    /// Every declared field in schema order, fetching once if unloaded.
    ///
    /// Absent fields come back as `Null`, whether optional or not.
    pub fn snapshot(&self) -> Result<Vec<(&'static str, FieldValue)>> {
        if !self.is_loaded() {
            self.fetch()?;
        }
        self.schema()
            .properties
            .iter()
            .map(|spec| -> Result<(&'static str, FieldValue)> {
                let value = match self.cached(spec.name) {
                    Some(raw) => FieldValue::coerce(spec, &raw, &self.id)?,
                    None => FieldValue::Null,
                };
                Ok((spec.name, value))
            })
            .collect()
    }

    /// First address in `emails`.
    pub fn email(&self) -> Result<Option<String>> {
        Ok(self
            .get("emails")?
            .as_list()
            .and_then(|emails| emails.first().cloned()))
    }

    fn no_relation(&self, name: &str) -> SparkError {
        SparkError::UnknownAttribute {
            resource: self.resource_type().to_string(),
            name: name.to_string(),
        }
    }

    fn related(&self, resource_type: ResourceType, params: &[(&str, &str)]) -> Container<'s, T> {
        let params: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Container::new(self.session, resource_type, params, Some(self.id.clone()))
    }

    /// Memberships of a room or team.
    pub fn members(&self) -> Result<Container<'s, T>> {
        match self.resource_type() {
            ResourceType::Rooms => Ok(self.related(
                ResourceType::Memberships,
                &[("roomId", self.id.as_str())],
            )),
            ResourceType::Teams => Ok(self.related(
                ResourceType::TeamMemberships,
                &[("teamId", self.id.as_str())],
            )),
            _ => Err(self.no_relation("members")),
        }
    }

    /// Messages of a room.
    ///
    /// Bots only see group messages that mention them, so for a bot owner in
    /// a group room the listing is filtered to `mentionedPeople=me`.
    pub fn messages(&self) -> Result<Container<'s, T>> {
        if self.resource_type() != ResourceType::Rooms {
            return Err(self.no_relation("messages"));
        }
        let group = self.get("type")?.as_text() == Some("group");
        if group && self.session.is_bot()? {
            Ok(self.related(
                ResourceType::Messages,
                &[("roomId", self.id.as_str()), ("mentionedPeople", "me")],
            ))
        } else {
            Ok(self.related(ResourceType::Messages, &[("roomId", self.id.as_str())]))
        }
    }

    /// Rooms belonging to a team.
    pub fn subrooms(&self) -> Result<Container<'s, T>> {
        match self.resource_type() {
            ResourceType::Teams => Ok(self.related(
                ResourceType::Rooms,
                &[("teamId", self.id.as_str()), ("sortBy", "id")],
            )),
            _ => Err(self.no_relation("subrooms")),
        }
    }

    /// Link to the resource in the web client.
    pub fn web_link(&self) -> Result<String> {
        match self.resource_type() {
            ResourceType::Rooms => Ok(format!("{}/rooms/{}/chat", WEB_BASE, self.uuid())),
            ResourceType::Teams => Ok(format!("{}/teams/{}", WEB_BASE, self.id)),
            _ => Err(self.no_relation("web_link")),
        }
    }
}

impl<T: Transport> Clone for Resource<'_, T> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            id: self.id.clone(),
            decoded: self.decoded.clone(),
            parent: self.parent.clone(),
            state: RefCell::new(self.state.borrow().clone()),
        }
    }
}

impl<T: Transport> fmt::Debug for Resource<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type", &self.resource_type())
            .field("id", &self.id.as_str())
            .field("load", &self.load_state())
            .finish()
    }
}

impl<T: Transport> fmt::Display for Resource<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.resource_type(), self.id)
    }
}

// Identity is the decoded uuid pair; region, type label and field state
// play no part.
impl<T: Transport> PartialEq for Resource<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.decoded.uuid == other.decoded.uuid
            && self.decoded.parent_uuid == other.decoded.parent_uuid
    }
}

impl<T: Transport> Eq for Resource<'_, T> {}

impl<T: Transport> Hash for Resource<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.decoded.uuid.hash(state);
        self.decoded.parent_uuid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{encode, encode_compound, encode_in};
    use crate::transport::memory::MemTransport;
    use crate::transport::Response;
    use serde_json::json;
    use std::collections::HashSet;

    const ROOM_UUID: &str = "bbceb1ad-43f1-3b58-9147-f14bb0c4d154";

    fn room_id() -> ResourceId {
        encode(ResourceType::Rooms, ROOM_UUID).unwrap()
    }

    fn seeded() -> MemTransport {
        let transport = MemTransport::new();
        transport
            .insert(
                ResourceType::Rooms,
                json!({
                    "id": room_id().as_str(),
                    "title": "Lunch",
                    "type": "group",
                    "created": "2017-08-26T12:01:36.373Z",
                    "creatorId": "someone",
                    "isLocked": null,
                }),
            )
            .unwrap();
        transport
    }

    #[test]
    fn new_proxy_is_unloaded_and_silent() {
        let transport = seeded();
        let spark = Spark::new(&transport);
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert_eq!(room.load_state(), LoadState::Unloaded);
        assert!(room.loaded_at().is_none());
        assert_eq!(room.uuid(), ROOM_UUID);
        assert_eq!(room.url(), format!("rooms/{}", room_id()));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn null_counts_as_absent() {
        let transport = seeded();
        let spark = Spark::new(&transport);
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert!(room.get("isLocked").unwrap().is_null());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn unknown_field_fails_without_fetch() {
        let transport = seeded();
        let spark = Spark::new(&transport);
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert!(matches!(
            room.get("colour"),
            Err(SparkError::UnknownAttribute { .. })
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn fetch_error_carries_status() {
        let transport = MemTransport::new();
        let spark = Spark::new(&transport);
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert!(matches!(
            room.get("title"),
            Err(SparkError::RequestFailed { status: 404, .. })
        ));
        assert!(!room.is_loaded());
    }

    #[test]
    fn undecodable_body_stays_unloaded() {
        let transport = seeded();
        transport.inject(Response::new(200, "<html>oops</html>"));
        let spark = Spark::new(&transport);
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert!(matches!(
            room.get("title"),
            Err(SparkError::MissingRequiredField { .. })
        ));
        assert!(!room.is_loaded());
        // the next read tries again
        assert_eq!(room.get("title").unwrap().as_text(), Some("Lunch"));
    }

    #[test]
    fn equality_ignores_region_and_load_state() {
        let transport = seeded();
        let spark = Spark::new(&transport);
        let us = Resource::new(&spark, room_id(), None).unwrap();
        let eu = Resource::new(
            &spark,
            encode_in("eu", ResourceType::Rooms, ROOM_UUID).unwrap(),
            None,
        )
        .unwrap();
        us.get("title").unwrap();
        assert_eq!(us, eu);

        let mut set = HashSet::new();
        set.insert(us.clone());
        assert!(set.contains(&eu));
    }

    #[test]
    fn relationship_equality_needs_both_halves() {
        let spark = Spark::new(MemTransport::new());
        let parent = "0d0c91b6-ce60-4725-b6d0-3455d5d11ef3";
        let a = encode_compound(ResourceType::Memberships, parent, ROOM_UUID).unwrap();
        let b = encode_compound(
            ResourceType::Memberships,
            "cde1dd40-2f0d-11e5-ba9c-7b6556d2207b",
            ROOM_UUID,
        )
        .unwrap();
        let a = Resource::new(&spark, a, None).unwrap();
        let b = Resource::new(&spark, b, None).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.parent_uuid(), Some(parent));
    }

    #[test]
    fn web_links() {
        let spark = Spark::new(MemTransport::new());
        let room = Resource::new(&spark, room_id(), None).unwrap();
        assert_eq!(
            room.web_link().unwrap(),
            format!("https://web.ciscospark.com/rooms/{}/chat", ROOM_UUID)
        );
        let person = spark
            .resource(ResourceType::People, "3f2f1f5e-1111-4a4a-8b8b-123456789abc")
            .unwrap();
        assert!(person.web_link().is_err());
    }

    #[test]
    fn relationship_collections_by_type() {
        let spark = Spark::new(MemTransport::new());
        let room = Resource::new(&spark, room_id(), None).unwrap();
        let members = room.members().unwrap();
        assert_eq!(members.resource_type(), ResourceType::Memberships);
        assert_eq!(
            members.params().get("roomId").map(String::as_str),
            Some(room_id().as_str())
        );
        assert_eq!(members.parent(), Some(&room_id()));
        assert!(matches!(
            room.subrooms(),
            Err(SparkError::UnknownAttribute { .. })
        ));
    }
}
