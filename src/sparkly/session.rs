//! The session every proxy and container hangs off.
//!
//! A [`Spark`] owns the transport and the per-session settings (region, page
//! size, length hints). Proxies and containers borrow it; they never own it.

use crate::config::SparkConfig;
use crate::container::Container;
use crate::error::{Result, SparkError};
use crate::hints::LengthHints;
use crate::ident::{
    compound_uuid_to_identifier_in, decode, is_identifier, ResourceId, ResourceType,
    DEFAULT_REGION,
};
use crate::resource::Resource;
use crate::transport::http::HttpTransport;
use crate::transport::{Request, Transport};
use once_cell::unsync::OnceCell;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

const DEFAULT_PER_PAGE: u32 = 50;

pub struct Spark<T: Transport> {
    transport: T,
    region: String,
    per_page: u32,
    hints: Rc<LengthHints>,
    /// Raw `people/me` record, fetched at most once.
    owner: OnceCell<Value>,
}

impl<T: Transport> Spark<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            region: DEFAULT_REGION.to_string(),
            per_page: DEFAULT_PER_PAGE,
            hints: Rc::new(LengthHints::new()),
            owner: OnceCell::new(),
        }
    }

    /// Region used when building identifiers from bare uuids.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Share a hint cache between sessions.
    pub fn with_hints(mut self, hints: Rc<LengthHints>) -> Self {
        self.hints = hints;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn hints(&self) -> &LengthHints {
        &self.hints
    }

    fn owner_record(&self) -> Result<&Value> {
        self.owner.get_or_try_init(|| {
            debug!("Looking up the token owner");
            let response = self.transport.request(&Request::get("people/me"))?;
            if !response.is_success() {
                return Err(SparkError::RequestFailed {
                    status: response.status,
                    body: response.body,
                });
            }
            response.json()
        })
    }

    /// The person the API token belongs to.
    pub fn me(&self) -> Result<Resource<'_, T>> {
        Resource::from_record(self, ResourceType::People, self.owner_record()?, None)
    }

    pub fn me_id(&self) -> Result<ResourceId> {
        Ok(self.me()?.id().clone())
    }

    pub fn is_bot(&self) -> Result<bool> {
        Ok(self.me()?.get("type")?.as_text() == Some("bot"))
    }

    pub fn rooms(&self) -> Container<'_, T> {
        Container::new(self, ResourceType::Rooms, BTreeMap::new(), None)
    }

    pub fn teams(&self) -> Container<'_, T> {
        Container::new(self, ResourceType::Teams, BTreeMap::new(), None)
    }

    pub fn webhooks(&self) -> Container<'_, T> {
        Container::new(self, ResourceType::Webhooks, BTreeMap::new(), None)
    }

    pub fn messages_in(&self, room: &ResourceId) -> Container<'_, T> {
        Container::new(
            self,
            ResourceType::Messages,
            [("roomId".to_string(), room.to_string())].into_iter().collect(),
            Some(room.clone()),
        )
    }

    /// Any top-level listing, with filter parameters.
    pub fn collection<K, V, I>(&self, resource_type: ResourceType, params: I) -> Container<'_, T>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Container::new(self, resource_type, params, None)
    }

    /// Search people by identifier, email or display name.
    ///
    /// The filter is picked from the shape of `query`: an identifier filters
    /// on `id`, anything containing `@` on `email`, and the rest on
    /// `displayName`.
    pub fn search_people(
        &self,
        query: &str,
        org_id: Option<&str>,
        max: Option<u32>,
    ) -> Container<'_, T> {
        let filter = if is_identifier(query) {
            "id"
        } else if query.contains('@') {
            "email"
        } else {
            "displayName"
        };
        let mut params = vec![(filter.to_string(), query.to_string())];
        if let Some(org) = org_id {
            params.push(("orgId".to_string(), org.to_string()));
        }
        if let Some(max) = max {
            params.push(("max".to_string(), max.to_string()));
        }
        self.collection(ResourceType::People, params)
    }

    /// An unloaded proxy for `key`, which may be an identifier of
    /// `resource_type` or a uuid (`parent:child` for relationships).
    ///
    /// Never contacts the remote.
    pub fn resource(&self, resource_type: ResourceType, key: &str) -> Result<Resource<'_, T>> {
        let id = self.resolve_key(resource_type, key)?;
        Resource::new(self, id, None)
    }

    /// An unloaded proxy, typed by the identifier itself.
    pub fn resource_from_id(&self, identifier: &str) -> Result<Resource<'_, T>> {
        Resource::new(self, ResourceId::parse(identifier)?, None)
    }

    pub(crate) fn resolve_key(&self, resource_type: ResourceType, key: &str) -> Result<ResourceId> {
        let invalid = || SparkError::InvalidKey {
            resource_type: resource_type.to_string(),
            key: key.to_string(),
        };

        if is_identifier(key) {
            let decoded = decode(key).map_err(|_| invalid())?;
            if decoded.resource_type != resource_type {
                return Err(invalid());
            }
            return ResourceId::parse(key);
        }
        compound_uuid_to_identifier_in(&self.region, resource_type, key)
    }
}

impl Spark<HttpTransport> {
    pub fn from_config(config: &SparkConfig) -> Result<Self> {
        Ok(Spark::new(HttpTransport::from_config(config)?)
            .with_region(config.region.clone())
            .with_per_page(config.per_page))
    }
}
