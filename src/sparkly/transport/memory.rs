use super::{Method, Request, Response, Transport};
use crate::error::{Result, SparkError};
use crate::ident::{ResourceId, ResourceType};
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use url::Url;

/// Base URL of the fake API; next-page links are absolute under it.
pub const MEMORY_BASE: &str = "memory://api/";

const DEFAULT_PAGE_SIZE: usize = 50;

/// In-memory fake of the Spark REST API for testing.
///
/// Uses `RefCell` for interior mutability since the object model is
/// single-threaded. Records are kept per resource type in insertion order,
/// which is also the listing order.
pub struct MemTransport {
    records: RefCell<HashMap<ResourceType, Vec<Map<String, Value>>>>,
    log: RefCell<Vec<Request>>,
    injected: RefCell<VecDeque<Response>>,
    page_size: Cell<usize>,
    owner: RefCell<Option<String>>,
}

impl Default for MemTransport {
    fn default() -> Self {
        Self {
            records: RefCell::new(HashMap::new()),
            log: RefCell::new(Vec::new()),
            injected: RefCell::new(VecDeque::new()),
            page_size: Cell::new(DEFAULT_PAGE_SIZE),
            owner: RefCell::new(None),
        }
    }
}

impl MemTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record. It must be a JSON object with a string `id`.
    pub fn insert(&self, resource_type: ResourceType, record: Value) -> Result<()> {
        let record = match record {
            Value::Object(map) if map.get("id").and_then(Value::as_str).is_some() => map,
            other => {
                return Err(SparkError::UnexpectedResponse(format!(
                    "record without an id: {}",
                    other
                )))
            }
        };
        self.records
            .borrow_mut()
            .entry(resource_type)
            .or_default()
            .push(record);
        Ok(())
    }

    /// Current stored state of a record, for assertions.
    pub fn record(&self, resource_type: ResourceType, id: &str) -> Option<Value> {
        self.records
            .borrow()
            .get(&resource_type)?
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
            .map(Value::Object)
    }

    /// The person `GET people/me` resolves to.
    pub fn set_owner(&self, person: &ResourceId) {
        *self.owner.borrow_mut() = Some(person.as_str().to_string());
    }

    /// Page size used when a list request carries no `max` parameter.
    pub fn set_page_size(&self, size: usize) {
        self.page_size.set(size.max(1));
    }

    /// Queue a canned response; queued responses are served before routing.
    pub fn inject(&self, response: Response) {
        self.injected.borrow_mut().push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    fn not_found() -> Response {
        Response::json_body(404, &json!({"message": "The requested resource could not be found."}))
    }

    fn find_index(&self, resource_type: ResourceType, id: &str) -> Option<usize> {
        let records = self.records.borrow();
        records
            .get(&resource_type)?
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
    }

    fn item(&self, method: Method, resource_type: ResourceType, id: &str, body: Option<&Value>) -> Response {
        let id = if resource_type == ResourceType::People && id == "me" {
            match self.owner.borrow().clone() {
                Some(owner) => owner,
                None => return Self::not_found(),
            }
        } else {
            id.to_string()
        };

        let index = match self.find_index(resource_type, &id) {
            Some(index) => index,
            None => return Self::not_found(),
        };
        let mut records = self.records.borrow_mut();
        let bucket = records.entry(resource_type).or_default();

        match method {
            Method::Get => Response::json_body(200, &Value::Object(bucket[index].clone())),
            Method::Put => {
                if let Some(Value::Object(changes)) = body {
                    for (key, value) in changes {
                        bucket[index].insert(key.clone(), value.clone());
                    }
                }
                Response::json_body(200, &Value::Object(bucket[index].clone()))
            }
            Method::Delete => {
                bucket.remove(index);
                Response::new(204, "")
            }
            Method::Post => Response::json_body(405, &json!({"message": "Method not allowed"})),
        }
    }

    fn list(&self, resource_type: ResourceType, params: &[(String, String)]) -> Response {
        let mut filters = Vec::new();
        let mut max = self.page_size.get();
        let mut cursor = 0usize;
        for (key, value) in params {
            match key.as_str() {
                "max" => max = value.parse().unwrap_or(max).max(1),
                "cursor" => cursor = value.parse().unwrap_or(0),
                "sortBy" => {}
                _ => filters.push((key.clone(), value.clone())),
            }
        }

        let records = self.records.borrow();
        let matching: Vec<&Map<String, Value>> = records
            .get(&resource_type)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|r| filters.iter().all(|(k, v)| field_matches(r.get(k), v)))
                    .collect()
            })
            .unwrap_or_default();

        let page: Vec<Value> = matching
            .iter()
            .skip(cursor)
            .take(max)
            .map(|r| Value::Object((*r).clone()))
            .collect();

        let next = cursor + max;
        let next_link = (next < matching.len()).then(|| {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in &filters {
                query.append_pair(k, v);
            }
            query.append_pair("max", &max.to_string());
            query.append_pair("cursor", &next.to_string());
            format!("{}{}?{}", MEMORY_BASE, resource_type.path(), query.finish())
        });

        Response::json_body(200, &json!({ "items": page })).with_next_link(next_link)
    }
}

fn field_matches(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        _ => false,
    }
}

impl Transport for MemTransport {
    fn request(&self, request: &Request) -> Result<Response> {
        self.log.borrow_mut().push(request.clone());

        if let Some(response) = self.injected.borrow_mut().pop_front() {
            return Ok(response);
        }

        let base = Url::parse(MEMORY_BASE)
            .map_err(|e| SparkError::Transport(e.to_string()))?;
        let url = base
            .join(request.url.trim_start_matches('/'))
            .map_err(|e| SparkError::Transport(format!("bad url {}: {}", request.url, e)))?;

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.extend(request.query.iter().cloned());

        let path = url.path().trim_matches('/');
        if let Some(resource_type) = ResourceType::from_path(path) {
            return Ok(match request.method {
                Method::Get => self.list(resource_type, &params),
                _ => Response::json_body(405, &json!({"message": "Method not allowed"})),
            });
        }

        let response = path
            .rsplit_once('/')
            .and_then(|(type_path, id)| {
                ResourceType::from_path(type_path).map(|rt| (rt, id))
            })
            .map(|(rt, id)| self.item(request.method, rt, id, request.body.as_ref()))
            .unwrap_or_else(Self::not_found);
        Ok(response)
    }
}
