//! Property schemas and registry.
//!
//! Each resource type declares its fields once: name, value kind, and whether
//! the field may be absent (`optional`) or written back (`mutable`). Tables are
//! insertion ordered and shared by every proxy of that type.

use crate::ident::ResourceType;

/// The kind of value a field holds, which drives coercion on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain string (titles, emails, foreign identifiers)
    Text,

    Bool,

    Integer,

    /// RFC 3339 timestamp string, read as a `DateTime<Utc>`
    Timestamp,

    /// Array of strings (e.g. `emails`, `mentionedPeople`)
    TextList,

    /// Array of attachment URLs, read as file handles bound to the owner
    Files,
}

/// Kind, optionality and mutability of a single field.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    /// The field name exactly as it appears on the wire (e.g. "displayName")
    pub name: &'static str,

    pub kind: ValueKind,

    /// Absence after a fetch is a terminal fact, read as null
    pub optional: bool,

    /// Writable through a remote update
    pub mutable: bool,
}

impl PropertySpec {
    /// Create a new required, read-only property.
    const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            mutable: false,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self::new(name, ValueKind::Text)
    }

    /// Set the optional flag.
    const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the mutable flag.
    const fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }
}

/// All declared fields of one resource type.
#[derive(Debug)]
pub struct Schema {
    pub resource_type: ResourceType,

    pub properties: &'static [PropertySpec],

    /// Fields the update endpoint wants re-sent alongside any changed field.
    ///
    /// `PUT /people/{id}` rejects a body without `emails` and `displayName`,
    /// and `PUT /webhooks/{id}` needs both `name` and `targetUrl`.
    pub update_companions: &'static [&'static str],
}

impl Schema {
    pub fn get(&self, name: &str) -> Option<&'static PropertySpec> {
        self.properties.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.properties.iter().map(|spec| spec.name)
    }

    pub fn mutable_names(&self) -> impl Iterator<Item = &'static str> {
        self.properties
            .iter()
            .filter(|spec| spec.mutable)
            .map(|spec| spec.name)
    }
}

const ID: PropertySpec = PropertySpec::text("id");
const CREATED: PropertySpec = PropertySpec::new("created", ValueKind::Timestamp);

static MESSAGES: Schema = Schema {
    resource_type: ResourceType::Messages,
    properties: &[
        ID,
        PropertySpec::text("roomId"),
        PropertySpec::text("roomType"),
        PropertySpec::text("text").optional(),
        PropertySpec::text("markdown").optional(),
        PropertySpec::text("html").optional(),
        PropertySpec::text("personId"),
        PropertySpec::text("personEmail"),
        CREATED,
        PropertySpec::new("files", ValueKind::Files).optional(),
        PropertySpec::new("mentionedPeople", ValueKind::TextList).optional(),
    ],
    update_companions: &[],
};

static ROOMS: Schema = Schema {
    resource_type: ResourceType::Rooms,
    properties: &[
        ID,
        PropertySpec::text("title").mutable(),
        PropertySpec::text("type"),
        PropertySpec::new("isLocked", ValueKind::Bool).optional(),
        PropertySpec::new("lastActivity", ValueKind::Timestamp).optional(),
        CREATED,
        PropertySpec::text("creatorId"),
        PropertySpec::text("sipAddress").optional(),
        PropertySpec::text("teamId").optional(),
    ],
    update_companions: &[],
};

static PEOPLE: Schema = Schema {
    resource_type: ResourceType::People,
    properties: &[
        ID,
        PropertySpec::new("emails", ValueKind::TextList),
        PropertySpec::text("displayName").mutable(),
        PropertySpec::text("avatar").optional().mutable(),
        PropertySpec::text("orgId"),
        CREATED,
        PropertySpec::text("type"),
        PropertySpec::text("firstName").optional().mutable(),
        PropertySpec::text("lastName").optional().mutable(),
        PropertySpec::text("nickName").optional().mutable(),
        PropertySpec::new("lastActivity", ValueKind::Timestamp).optional(),
        PropertySpec::text("status").optional(),
        PropertySpec::new("licenses", ValueKind::TextList)
            .optional()
            .mutable(),
        PropertySpec::new("roles", ValueKind::TextList).optional(),
        PropertySpec::text("timezone").optional(),
        PropertySpec::new("invitePending", ValueKind::Bool).optional(),
        PropertySpec::new("loginEnabled", ValueKind::Bool).optional(),
    ],
    update_companions: &[
        "emails",
        "displayName",
        "firstName",
        "lastName",
        "nickName",
        "avatar",
        "orgId",
        "roles",
        "licenses",
    ],
};

static MEMBERSHIPS: Schema = Schema {
    resource_type: ResourceType::Memberships,
    properties: &[
        ID,
        PropertySpec::text("roomId"),
        PropertySpec::text("personId"),
        PropertySpec::text("personEmail"),
        PropertySpec::text("personOrgId"),
        PropertySpec::text("personDisplayName"),
        PropertySpec::new("isModerator", ValueKind::Bool)
            .optional()
            .mutable(),
        PropertySpec::new("isMonitor", ValueKind::Bool).optional(),
        CREATED,
    ],
    update_companions: &[],
};

static TEAMS: Schema = Schema {
    resource_type: ResourceType::Teams,
    properties: &[
        ID,
        PropertySpec::text("name").mutable(),
        PropertySpec::text("creatorId"),
        CREATED,
    ],
    update_companions: &[],
};

static TEAM_MEMBERSHIPS: Schema = Schema {
    resource_type: ResourceType::TeamMemberships,
    properties: &[
        ID,
        PropertySpec::text("teamId"),
        PropertySpec::text("personId"),
        PropertySpec::text("personEmail"),
        PropertySpec::text("personOrgId"),
        PropertySpec::text("personDisplayName"),
        PropertySpec::new("isModerator", ValueKind::Bool)
            .optional()
            .mutable(),
        CREATED,
    ],
    update_companions: &[],
};

static WEBHOOKS: Schema = Schema {
    resource_type: ResourceType::Webhooks,
    properties: &[
        ID,
        PropertySpec::text("name").mutable(),
        PropertySpec::text("targetUrl").mutable(),
        PropertySpec::text("resource"),
        PropertySpec::text("event"),
        PropertySpec::text("orgId"),
        PropertySpec::text("createdBy"),
        PropertySpec::text("appId"),
        PropertySpec::text("ownedBy"),
        PropertySpec::text("status"),
        CREATED,
        PropertySpec::text("filter").optional(),
        PropertySpec::text("secret").optional(),
    ],
    update_companions: &["name", "targetUrl"],
};

static ORGANIZATIONS: Schema = Schema {
    resource_type: ResourceType::Organizations,
    properties: &[ID, PropertySpec::text("displayName"), CREATED],
    update_companions: &[],
};

static LICENSES: Schema = Schema {
    resource_type: ResourceType::Licenses,
    properties: &[
        ID,
        PropertySpec::text("name"),
        PropertySpec::new("totalUnits", ValueKind::Integer),
        PropertySpec::new("consumedUnits", ValueKind::Integer),
    ],
    update_companions: &[],
};

static ROLES: Schema = Schema {
    resource_type: ResourceType::Roles,
    properties: &[ID, PropertySpec::text("name")],
    update_companions: &[],
};

/// Look up the schema of a resource type.
pub fn schema_for(resource_type: ResourceType) -> &'static Schema {
    match resource_type {
        ResourceType::Messages => &MESSAGES,
        ResourceType::Rooms => &ROOMS,
        ResourceType::People => &PEOPLE,
        ResourceType::Memberships => &MEMBERSHIPS,
        ResourceType::Teams => &TEAMS,
        ResourceType::TeamMemberships => &TEAM_MEMBERSHIPS,
        ResourceType::Webhooks => &WEBHOOKS,
        ResourceType::Organizations => &ORGANIZATIONS,
        ResourceType::Licenses => &LICENSES,
        ResourceType::Roles => &ROLES,
    }
}

/// Look up one field spec by resource type and name.
pub fn get_spec(resource_type: ResourceType, name: &str) -> Option<&'static PropertySpec> {
    schema_for(resource_type).get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_has_a_fixed_id_first() {
        for rt in ResourceType::ALL {
            let schema = schema_for(rt);
            assert_eq!(schema.resource_type, rt);
            let id = &schema.properties[0];
            assert_eq!(id.name, "id", "{}", rt);
            assert!(!id.optional);
            assert!(!id.mutable);
        }
    }

    #[test]
    fn field_names_are_unique() {
        for rt in ResourceType::ALL {
            let names: Vec<_> = schema_for(rt).names().collect();
            let mut deduped = names.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(names.len(), deduped.len(), "{}", rt);
        }
    }

    #[test]
    fn companions_are_declared_fields() {
        for rt in ResourceType::ALL {
            let schema = schema_for(rt);
            for companion in schema.update_companions {
                assert!(schema.get(companion).is_some(), "{}.{}", rt, companion);
            }
        }
    }

    #[test]
    fn room_title_spec_is_correct() {
        let spec = get_spec(ResourceType::Rooms, "title").unwrap();
        assert_eq!(spec.kind, ValueKind::Text);
        assert!(spec.mutable);
        assert!(!spec.optional);
    }

    #[test]
    fn message_files_spec_is_correct() {
        let spec = get_spec(ResourceType::Messages, "files").unwrap();
        assert_eq!(spec.kind, ValueKind::Files);
        assert!(spec.optional);
        assert!(!spec.mutable);
    }

    #[test]
    fn unknown_field_returns_none() {
        assert!(get_spec(ResourceType::Rooms, "nonexistent").is_none());
    }

    #[test]
    fn schemas_keep_declaration_order() {
        let names: Vec<_> = schema_for(ResourceType::Teams).names().collect();
        assert_eq!(names, vec!["id", "name", "creatorId", "created"]);
    }

    #[test]
    fn mutable_names_for_people() {
        let mutable: Vec<_> = schema_for(ResourceType::People).mutable_names().collect();
        assert!(mutable.contains(&"displayName"));
        assert!(mutable.contains(&"licenses"));
        assert!(!mutable.contains(&"emails"));
        assert!(!mutable.contains(&"id"));
    }
}
