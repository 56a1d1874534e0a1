use serde_json::{json, Value};
use sparkly::error::SparkError;
use sparkly::ident::{encode, ResourceId, ResourceType};
use sparkly::resource::LoadState;
use sparkly::session::Spark;
use sparkly::transport::memory::MemTransport;
use sparkly::transport::{Method, Response};
use sparkly::value::FieldValue;

fn uuid(n: u32) -> String {
    format!("00000000-0000-4000-8000-{:012}", n)
}

fn room_record(id: &ResourceId, title: &str) -> Value {
    json!({
        "id": id.as_str(),
        "title": title,
        "type": "group",
        "created": "2017-08-26T12:01:36.373Z",
        "creatorId": "creator",
        "lastActivity": "2017-09-01T08:00:00.000Z",
    })
}

fn with_room() -> (MemTransport, ResourceId) {
    let transport = MemTransport::new();
    let id = encode(ResourceType::Rooms, &uuid(1)).unwrap();
    transport
        .insert(ResourceType::Rooms, room_record(&id, "Lunch"))
        .unwrap();
    (transport, id)
}

#[test]
fn test_lazy_load_fetches_exactly_once() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);

    let room = spark.resource_from_id(id.as_str()).unwrap();
    assert_eq!(transport.request_count(), 0);
    assert_eq!(room.load_state(), LoadState::Unloaded);

    assert_eq!(room.get("title").unwrap().as_text(), Some("Lunch"));
    assert_eq!(transport.request_count(), 1);
    assert!(room.is_loaded());
    assert!(room.loaded_at().is_some());

    room.get("type").unwrap();
    room.get("created").unwrap();
    room.get("lastActivity").unwrap();
    assert_eq!(transport.request_count(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, format!("rooms/{}", id));
}

#[test]
fn test_absent_optional_field_is_terminal() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    for _ in 0..3 {
        assert_eq!(room.get("sipAddress").unwrap(), FieldValue::Null);
    }
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_absent_required_field_after_load() {
    let transport = MemTransport::new();
    let id = encode(ResourceType::Rooms, &uuid(2)).unwrap();
    transport
        .insert(
            ResourceType::Rooms,
            json!({"id": id.as_str(), "title": "No creator", "type": "group",
                   "created": "2017-08-26T12:01:36.373Z"}),
        )
        .unwrap();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    assert!(matches!(
        room.get("creatorId"),
        Err(SparkError::MissingRequiredField { name, .. }) if name == "creatorId"
    ));
    assert!(room.get("creatorId").is_err());
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_extra_fields_are_ignored() {
    let transport = MemTransport::new();
    let id = encode(ResourceType::Teams, &uuid(3)).unwrap();
    transport
        .insert(
            ResourceType::Teams,
            json!({"id": id.as_str(), "name": "Core", "creatorId": "c",
                   "created": "2017-08-26T12:01:36.373Z", "description": "surprise"}),
        )
        .unwrap();
    let spark = Spark::new(&transport);
    let team = spark.resource_from_id(id.as_str()).unwrap();

    assert_eq!(team.get("name").unwrap().as_text(), Some("Core"));
    assert!(matches!(
        team.get("description"),
        Err(SparkError::UnknownAttribute { .. })
    ));
}

#[test]
fn test_read_only_fields_never_reach_the_remote() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    assert!(matches!(
        room.set("type", "direct"),
        Err(SparkError::ReadOnlyField { .. })
    ));
    assert!(matches!(
        room.set("id", "other"),
        Err(SparkError::ReadOnlyField { .. })
    ));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn test_set_wrong_kind_is_rejected_locally() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    assert!(matches!(
        room.set("title", true),
        Err(SparkError::InvalidValue { .. })
    ));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn test_set_updates_remote_then_local() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();
    room.get("title").unwrap();
    transport.clear_log();

    room.set("title", "Dinner").unwrap();
    assert_eq!(transport.request_count(), 1);
    let put = &transport.requests()[0];
    assert_eq!(put.method, Method::Put);
    assert_eq!(put.body.as_ref().unwrap()["title"], "Dinner");

    assert_eq!(room.get("title").unwrap().as_text(), Some("Dinner"));
    assert_eq!(
        transport.record(ResourceType::Rooms, id.as_str()).unwrap()["title"],
        "Dinner"
    );
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_failed_set_leaves_local_state_alone() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();
    room.get("title").unwrap();

    transport.inject(Response::json_body(400, &json!({"message": "nope"})));
    match room.set("title", "Dinner") {
        Err(SparkError::RemoteUpdateFailed { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("nope"));
        }
        other => panic!("expected RemoteUpdateFailed, got {:?}", other),
    }
    assert_eq!(room.get("title").unwrap().as_text(), Some("Lunch"));
}

#[test]
fn test_set_on_unloaded_proxy_fetches_companions_first() {
    let transport = MemTransport::new();
    let id = encode(ResourceType::Webhooks, &uuid(4)).unwrap();
    transport
        .insert(
            ResourceType::Webhooks,
            json!({
                "id": id.as_str(),
                "name": "hook",
                "targetUrl": "https://example.com/hook",
                "resource": "messages",
                "event": "created",
                "orgId": "org",
                "createdBy": "me",
                "appId": "app",
                "ownedBy": "creator",
                "status": "active",
                "created": "2017-08-26T12:01:36.373Z",
            }),
        )
        .unwrap();
    let spark = Spark::new(&transport);
    let hook = spark.resource_from_id(id.as_str()).unwrap();

    hook.set("name", "renamed").unwrap();
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::Get);
    let body = requests[1].body.as_ref().unwrap();
    assert_eq!(body["name"], "renamed");
    assert_eq!(body["targetUrl"], "https://example.com/hook");
    assert!(body.get("resource").is_none());
}

#[test]
fn test_person_update_resends_profile() {
    let transport = MemTransport::new();
    let id = encode(ResourceType::People, &uuid(5)).unwrap();
    transport
        .insert(
            ResourceType::People,
            json!({
                "id": id.as_str(),
                "emails": ["ada@example.com"],
                "displayName": "Ada",
                "orgId": "org",
                "created": "2017-08-26T12:01:36.373Z",
                "type": "person",
            }),
        )
        .unwrap();
    let spark = Spark::new(&transport);
    let person = spark.resource(ResourceType::People, &uuid(5)).unwrap();

    assert_eq!(person.email().unwrap().as_deref(), Some("ada@example.com"));
    person.set("displayName", "Ada L.").unwrap();
    let put = transport.requests().pop().unwrap();
    let body = put.body.unwrap();
    assert_eq!(body["displayName"], "Ada L.");
    assert_eq!(body["emails"], json!(["ada@example.com"]));
    assert_eq!(body["orgId"], "org");
}

#[test]
fn test_delete_then_remote_access_fails_fast() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();
    room.get("title").unwrap();

    room.delete().unwrap();
    assert!(room.is_deleted());
    assert!(room.is_loaded());
    assert!(transport.record(ResourceType::Rooms, id.as_str()).is_none());

    let before = transport.request_count();
    assert_eq!(room.get("title").unwrap().as_text(), Some("Lunch"));
    assert!(matches!(room.set("title", "x"), Err(SparkError::Deleted(_))));
    assert!(matches!(room.delete(), Err(SparkError::Deleted(_))));
    assert_eq!(transport.request_count(), before);
}

#[test]
fn test_delete_of_unloaded_proxy_blocks_lazy_fetch() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    room.delete().unwrap();
    assert!(matches!(room.get("title"), Err(SparkError::Deleted(_))));
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn test_delete_requires_empty_204() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    transport.inject(Response::json_body(200, &json!({"deleted": true})));
    assert!(matches!(
        room.delete(),
        Err(SparkError::DeleteFailed { status: 200, .. })
    ));

    transport.inject(Response::new(204, "unexpected"));
    assert!(matches!(
        room.delete(),
        Err(SparkError::DeleteFailed { status: 204, .. })
    ));
    assert!(!room.is_deleted());

    transport.inject(Response::new(404, "gone"));
    assert!(matches!(
        room.delete(),
        Err(SparkError::DeleteFailed { status: 404, .. })
    ));
}

#[test]
fn test_message_files_are_bound_to_the_message() {
    let transport = MemTransport::new();
    let id = encode(ResourceType::Messages, &uuid(6)).unwrap();
    transport
        .insert(
            ResourceType::Messages,
            json!({
                "id": id.as_str(),
                "roomId": "room",
                "roomType": "group",
                "personId": "p",
                "personEmail": "p@example.com",
                "created": "2017-08-26T12:01:36.373Z",
                "files": ["https://api.ciscospark.com/v1/contents/Y2lz/agenda.pdf"],
            }),
        )
        .unwrap();
    let spark = Spark::new(&transport);
    let message = spark.resource_from_id(id.as_str()).unwrap();

    let files = message.get("files").unwrap();
    let files = files.as_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(&files[0].parent, message.id());
    assert_eq!(files[0].file_name(), Some("agenda.pdf"));
    assert_eq!(message.get("text").unwrap(), FieldValue::Null);
}

#[test]
fn test_snapshot_is_schema_ordered() {
    let (transport, id) = with_room();
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    let snapshot = room.snapshot().unwrap();
    let names: Vec<_> = snapshot.iter().map(|(name, _)| *name).collect();
    let declared: Vec<_> = room.field_names().collect();
    assert_eq!(names, declared);
    assert_eq!(snapshot[0].1.as_text(), Some(id.as_str()));
    assert!(snapshot.iter().any(|(name, value)| *name == "teamId" && value.is_null()));
    assert_eq!(transport.request_count(), 1);
}

fn bot_session(transport: &MemTransport, kind: &str) {
    let me = encode(ResourceType::People, &uuid(99)).unwrap();
    transport
        .insert(
            ResourceType::People,
            json!({
                "id": me.as_str(),
                "emails": ["bot@sparkbot.io"],
                "displayName": "Bot",
                "orgId": "org",
                "created": "2017-08-26T12:01:36.373Z",
                "type": kind,
            }),
        )
        .unwrap();
    transport.set_owner(&me);
}

#[test]
fn test_bot_group_messages_filter_on_mentions() {
    let (transport, id) = with_room();
    bot_session(&transport, "bot");
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    let messages = room.messages().unwrap();
    assert_eq!(messages.params().get("mentionedPeople").map(String::as_str), Some("me"));
    assert_eq!(messages.params().get("roomId").map(String::as_str), Some(id.as_str()));
}

#[test]
fn test_person_messages_are_unfiltered() {
    let (transport, id) = with_room();
    bot_session(&transport, "person");
    let spark = Spark::new(&transport);
    let room = spark.resource_from_id(id.as_str()).unwrap();

    let messages = room.messages().unwrap();
    assert!(messages.params().get("mentionedPeople").is_none());
}

#[test]
fn test_team_relationships() {
    let transport = MemTransport::new();
    let spark = Spark::new(&transport);
    let team = spark.resource(ResourceType::Teams, &uuid(7)).unwrap();

    let members = team.members().unwrap();
    assert_eq!(members.resource_type(), ResourceType::TeamMemberships);
    assert_eq!(members.params().get("teamId").map(String::as_str), Some(team.id().as_str()));

    let rooms = team.subrooms().unwrap();
    assert_eq!(rooms.resource_type(), ResourceType::Rooms);
    assert_eq!(rooms.params().get("sortBy").map(String::as_str), Some("id"));

    assert_eq!(
        team.web_link().unwrap(),
        format!("https://web.ciscospark.com/teams/{}", team.id())
    );
    assert!(matches!(team.messages(), Err(SparkError::UnknownAttribute { .. })));
    assert_eq!(transport.request_count(), 0);
}
