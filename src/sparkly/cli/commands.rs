use super::print::{print_decoded, print_fields, print_rows, Row};
use sparkly::config::SparkConfig;
use sparkly::error::Result;
use sparkly::ident::{compound_uuid_to_identifier_in, decode, ResourceType};
use sparkly::resource::Resource;
use sparkly::session::Spark;
use sparkly::transport::http::HttpTransport;
use sparkly::transport::Transport;
use std::path::Path;
use tracing::debug;

/// Build an HTTP session from `--config` or the default config file.
pub fn connect(config_path: Option<&Path>) -> Result<Spark<HttpTransport>> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(SparkConfig::default_path);
    debug!("Loading config from {:?}", path);
    let config = SparkConfig::load(path.as_deref())?;
    Spark::from_config(&config)
}

pub fn handle_decode(identifier: &str) -> Result<()> {
    let decoded = decode(identifier)?;
    print_decoded(identifier, &decoded);
    Ok(())
}

pub fn handle_encode(resource_type: &str, uuid: &str, region: &str) -> Result<()> {
    let resource_type: ResourceType = resource_type.parse()?;
    let id = compound_uuid_to_identifier_in(region, resource_type, uuid)?;
    println!("{}", id);
    Ok(())
}

pub fn handle_rooms<T: Transport>(
    spark: &Spark<T>,
    find: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let mut rooms = spark.rooms();
    let mut found = match (find, limit) {
        (Some(pattern), _) => rooms.find("title", pattern)?,
        (None, Some(n)) => rooms.iter().take(n).collect::<Result<Vec<_>>>()?,
        (None, None) => rooms.items()?,
    };
    if let Some(n) = limit {
        found.truncate(n);
    }
    print_rows(&rows(&found, "title", "type")?, "rooms");
    Ok(())
}

pub fn handle_teams<T: Transport>(spark: &Spark<T>) -> Result<()> {
    let teams = spark.teams().items()?;
    print_rows(&rows(&teams, "name", "created")?, "teams");
    Ok(())
}

pub fn handle_webhooks<T: Transport>(spark: &Spark<T>) -> Result<()> {
    let hooks = spark.webhooks().items()?;
    print_rows(&rows(&hooks, "name", "targetUrl")?, "webhooks");
    Ok(())
}

pub fn handle_show<T: Transport>(spark: &Spark<T>, identifier: &str) -> Result<()> {
    let resource = spark.resource_from_id(identifier)?;
    print_fields(&resource.snapshot()?);
    Ok(())
}

pub fn handle_members<T: Transport>(spark: &Spark<T>, room: &str) -> Result<()> {
    let room = spark.resource(ResourceType::Rooms, room)?;
    let members = room.members()?.items()?;
    print_rows(&rows(&members, "personDisplayName", "personEmail")?, "members");
    Ok(())
}

fn rows<T: Transport>(items: &[Resource<'_, T>], label: &str, detail: &str) -> Result<Vec<Row>> {
    items
        .iter()
        .map(|item| -> Result<Row> {
            Ok(Row {
                label: item.get(label)?.to_string(),
                detail: item.get(detail)?.to_string(),
                id: item.id().to_string(),
            })
        })
        .collect()
}
