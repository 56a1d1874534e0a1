use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.0" for releases, "0.3.0@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "sparkly", bin_name = "sparkly", version = get_version())]
#[command(about = "Browse the Cisco Spark API from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to sparkly.toml in the OS config directory)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode an identifier into type, region and uuid
    Decode {
        identifier: String,
    },

    /// Build an identifier from a resource type and uuid
    Encode {
        /// Resource path or wire token (e.g. rooms, ROOM, team/memberships)
        resource_type: String,

        /// Uuid, or parent:child for memberships
        uuid: String,

        #[arg(short, long, default_value = "us")]
        region: String,
    },

    /// List rooms
    #[command(alias = "ls")]
    Rooms {
        /// Only rooms whose title matches this regular expression
        #[arg(short, long)]
        find: Option<String>,

        /// Stop after this many rooms
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List teams
    Teams,

    /// List webhooks
    Webhooks,

    /// Show every field of one resource
    Show {
        identifier: String,
    },

    /// List the members of a room
    Members {
        /// Room identifier or uuid
        room: String,
    },
}
