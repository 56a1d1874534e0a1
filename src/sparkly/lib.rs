//! # Sparkly Architecture
//!
//! Sparkly is a **lazy object model for the Cisco Spark REST API**. Remote
//! entities are represented by proxies that fetch on first read, and remote
//! listings by containers that page on demand. The `sparkly` binary is a thin
//! client of the library.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, installs logging       │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session (session.rs)                                       │
//! │  - Owns the transport, region, page size and length hints   │
//! │  - Hands out proxies and containers                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Object Model (resource.rs, container.rs)                   │
//! │  - Lazy proxies checked against per-type schemas            │
//! │  - Cursor-following containers                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport Layer (transport/)                               │
//! │  - Abstract Transport trait                                 │
//! │  - HttpTransport (production), MemTransport (testing)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Underneath all of it sit the identifier codec ([`ident`]), the property
//! schemas ([`schema`]) and value coercion ([`value`]), none of which do I/O.
//!
//! ## Example
//!
//! ```no_run
//! use sparkly::config::SparkConfig;
//! use sparkly::session::Spark;
//!
//! # fn main() -> sparkly::error::Result<()> {
//! let config = SparkConfig::load(SparkConfig::default_path().as_deref())?;
//! let spark = Spark::from_config(&config)?;
//!
//! let mut rooms = spark.rooms();
//! for room in rooms.find("title", "(?i)standup")? {
//!     println!("{} {}", room.id(), room.get("title")?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! [`transport::memory::MemTransport`] serves the same wire contract as the
//! real API from memory and logs every request, so tests can assert exactly
//! how many remote calls an access made.

pub mod config;
pub mod container;
pub mod error;
pub mod hints;
pub mod ident;
pub mod resource;
pub mod schema;
pub mod session;
pub mod transport;
pub mod value;
