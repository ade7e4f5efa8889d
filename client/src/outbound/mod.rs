//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed `TodoSource` for the remote REST API
//! - **storage**: capability-scoped JSON file storage for session and theme
//! - **ui**: tracing-backed notification and navigation sinks for the CLI
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod http;
pub mod storage;
pub mod ui;
