//! Todo list client core.
//!
//! The crate follows a hexagonal layout. `domain` owns the entities, the
//! ports, the keyed query cache, and the services that coordinate optimistic
//! mutations against it. `outbound` provides adapters for the remote todo
//! API, durable client storage, and the view-facing sinks. `inbound` hosts
//! the command-line driving adapter used by the `todo-client` binary.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
