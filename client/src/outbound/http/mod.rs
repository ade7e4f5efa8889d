//! HTTP outbound adapters.
//!
//! This module provides a thin reqwest implementation of the `TodoSource`
//! port, including bearer-token injection and 401 session teardown.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_LIST_LIMIT, DEFAULT_REQUEST_TIMEOUT, HttpTodoSource};
