//! Inbound adapters driving the domain.
//!
//! The command-line front end is the only driving adapter: it wires the
//! outbound adapters into the domain services and renders results as text.

pub mod cli;
