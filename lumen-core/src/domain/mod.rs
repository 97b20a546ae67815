//! Core domain types
//!
//! This module contains the domain structures shared by the client library
//! (which produces them from API responses) and the CLI (which consumes them).

pub mod artifact;
pub mod media;
pub mod operation;
