//! Lumen Core
//!
//! Core types and abstractions for the Lumen generative-media client.
//!
//! This crate contains:
//! - Domain types: long-running operation handles, media payloads, artifacts
//! - DTOs: request/response bodies exchanged with the generative-media API

pub mod domain;
pub mod dto;
