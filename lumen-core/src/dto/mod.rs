//! Data Transfer Objects (DTOs)
//!
//! Request and response bodies exchanged with the generative-media API.
//! Field names follow the API's camelCase wire format.

pub mod content;
pub mod image;
pub mod video;
