//! Types shared between the commentary client and the collaborator's HTTP API.

pub mod domain;
pub mod error;
pub mod protocol;
