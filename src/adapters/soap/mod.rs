//! SOAP adapter for the Energis readings API

pub mod client;
pub mod wire;

pub use client::{with_retry, EnergisApi, EnergisClient, SessionKey};
