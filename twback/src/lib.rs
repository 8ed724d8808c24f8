pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod markup;
pub mod models;

#[cfg(test)]
pub mod mock;

pub use api::{ApiClient, ApiClientImpl, ProfileApi, Target, TimelineApi};
pub use client::{Client, HttpClient};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Post, Profile};
