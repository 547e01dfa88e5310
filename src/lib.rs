// Library interface for paddock

pub mod analysis;
pub mod api;
pub mod calendar;
pub mod config;
pub mod countdown;
pub mod errors;
pub mod export;
pub mod fetch;

// Re-export commonly used types
pub use api::{ClientConfig, ErgastClient, Resource, ResourceQuery};
pub use config::AppConfig;
pub use countdown::Countdown;
pub use errors::PaddockError;
pub use fetch::{FetchController, FetchFailure, FetchOptions, FetchState, RevalidationBus};
