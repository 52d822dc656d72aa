// Library exports for lensgraph-store
// The CLI and the integration tests build on these modules

pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod graph;
pub mod seed;

pub use db::{Database, DbPool};
pub use docs::DocumentStore;
pub use error::StoreError;
pub use graph::SocialGraph;
