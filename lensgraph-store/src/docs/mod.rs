pub mod catalog;
pub mod collection;
pub mod filter;
pub mod pipeline;

pub use collection::{Collection, DocumentStore, UpdateResult};
pub use filter::{Condition, Filter, Update};
pub use pipeline::Stage;
