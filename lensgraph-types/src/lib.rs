pub mod models;
pub mod enums;
pub mod window;

pub use models::*;
pub use enums::*;
pub use window::*;
