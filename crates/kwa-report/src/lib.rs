pub mod manifest;
pub mod store;
pub mod summary;

pub use manifest::*;
pub use store::*;
pub use summary::*;
