pub mod ids;
pub mod model;
pub mod types;

pub use ids::*;
pub use model::*;
pub use types::*;
