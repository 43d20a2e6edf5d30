pub mod index;
pub mod traits;

pub use index::*;
pub use traits::*;
