pub mod config;
pub mod defaults;
pub mod rules;

pub use config::*;
pub use defaults::*;
pub use rules::*;
