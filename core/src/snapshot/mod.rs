pub mod dump;
pub mod restore;
pub mod types;

pub use dump::*;
pub use restore::*;
pub use types::*;
