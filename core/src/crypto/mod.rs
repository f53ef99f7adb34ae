pub mod aead;
pub mod kdf;
pub mod rng;
pub mod types;

pub use aead::*;
pub use kdf::*;
pub use rng::*;
pub use types::*;
