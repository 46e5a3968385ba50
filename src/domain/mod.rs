pub mod codec;
pub mod diff;
pub mod entities;
pub mod error;
pub mod unique_key;
