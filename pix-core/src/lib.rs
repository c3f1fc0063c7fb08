pub mod amount;
pub mod error;
pub mod fixture;
pub mod image;
pub mod primitives;
