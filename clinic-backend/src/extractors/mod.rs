// src/extractors/mod.rs
pub mod uuid;

pub use self::uuid::ValidatedUuid;
