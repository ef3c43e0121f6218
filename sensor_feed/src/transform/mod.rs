pub mod normalizer;
pub mod timestamp;
