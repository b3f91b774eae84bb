pub mod augment;
pub mod distance;
