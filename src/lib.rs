pub mod config;
pub mod error;
pub mod geofile;
pub mod geometry;
pub mod response;
pub mod tabular;
