pub mod convert;
pub mod emit;
pub mod record;
