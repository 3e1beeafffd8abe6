pub mod assignment;
pub mod engine;
