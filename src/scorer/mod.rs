pub mod engine;
pub mod processor;
