pub mod generator;
pub mod worker;

pub use worker::NarrativeWorker;
