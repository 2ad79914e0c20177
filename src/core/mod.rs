pub mod catalog;
pub mod generator;
pub mod parser;
pub mod pipeline;
pub mod sampler;
