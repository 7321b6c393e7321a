//! Oracle implementations.

pub mod openai;

pub use openai::OpenAiOracle;
