//! File I/O, validation, and serialization for the distantia pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::SequenceReader;
pub use writer::{Method, ResultWriter};
