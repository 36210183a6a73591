pub mod labels;
pub mod parser;

pub use labels::JokeLabels;
pub use parser::{get_metadata, Metadata};
