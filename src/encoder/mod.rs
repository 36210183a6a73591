pub mod assembler;

pub use assembler::{create_video, ClipFormat};
