pub mod error;
pub mod launcher;
pub mod participant;
pub mod pipeline;
