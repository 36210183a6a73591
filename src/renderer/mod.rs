pub mod cell;
pub mod display;
pub mod processor;

pub use display::DisplayManager;
pub use display::DisplayMode;
pub use processor::FrameProcessor;
