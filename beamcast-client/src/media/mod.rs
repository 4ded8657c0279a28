mod media_capture;

pub use media_capture::*;
