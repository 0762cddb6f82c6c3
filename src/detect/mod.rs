mod differencer;

pub use differencer::{DifferencerConfig, FrameDifferencer, MotionSample};
