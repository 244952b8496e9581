pub mod colorize;
pub mod handoff;
pub mod kinect;

pub use colorize::GammaTable;
pub use handoff::FrameMailbox;
pub use kinect::{KinectCapture, LedState, VideoFormat};
