//! Capture thread wrapping the libfreenect driver
//!
//! All driver state (context, device, streams) lives on one spawned thread;
//! the rest of the program talks to it through the two frame mailboxes and a
//! command channel. Startup failures are reported back through a one-shot
//! channel so [`KinectCapture::start`] fails loudly instead of limping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use freenectrs::freenect::{
    FreenectContext, FreenectDepthFormat, FreenectLed, FreenectResolution, FreenectVideoFormat,
};
use tracing::{error, info, warn};

use crate::capture::colorize::GammaTable;
use crate::capture::handoff::FrameMailbox;
use crate::error::{Error, Result};
use crate::CaptureConfig;

/// Tilt limits of the sensor head, in degrees.
pub const TILT_MIN_DEGREES: f64 = -30.0;
pub const TILT_MAX_DEGREES: f64 = 30.0;

pub fn clamp_tilt(degrees: f64) -> f64 {
    degrees.clamp(TILT_MIN_DEGREES, TILT_MAX_DEGREES)
}

/// LED states the sensor exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    Green,
    Red,
    Yellow,
    BlinkGreen,
    BlinkRedYellow,
}

/// Capture formats for the video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Rgb,
    Ir,
}

enum DeviceCommand {
    SetTilt(f64),
    SetLed(LedState),
    SetVideoFormat(VideoFormat),
}

/// Handle to the running capture thread.
///
/// Publishes colorized depth and RGB video into two independent mailboxes,
/// one per stream. Tilt, LED and format changes are forwarded to the driver
/// asynchronously; none of them block the caller.
pub struct KinectCapture {
    video: Arc<FrameMailbox>,
    depth: Arc<FrameMailbox>,
    commands: flume::Sender<DeviceCommand>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl KinectCapture {
    /// Spawn the capture thread and block until the device is streaming.
    pub fn start(config: &CaptureConfig) -> Result<Self> {
        let frame_len = (config.width * config.height * 3) as usize;
        let video = Arc::new(FrameMailbox::new(frame_len));
        let depth = Arc::new(FrameMailbox::new(frame_len));
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = flume::bounded(1);
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let video = Arc::clone(&video);
            let depth = Arc::clone(&depth);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("kinect-capture".into())
                .spawn(move || capture_loop(video, depth, cmd_rx, ready_tx, running))?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                video,
                depth,
                commands: cmd_tx,
                running,
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(Error::CaptureExited)
            }
        }
    }

    /// Mailbox receiving RGB (or grayscale-expanded IR) video frames.
    pub fn video(&self) -> &FrameMailbox {
        &self.video
    }

    /// Mailbox receiving colorized depth frames.
    pub fn depth(&self) -> &FrameMailbox {
        &self.depth
    }

    /// Point the sensor head at `degrees`, clamped to the mechanical range.
    pub fn set_tilt(&self, degrees: f64) {
        let _ = self.commands.send(DeviceCommand::SetTilt(clamp_tilt(degrees)));
    }

    pub fn set_led(&self, led: LedState) {
        let _ = self.commands.send(DeviceCommand::SetLed(led));
    }

    /// Switch the video stream's capture format.
    pub fn set_video_format(&self, format: VideoFormat) {
        let _ = self.commands.send(DeviceCommand::SetVideoFormat(format));
    }

    /// Stop capturing and join the thread. Safe to call while a frame is
    /// mid-publish; the last frame is not guaranteed to reach the consumer.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for KinectCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn capture_loop(
    video: Arc<FrameMailbox>,
    depth: Arc<FrameMailbox>,
    commands: flume::Receiver<DeviceCommand>,
    ready: flume::Sender<Result<()>>,
    running: Arc<AtomicBool>,
) {
    let outcome = (|| -> Result<()> {
        let ctx = FreenectContext::init_with_video_motor().map_err(Error::driver)?;
        if ctx.num_devices().map_err(Error::driver)? == 0 {
            return Err(Error::NoDevice);
        }
        let device = ctx.open_device(0).map_err(Error::driver)?;
        device
            .set_depth_mode(FreenectResolution::Medium, FreenectDepthFormat::Bit11)
            .map_err(Error::driver)?;
        device
            .set_video_mode(FreenectResolution::Medium, FreenectVideoFormat::Rgb)
            .map_err(Error::driver)?;
        let dstream = device.depth_stream().map_err(Error::driver)?;
        let mut vstream = Some(device.video_stream().map_err(Error::driver)?);
        ctx.spawn_process_thread().map_err(Error::driver)?;

        info!("capture streaming at 640x480");
        let _ = ready.send(Ok(()));

        let gamma = GammaTable::new();
        let mut format = VideoFormat::Rgb;
        let mut depth_scratch = vec![0u8; depth.len()];
        let mut video_scratch = vec![0u8; video.len()];

        while running.load(Ordering::Relaxed) {
            for cmd in commands.try_iter() {
                match cmd {
                    DeviceCommand::SetTilt(degrees) => {
                        if let Err(e) = device.set_tilt_degree(degrees) {
                            warn!("tilt command failed: {e}");
                        }
                    }
                    DeviceCommand::SetLed(led) => {
                        if let Err(e) = device.set_led(wire_led(led)) {
                            warn!("led command failed: {e}");
                        }
                    }
                    DeviceCommand::SetVideoFormat(new_format) => {
                        // The stream is bound to the active mode; recreate it
                        // around the format change.
                        vstream = None;
                        let wire = match new_format {
                            VideoFormat::Rgb => FreenectVideoFormat::Rgb,
                            VideoFormat::Ir => FreenectVideoFormat::Ir8Bit,
                        };
                        if let Err(e) = device.set_video_mode(FreenectResolution::Medium, wire) {
                            warn!("video format change failed: {e}");
                        }
                        match device.video_stream() {
                            Ok(stream) => vstream = Some(stream),
                            Err(e) => warn!("video stream restart failed: {e}"),
                        }
                        format = new_format;
                        info!("video format now {format:?}");
                    }
                }
            }

            // The driver hands us an owned copy per frame; colorization and
            // format expansion run here, outside any mailbox lock.
            let mut idle = true;
            if let Ok((raw, _timestamp)) = dstream.receiver.try_recv() {
                gamma.colorize(&raw, &mut depth_scratch);
                depth.publish(&mut depth_scratch);
                idle = false;
            }
            if let Some(stream) = vstream.as_ref() {
                if let Ok((raw, _timestamp)) = stream.receiver.try_recv() {
                    match format {
                        VideoFormat::Rgb => video_scratch.copy_from_slice(&raw),
                        VideoFormat::Ir => expand_luminance(&raw, &mut video_scratch),
                    }
                    video.publish(&mut video_scratch);
                    idle = false;
                }
            }
            if idle {
                thread::sleep(Duration::from_millis(1));
            }
        }

        ctx.stop_process_thread().map_err(Error::driver)?;
        Ok(())
    })();

    match outcome {
        Ok(()) => info!("capture thread stopped"),
        Err(e) => {
            error!("capture thread exited: {e}");
            let _ = ready.send(Err(e));
        }
    }
}

/// Spread an 8-bit IR frame across RGB gray pixels so the mailbox frame size
/// stays the same across format changes. IR frames carry a few padding rows
/// beyond 640x480; anything past the output frame is ignored.
fn expand_luminance(raw: &[u8], out: &mut [u8]) {
    for (px, &lum) in out.chunks_exact_mut(3).zip(raw.iter()) {
        px.fill(lum);
    }
}

fn wire_led(led: LedState) -> FreenectLed {
    match led {
        LedState::Off => FreenectLed::Off,
        LedState::Green => FreenectLed::Green,
        LedState::Red => FreenectLed::Red,
        LedState::Yellow => FreenectLed::Yellow,
        LedState::BlinkGreen => FreenectLed::BlinkGreen,
        LedState::BlinkRedYellow => FreenectLed::BlinkRedYellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilt_is_clamped_to_mechanical_range() {
        assert_eq!(clamp_tilt(45.0), TILT_MAX_DEGREES);
        assert_eq!(clamp_tilt(-45.0), TILT_MIN_DEGREES);
        assert_eq!(clamp_tilt(12.5), 12.5);
    }

    #[test]
    fn luminance_expansion_is_gray_and_ignores_padding_rows() {
        // 2 output pixels, 3 input samples: the trailing sample is padding.
        let raw = [10u8, 200, 77];
        let mut out = vec![0u8; 6];
        expand_luminance(&raw, &mut out);
        assert_eq!(out, [10, 10, 10, 200, 200, 200]);
    }
}
