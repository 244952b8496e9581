//! SDL2 Window Display Module
//! Creates an SDL2 window, polls the frame mailboxes once per tick, and
//! dispatches the keyboard controls.

use std::thread;
use std::time::Duration;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use tracing::info;

use crate::capture::kinect::{clamp_tilt, KinectCapture, LedState, VideoFormat};
use crate::error::{Error, Result};
use crate::stepper::StepperController;

/// Which stream is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Depth,
    Rgb,
    Ir,
}

impl ViewMode {
    fn next(self) -> Self {
        match self {
            ViewMode::Depth => ViewMode::Rgb,
            ViewMode::Rgb => ViewMode::Ir,
            ViewMode::Ir => ViewMode::Depth,
        }
    }

    /// Capture format the device needs for this view, if the view reads the
    /// video stream at all.
    fn video_format(self) -> Option<VideoFormat> {
        match self {
            ViewMode::Depth => None,
            ViewMode::Rgb => Some(VideoFormat::Rgb),
            ViewMode::Ir => Some(VideoFormat::Ir),
        }
    }
}

/// SDL2 Window Display
/// Handles window creation, the event loop, and frame rendering.
pub struct Sdl2Display {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    width: u32,
    height: u32,
}

impl Sdl2Display {
    pub fn new(sdl_context: &sdl2::Sdl, title: &str, width: u32, height: u32) -> Result<Self> {
        let video_subsystem = sdl_context.video().map_err(Error::display)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(Error::display)?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(Error::display)?;
        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            width,
            height,
        })
    }

    fn render_frame(&mut self, rgb: &[u8]) -> Result<()> {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB24, self.width, self.height)
            .map_err(Error::display)?;

        texture
            .update(None, rgb, (self.width * 3) as usize)
            .map_err(Error::display)?;

        self.canvas.clear();
        self.canvas
            .copy(&texture, None, None)
            .map_err(Error::display)?;

        self.canvas.present();
        Ok(())
    }

    /// Run the event loop until quit. Each tick takes at most one new frame
    /// from the active stream's mailbox; when nothing new has arrived the
    /// last frame stays on screen.
    pub fn run(
        &mut self,
        sdl_context: &sdl2::Sdl,
        capture: &KinectCapture,
        stepper: Option<&StepperController>,
        start_mode: ViewMode,
    ) -> Result<()> {
        let mut event_pump = sdl_context.event_pump().map_err(Error::display)?;
        let mut mode = start_mode;
        let mut tilt = 0.0f64;
        let mut frame = vec![0u8; capture.depth().len()];

        print_controls(stepper.is_some());

        'running: loop {
            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        info!("quit event received");
                        break 'running;
                    }
                    Event::KeyDown {
                        keycode: Some(key), ..
                    } => match key {
                        Keycode::Q | Keycode::Escape => break 'running,
                        Keycode::M => {
                            mode = mode.next();
                            if let Some(format) = mode.video_format() {
                                capture.set_video_format(format);
                            }
                            info!("view mode now {mode:?}");
                        }
                        Keycode::W => {
                            tilt = clamp_tilt(tilt + 1.0);
                            capture.set_tilt(tilt);
                        }
                        Keycode::S => {
                            tilt = clamp_tilt(tilt - 1.0);
                            capture.set_tilt(tilt);
                        }
                        Keycode::A => {
                            if let Some(stepper) = stepper {
                                stepper.move_by(-crate::stepper::STEP_DISTANCE);
                            }
                        }
                        Keycode::D => {
                            if let Some(stepper) = stepper {
                                stepper.move_by(crate::stepper::STEP_DISTANCE);
                            }
                        }
                        Keycode::Num0 => capture.set_led(LedState::Off),
                        Keycode::Num1 => capture.set_led(LedState::Green),
                        Keycode::Num2 => capture.set_led(LedState::Red),
                        Keycode::Num3 => capture.set_led(LedState::Yellow),
                        Keycode::Num4 => capture.set_led(LedState::BlinkGreen),
                        Keycode::Num5 => capture.set_led(LedState::BlinkRedYellow),
                        Keycode::H => print_controls(stepper.is_some()),
                        _ => {}
                    },
                    _ => {}
                }
            }

            let mailbox = match mode {
                ViewMode::Depth => capture.depth(),
                ViewMode::Rgb | ViewMode::Ir => capture.video(),
            };
            if mailbox.take_if_new(&mut frame) {
                self.render_frame(&frame)?;
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }

        Ok(())
    }
}

fn print_controls(has_stepper: bool) {
    println!("Available Controls");
    println!("==================");
    println!("Tilt/Pitch   :   W / S");
    if has_stepper {
        println!("Rotate/Yaw   :   A / D");
    }
    println!("Set LED mode :   0 - 5");
    println!("Toggle mode  :   M");
    println!("Quit         :   Q or Esc");
}
