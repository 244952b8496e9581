//! Kinect preview with a stepper motor sweeping the sensor over serial

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing::info;

use depthview::capture::{KinectCapture, VideoFormat};
use depthview::display::{Sdl2Display, ViewMode};
use depthview::stepper::StepperController;
use depthview::Config;

#[derive(Parser, Debug)]
#[command(about = "Kinect preview driving a stepper motor over serial")]
struct Args {
    /// Serial port for the stepper driver
    #[arg(long)]
    port: String,

    /// Baud rate for the stepper driver
    #[arg(long, default_value_t = 9600)]
    baud: u32,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("depthview=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let args = Args::parse();

    info!("radar launching...");
    let config = Config::default();

    let capture = KinectCapture::start(&config.capture)?;
    let stepper = StepperController::open(&args.port, args.baud)?;

    // Radar starts on the color stream with the head level.
    capture.set_video_format(VideoFormat::Rgb);
    capture.set_tilt(0.0);

    let sdl_context = sdl2::init().map_err(|e| eyre!(e))?;
    let mut app = Sdl2Display::new(
        &sdl_context,
        "Kinect Radar",
        config.display.width,
        config.display.height,
    )?;
    app.run(&sdl_context, &capture, Some(&stepper), ViewMode::Rgb)?;

    capture.stop();
    info!("radar shutting down");
    Ok(())
}
