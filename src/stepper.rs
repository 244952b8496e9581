//! Serial stepper controller for the radar variant
//!
//! Fire-and-forget text protocol: each move is `"<signed-distance>\n"` on the
//! wire, nothing is read back. Writes happen on a worker thread so a slow or
//! wedged serial line never stalls the render loop; the thread ends when the
//! controller is dropped.

use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;

/// Distance of one keyboard-driven move, in stepper driver units.
pub const STEP_DISTANCE: i32 = 50;

/// Handle to the stepper's serial writer thread.
pub struct StepperController {
    commands: flume::Sender<i32>,
}

impl StepperController {
    /// Open the serial port and spawn the writer thread.
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(250))
            .open()?;
        info!("stepper serial port {path} open at {baud} baud");

        let (tx, rx) = flume::unbounded();
        thread::Builder::new()
            .name("stepper-serial".into())
            .spawn(move || pump_commands(rx, port))?;

        Ok(Self { commands: tx })
    }

    /// Queue a relative move. Never blocks; a dead writer thread means the
    /// command is silently dropped, matching the no-acknowledgement protocol.
    pub fn move_by(&self, distance: i32) {
        let _ = self.commands.send(distance);
    }
}

fn pump_commands<W: Write>(commands: flume::Receiver<i32>, mut port: W) {
    for distance in commands.iter() {
        if let Err(e) = port.write_all(encode_move(distance).as_bytes()) {
            warn!("stepper write failed: {e}");
        }
    }
}

fn encode_move(distance: i32) -> String {
    format!("{distance}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_are_signed_newline_terminated_integers() {
        assert_eq!(encode_move(50), "50\n");
        assert_eq!(encode_move(-50), "-50\n");
        assert_eq!(encode_move(0), "0\n");
    }

    #[test]
    fn pump_writes_commands_in_order() {
        let (tx, rx) = flume::unbounded();
        tx.send(-50).unwrap();
        tx.send(50).unwrap();
        tx.send(125).unwrap();
        drop(tx);

        let mut wire = Vec::new();
        pump_commands(rx, &mut wire);
        assert_eq!(wire, b"-50\n50\n125\n");
    }
}
