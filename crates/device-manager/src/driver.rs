//! Line-command driver standing in for the node agent.
//!
//! Each input line is one command; each command produces one JSON line.
//!
//! | command   | action                                   |
//! |-----------|------------------------------------------|
//! | `start`   | local start message                      |
//! | `recover` | local start message with recovery set    |
//! | `stop`    | local stop message                       |
//! | `status`  | status request                           |
//! | `quit`    | stop the device and exit                 |
//!
//! End of input behaves like `quit`.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::lifecycle::{DeviceManager, LifecycleMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Recover,
    Stop,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "recover" => Ok(Command::Recover),
            "stop" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

/// Run commands from `input` against `device` until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if reading input or writing a reply fails.
pub fn run<D, R, W>(device: &mut D, input: R, mut output: W) -> Result<()>
where
    D: DeviceManager,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                warn!(%message, "rejected command");
                reply(&mut output, &json!({ "error": message }))?;
                continue;
            }
        };
        match command {
            Command::Start | Command::Recover => {
                let is_recovery = command == Command::Recover;
                let ack = device.handle_message(LifecycleMessage::LocalStartDeviceManager { is_recovery });
                reply(&mut output, &ack)?;
            }
            Command::Stop => {
                let ack = device.handle_message(LifecycleMessage::LocalStopDeviceManager);
                reply(&mut output, &ack)?;
            }
            Command::Status => {
                let status = device.handle_status();
                reply(&mut output, &status)?;
            }
            Command::Quit => {
                info!("quit requested");
                break;
            }
        }
    }

    let ack = device.handle_message(LifecycleMessage::LocalStopDeviceManager);
    reply(&mut output, &ack)
}

fn reply<W: Write, T: Serialize>(output: &mut W, body: &T) -> Result<()> {
    serde_json::to_writer(&mut *output, body).context("failed to encode reply")?;
    output.write_all(b"\n").context("failed to write reply")?;
    output.flush().context("failed to flush reply")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DeviceState;

    #[derive(Default)]
    struct FakeDevice {
        running: bool,
        starts: Vec<bool>,
        stops: usize,
    }

    impl DeviceManager for FakeDevice {
        type Status = serde_json::Value;

        fn name(&self) -> &str {
            "fake"
        }

        fn state(&self) -> DeviceState {
            if self.running {
                DeviceState::Running
            } else {
                DeviceState::Stopped
            }
        }

        fn start(&mut self, is_recovery: bool) {
            self.starts.push(is_recovery);
            self.running = true;
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.running = false;
        }

        fn handle_status(&mut self) -> serde_json::Value {
            json!({ "isAlive": self.running })
        }
    }

    fn drive(device: &mut FakeDevice, input: &str) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        run(device, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn commands_map_to_lifecycle_messages() {
        let mut device = FakeDevice::default();
        let replies = drive(&mut device, "start\nstatus\nrecover\nstop\nquit\nstart\n");

        assert_eq!(device.starts, vec![false, true]);
        // explicit stop plus the final stop on quit
        assert_eq!(device.stops, 2);
        assert_eq!(replies.len(), 5);
        assert_eq!(replies[0], json!({ "device": "fake", "state": "RUNNING" }));
        assert_eq!(replies[1], json!({ "isAlive": true }));
        assert_eq!(replies[3]["state"], "STOPPED");
        assert_eq!(replies[4]["state"], "STOPPED");
    }

    #[test]
    fn end_of_input_stops_device() {
        let mut device = FakeDevice::default();
        let replies = drive(&mut device, "start\n");
        assert!(!device.running);
        assert_eq!(device.stops, 1);
        assert_eq!(replies.last().unwrap()["state"], "STOPPED");
    }

    #[test]
    fn unknown_commands_are_reported_and_skipped() {
        let mut device = FakeDevice::default();
        let replies = drive(&mut device, "\nbogus\n STATUS \n");
        assert_eq!(replies[0]["error"], "unknown command: bogus");
        assert_eq!(replies[1], json!({ "isAlive": false }));
    }

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!("Recover".parse::<Command>(), Ok(Command::Recover));
        assert_eq!(" stop ".parse::<Command>(), Ok(Command::Stop));
        assert!("restart".parse::<Command>().is_err());
    }
}
