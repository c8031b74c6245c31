// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{fmt, sync::Mutex};

use midir::{MidiOutput, MidiOutputConnection};
use midly::live::LiveEvent;
use tracing::{debug, info, span, Level};

use super::VIRTUAL_PORT_NAME;
use crate::device::{self, DeviceError};

/// An open midir output connection.
pub struct Device {
    name: String,
    connection: Mutex<MidiOutputConnection>,
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn emit(&self, event: LiveEvent<'static>) -> Result<(), DeviceError> {
        let span = span!(Level::INFO, "emit (midir)");
        let _enter = span.enter();

        debug!(
            device = self.name,
            event = format!("{:?}", event),
            "Emitting event."
        );
        let mut buf: Vec<u8> = Vec::with_capacity(8);
        event
            .write(&mut buf)
            .map_err(|e| DeviceError::Midi(e.to_string()))?;
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| DeviceError::Midi("MIDI connection lock poisoned".to_string()))?;
        connection
            .send(&buf)
            .map_err(|e| DeviceError::Midi(e.to_string()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Output)", self.name)
    }
}

fn midi_output(client: &str) -> Result<MidiOutput, DeviceError> {
    MidiOutput::new(client).map_err(|e| DeviceError::Midi(e.to_string()))
}

/// Whether this platform can offer a virtual output port.
fn supports_virtual() -> bool {
    cfg!(unix)
}

/// Lists midir output ports. A virtual port is listed first where supported.
pub fn list() -> Result<Vec<String>, DeviceError> {
    let output = midi_output("opxy-multisample output listing")?;
    let mut names: Vec<String> = Vec::new();
    if supports_virtual() {
        names.push(VIRTUAL_PORT_NAME.to_string());
    }
    for port in output.ports() {
        names.push(
            output
                .port_name(&port)
                .map_err(|e| DeviceError::Midi(e.to_string()))?,
        );
    }
    Ok(names)
}

/// Opens the output at the given index of the listing.
pub fn get(index: usize) -> Result<Device, DeviceError> {
    let output = midi_output("opxy-multisample output")?;
    let offset = usize::from(supports_virtual());

    if supports_virtual() && index == 0 {
        return open_virtual(output);
    }

    let port = device::select("MIDI output", output.ports(), index - offset)
        .map_err(|e| match e {
            DeviceError::NoSuchDevice { kind, count, .. } => DeviceError::NoSuchDevice {
                kind,
                index,
                count: count + offset,
            },
            e => e,
        })?;
    let name = output
        .port_name(&port)
        .map_err(|e| DeviceError::Midi(e.to_string()))?;
    let connection = output
        .connect(&port, "opxy-multisample")
        .map_err(|e| DeviceError::Midi(e.to_string()))?;

    info!(device = name, "Connected to MIDI output.");
    Ok(Device {
        name,
        connection: Mutex::new(connection),
    })
}

#[cfg(unix)]
fn open_virtual(output: MidiOutput) -> Result<Device, DeviceError> {
    use midir::os::unix::VirtualOutput;

    let connection = output
        .create_virtual(VIRTUAL_PORT_NAME)
        .map_err(|e| DeviceError::Midi(e.to_string()))?;
    info!(device = VIRTUAL_PORT_NAME, "Created virtual MIDI output.");
    Ok(Device {
        name: VIRTUAL_PORT_NAME.to_string(),
        connection: Mutex::new(connection),
    })
}

#[cfg(not(unix))]
fn open_virtual(_output: MidiOutput) -> Result<Device, DeviceError> {
    Err(DeviceError::Midi(
        "virtual MIDI ports are not supported on this platform".to_string(),
    ))
}
