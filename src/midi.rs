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
use std::{fmt, sync::Arc};

use midly::{
    live::LiveEvent,
    num::{u4, u7},
    MidiMessage,
};

use crate::device::DeviceError;
use crate::notes::MidiKey;

mod midir;
#[cfg(test)]
pub mod mock;

/// The name of the virtual output port offered on platforms that support it.
pub const VIRTUAL_PORT_NAME: &str = "Virtual Multisampler";

/// A MIDI output that notes can be played through.
pub trait Device: fmt::Display + Send + Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Emits an event.
    fn emit(&self, event: LiveEvent<'static>) -> Result<(), DeviceError>;
}

/// Builds a note on event. Channels are numbered from 0.
pub fn note_on(channel: u4, key: MidiKey, velocity: u7) -> LiveEvent<'static> {
    LiveEvent::Midi {
        channel,
        message: MidiMessage::NoteOn {
            key: key.into(),
            vel: velocity,
        },
    }
}

/// Builds a note off event. Channels are numbered from 0.
pub fn note_off(channel: u4, key: MidiKey) -> LiveEvent<'static> {
    LiveEvent::Midi {
        channel,
        message: MidiMessage::NoteOff {
            key: key.into(),
            vel: u7::new(0),
        },
    }
}

/// Lists the names of the MIDI outputs that can be opened, in index order.
pub fn list_devices() -> Result<Vec<String>, DeviceError> {
    midir::list()
}

/// Opens the MIDI output at the given index of the listing.
pub fn get_device(index: usize) -> Result<Arc<dyn Device>, DeviceError> {
    Ok(Arc::new(midir::get(index)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn note_events_encode() -> Result<(), Box<dyn std::error::Error>> {
        let key = MidiKey::new(60).expect("valid key");
        let mut buf = Vec::new();
        note_on(u4::new(0), key, u7::new(112)).write(&mut buf)?;
        assert_eq!(buf, vec![0x90, 60, 112]);

        buf.clear();
        note_off(u4::new(9), key).write(&mut buf)?;
        assert_eq!(buf, vec![0x89, 60, 0]);
        Ok(())
    }
}
