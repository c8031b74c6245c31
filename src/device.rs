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
use std::io;

/// Errors raised while discovering or opening audio and MIDI devices.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no {kind} device at index {index} ({count} available)")]
    NoSuchDevice {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("no {0} devices found")]
    NoDevices(&'static str),

    #[error("audio device error: {0}")]
    Audio(String),

    #[error("MIDI device error: {0}")]
    Midi(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Picks the device at the given index out of a listing.
pub fn select<T>(kind: &'static str, devices: Vec<T>, index: usize) -> Result<T, DeviceError> {
    let count = devices.len();
    if count == 0 {
        return Err(DeviceError::NoDevices(kind));
    }
    devices
        .into_iter()
        .nth(index)
        .ok_or(DeviceError::NoSuchDevice { kind, index, count })
}
