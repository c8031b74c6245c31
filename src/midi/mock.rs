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
use std::{
    fmt,
    sync::{Arc, Mutex},
};

use midly::live::LiveEvent;

use crate::device::DeviceError;

/// A mock device. Remembers every event it was asked to emit.
#[derive(Clone)]
pub struct Device {
    name: String,
    emitted: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            emitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gets every event emitted so far.
    pub fn emitted_events(&self) -> Vec<Vec<u8>> {
        self.emitted
            .lock()
            .expect("unable to get emitted lock")
            .clone()
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn emit(&self, event: LiveEvent<'static>) -> Result<(), DeviceError> {
        let mut buf: Vec<u8> = Vec::with_capacity(8);
        event
            .write(&mut buf)
            .map_err(|e| DeviceError::Midi(e.to_string()))?;
        self.emitted
            .lock()
            .expect("unable to get emitted lock")
            .push(buf);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
