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
    time::{Duration, Instant},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, span, Level};

use crate::audio::{Capture, CaptureError, CaptureRequest, Device as AudioDevice, Recording};
use crate::device::DeviceError;

/// How long past the expected end of a capture to wait for the device.
const CAPTURE_GRACE: Duration = Duration::from_secs(2);

/// A small wrapper around a cpal::Device that remembers how many input
/// channels it offers.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of input channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal input devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, DeviceError> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal input devices across every available host.
    pub fn list_cpal_devices() -> Result<Vec<Device>, DeviceError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(|e| DeviceError::Audio(e.to_string()))?;
            let host_devices = match host.input_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let input_configs = match device.supported_input_configs() {
                    Ok(input_configs) => input_configs,
                    Err(_) => continue,
                };
                let max_channels = input_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    let name = device
                        .description()
                        .map(|description| description.name().to_string())
                        .map_err(|e| DeviceError::Audio(e.to_string()))?;
                    devices.push(Device {
                        name,
                        max_channels,
                        host_id,
                        device,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Finds a supported input configuration that offers enough channels at
    /// the requested sample rate, preferring the fewest channels.
    fn input_config(&self, channels: u16, sample_rate: u32) -> Result<cpal::SupportedStreamConfig, CaptureError> {
        let unsupported = || CaptureError::UnsupportedConfig {
            device: self.name.clone(),
            channels,
            sample_rate,
        };
        self.device
            .supported_input_configs()
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .filter(|config| config.channels() >= channels)
            .filter_map(|config| config.try_with_sample_rate(sample_rate))
            .min_by_key(|config| config.channels())
            .ok_or_else(unsupported)
    }
}

/// Builds an input callback that converts samples to f32 and forwards them.
fn create_input_callback<T>(
    sender: Sender<Vec<f32>>,
) -> impl FnMut(&[T], &cpal::InputCallbackInfo) + Send + 'static
where
    T: cpal::Sample,
    f32: cpal::FromSample<T>,
{
    move |data: &[T], _: &cpal::InputCallbackInfo| {
        let samples: Vec<f32> = data.iter().map(|sample| sample.to_sample::<f32>()).collect();
        // The receiver goes away once the capture is complete.
        let _ = sender.send(samples);
    }
}

impl AudioDevice for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn max_input_channels(&self) -> u16 {
        self.max_channels
    }

    fn start_capture(&self, request: &CaptureRequest) -> Result<Box<dyn Capture>, CaptureError> {
        let span = span!(Level::INFO, "start capture (cpal)");
        let _enter = span.enter();

        for channel in &request.channels {
            if *channel == 0 || *channel > self.max_channels {
                return Err(CaptureError::InvalidChannel {
                    channel: *channel,
                    available: self.max_channels,
                });
            }
        }
        let needed = request.channels.iter().copied().max().unwrap_or(1);
        let supported = self.input_config(needed, request.sample_rate)?;
        let config = supported.config();

        let (sender, receiver) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (error_sender, error_receiver) = crossbeam_channel::bounded::<String>(1);
        let error_callback = move |err: cpal::StreamError| {
            error!(err = err.to_string(), "Error during input stream.");
            let _ = error_sender.try_send(err.to_string());
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => self.device.build_input_stream(
                &config,
                create_input_callback::<f32>(sender),
                error_callback,
                None,
            ),
            cpal::SampleFormat::I16 => self.device.build_input_stream(
                &config,
                create_input_callback::<i16>(sender),
                error_callback,
                None,
            ),
            cpal::SampleFormat::I32 => self.device.build_input_stream(
                &config,
                create_input_callback::<i32>(sender),
                error_callback,
                None,
            ),
            cpal::SampleFormat::U16 => self.device.build_input_stream(
                &config,
                create_input_callback::<u16>(sender),
                error_callback,
                None,
            ),
            format => return Err(CaptureError::UnsupportedFormat(format.to_string())),
        }
        .map_err(|e| CaptureError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        info!(
            device = self.name,
            channels = format!("{:?}", request.channels),
            sample_rate = request.sample_rate,
            frames = request.frames,
            "Capturing audio."
        );

        Ok(Box::new(CpalCapture {
            stream,
            receiver,
            errors: error_receiver,
            stream_channels: config.channels,
            request: request.clone(),
            started: Instant::now(),
        }))
    }
}

/// A running cpal input stream.
struct CpalCapture {
    stream: cpal::Stream,
    receiver: Receiver<Vec<f32>>,
    errors: Receiver<String>,
    stream_channels: u16,
    request: CaptureRequest,
    started: Instant,
}

impl Capture for CpalCapture {
    fn finish(self: Box<Self>) -> Result<Recording, CaptureError> {
        let expected =
            Duration::from_secs_f64(self.request.frames as f64 / f64::from(self.request.sample_rate));
        let deadline = self.started + expected + CAPTURE_GRACE;
        let mut frames = ChannelPicker::new(self.stream_channels, &self.request.channels);

        while frames.captured() < self.request.frames {
            if let Ok(err) = self.errors.try_recv() {
                return Err(CaptureError::Stream(err));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(buffer) => frames.push(&buffer),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::Timeout {
                        captured: frames.captured(),
                        requested: self.request.frames,
                    })
                }
            }
        }

        if let Err(e) = self.stream.pause() {
            debug!(err = e.to_string(), "Unable to pause input stream.");
        }

        Ok(frames.into_recording(self.request.sample_rate, self.request.frames))
    }
}

/// Extracts the requested channels out of interleaved device buffers.
struct ChannelPicker {
    stream_channels: usize,
    /// Zero-based device channel indices.
    picks: Vec<usize>,
    samples: Vec<f32>,
}

impl ChannelPicker {
    fn new(stream_channels: u16, channels: &[u16]) -> ChannelPicker {
        ChannelPicker {
            stream_channels: usize::from(stream_channels.max(1)),
            picks: channels
                .iter()
                .map(|channel| usize::from(channel.saturating_sub(1)))
                .collect(),
            samples: Vec::new(),
        }
    }

    fn push(&mut self, buffer: &[f32]) {
        for frame in buffer.chunks_exact(self.stream_channels) {
            for pick in &self.picks {
                self.samples.push(frame.get(*pick).copied().unwrap_or(0.0));
            }
        }
    }

    fn captured(&self) -> usize {
        if self.picks.is_empty() {
            0
        } else {
            self.samples.len() / self.picks.len()
        }
    }

    fn into_recording(mut self, sample_rate: u32, frames: usize) -> Recording {
        self.samples.truncate(frames * self.picks.len());
        Recording {
            sample_rate,
            channels: self.picks.len() as u16,
            samples: self.samples,
        }
    }
}
