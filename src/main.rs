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
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, ArgGroup, Parser, Subcommand};

use opxy_multisample::config::Settings;
use opxy_multisample::device::DeviceError;
use opxy_multisample::notes::{self, MidiKey};
use opxy_multisample::pack::{PackOptions, PackReport, Packer};
use opxy_multisample::prompt::{self, Prompter};
use opxy_multisample::record::Recorder;
use opxy_multisample::{audio, midi};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Builds multisample presets for the OP-XY."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Packs a directory of samples into a preset.
    #[clap(group(ArgGroup::new("source").required(true).args(["input", "bulk"])))]
    Pack {
        /// A directory of samples to pack into a single preset.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// A directory whose sub-directories are each packed into a preset.
        #[arg(short, long)]
        bulk: Option<PathBuf>,
        /// The directory presets are written to.
        #[arg(short, long)]
        output: PathBuf,
        /// The preset name. Inferred from the sample names if not given.
        #[arg(short, long)]
        name: Option<String>,
        /// Re-encodes samples to this sample rate if they differ.
        #[arg(short, long)]
        sample_rate: Option<u32>,
        /// Seconds to trim from the start of every sample.
        #[arg(long)]
        sample_start: Option<f64>,
        /// The path to a settings file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Records an instrument over MIDI into a preset.
    Record {
        /// The path to a settings file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Lists the available audio input devices.
    Devices {},
    /// Lists the available MIDI output devices.
    MidiDevices {},
    /// Converts a note name to a MIDI key, or a MIDI key to a note name.
    Note {
        /// A note name such as C#4, or a key from 0 to 127.
        value: String,
    },
}

fn print_report(report: &PackReport) {
    println!(
        "Packed {} ({} regions) into {}",
        report.preset_name,
        report.regions,
        report.preset_directory.display()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            input,
            bulk,
            output,
            name,
            sample_rate,
            sample_start,
            config,
        } => {
            let settings = Settings::load(config.as_deref())?;
            let options = PackOptions {
                name,
                sample_rate,
                sample_start,
                template: settings.template(),
            };
            let packer = Packer::default();

            match (input, bulk) {
                (Some(input), _) => print_report(&packer.pack(&input, &output, &options)?),
                (None, Some(bulk)) => {
                    let results = packer.pack_bulk(&bulk, &output, &options)?;
                    if results.is_empty() {
                        println!("No preset directories found in {}.", bulk.display());
                    }
                    for result in results {
                        match result.result {
                            Ok(report) => print_report(&report),
                            Err(e) => println!("Unable to pack {}: {}", result.input.display(), e),
                        }
                    }
                }
                (None, None) => return Err("either --input or --bulk is required".into()),
            }
        }
        Commands::Record { config } => {
            let settings = Settings::load(config.as_deref())?;
            let midi_devices = midi::list_devices()?;
            if midi_devices.is_empty() {
                return Err(DeviceError::NoDevices("MIDI output").into());
            }
            let audio_devices = audio::list_devices()?;
            if audio_devices.is_empty() {
                return Err(DeviceError::NoDevices("audio input").into());
            }

            let session = prompt::record_session(
                &mut Prompter::stdio(),
                &midi_devices,
                &audio_devices,
                settings.record(),
                settings.template(),
            )?;
            // Release the listing before opening the devices.
            drop(audio_devices);

            let recorder = Recorder::new(
                midi::get_device(session.midi_device)?,
                audio::get_device(session.audio_device)?,
            );
            let report = recorder.record(&session.settings)?;
            println!(
                "Recorded {} regions into {}",
                report.regions,
                report.preset_directory.display()
            );
            for skipped in &report.skipped {
                println!("  skipped key {}: {}", skipped.key, skipped.reason);
            }
            println!(
                "You may now copy {} to the OP-XY under presets/<preset group>/.",
                report.preset_directory.display()
            );
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for (index, device) in devices.iter().enumerate() {
                println!("- {}: {}", index, device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for (index, device) in devices.iter().enumerate() {
                println!("- {}: {}", index, device);
            }
        }
        Commands::Note { value } => match value.trim().parse::<i32>() {
            Ok(number) => match MidiKey::new(number) {
                Some(key) => println!("{} = {}", key, notes::midi_to_note(key)),
                None => return Err(notes::NoteError::OutOfRange(number).into()),
            },
            Err(_) => {
                let key = notes::note_to_midi(&value)?;
                println!("{} = {}", value.trim(), key);
            }
        },
    }

    Ok(())
}
