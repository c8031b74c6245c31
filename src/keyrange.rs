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
//! Partitions the MIDI keyboard between a set of samples.
//!
//! Every key from 0 to 127 is covered by exactly one range. Each sample owns the
//! keys from just above the previous sample's key up to and including its own
//! key; the lowest sample also owns everything below it and the highest sample
//! everything above it.

use std::collections::{btree_map::Entry, BTreeMap};

use tracing::warn;

use crate::filename::SampleEntry;
use crate::notes::MidiKey;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("no samples to assign")]
    EmptyInput,
}

/// Explicit loop points, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopOverride {
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub crossfade: u64,
}

/// A sample along with the metadata needed to place it on the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignInput {
    pub entry: SampleEntry,
    pub frame_count: u64,
    /// First frame to play back, if the sample is trimmed.
    pub sample_start: Option<u64>,
    pub loops: LoopOverride,
}

impl AssignInput {
    pub fn new(entry: SampleEntry, frame_count: u64) -> AssignInput {
        AssignInput {
            entry,
            frame_count,
            sample_start: None,
            loops: LoopOverride::default(),
        }
    }
}

/// A contiguous span of keys played back by one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub low_key: MidiKey,
    pub hi_key: MidiKey,
    pub center_key: MidiKey,
    pub sample: SampleEntry,
    pub frame_count: u64,
    pub sample_start: Option<u64>,
    pub loop_start: u64,
    pub loop_end: u64,
    pub loop_crossfade: u64,
}

impl KeyRange {
    /// Whether the given key falls inside this range.
    pub fn contains(&self, key: MidiKey) -> bool {
        self.low_key <= key && key <= self.hi_key
    }
}

/// Keeps one input per key. When several inputs share a key, the one with the
/// highest velocity wins; between equal (or missing) velocities the last one
/// in input order wins. The result is ordered by key.
pub fn dedupe(inputs: Vec<AssignInput>) -> BTreeMap<MidiKey, AssignInput> {
    let mut by_key: BTreeMap<MidiKey, AssignInput> = BTreeMap::new();
    for input in inputs {
        match by_key.entry(input.entry.key) {
            Entry::Vacant(slot) => {
                slot.insert(input);
            }
            Entry::Occupied(mut slot) => {
                let (kept, dropped) = if input.entry.velocity >= slot.get().entry.velocity {
                    let dropped = slot.insert(input);
                    (slot.get().entry.sanitized_filename.clone(), dropped)
                } else {
                    (slot.get().entry.sanitized_filename.clone(), input)
                };
                warn!(
                    key = dropped.entry.key.as_u8(),
                    dropped = dropped.entry.sanitized_filename,
                    kept,
                    "Multiple samples map to the same key, keeping one."
                );
            }
        }
    }
    by_key
}

/// Loop points for a sample: explicit overrides where given, otherwise 25% and
/// 75% of the frame count. Always satisfies
/// `sample_start <= loop_start <= loop_end <= frame_count`.
fn loop_points(input: &AssignInput) -> (u64, u64) {
    let frames = input.frame_count;
    let floor = input.sample_start.unwrap_or(0).min(frames);
    let end = input.loops.end.unwrap_or(frames * 3 / 4).clamp(floor, frames);
    let start = input.loops.start.unwrap_or(frames / 4).clamp(floor, end);
    (start, end)
}

/// Assigns key ranges to the given samples.
pub fn assign(inputs: Vec<AssignInput>) -> Result<Vec<KeyRange>, AssignError> {
    let by_key = dedupe(inputs);
    let count = by_key.len();
    if count == 0 {
        return Err(AssignError::EmptyInput);
    }

    let mut ranges: Vec<KeyRange> = Vec::with_capacity(count);
    for (index, (key, input)) in by_key.into_iter().enumerate() {
        let low_key = match ranges.last() {
            // The previous hi key is always below this key, so next() exists.
            Some(previous) => previous.hi_key.next().unwrap_or(MidiKey::MAX),
            None => MidiKey::MIN,
        };
        let hi_key = if index + 1 == count {
            MidiKey::MAX
        } else {
            key
        };
        let (loop_start, loop_end) = loop_points(&input);

        ranges.push(KeyRange {
            low_key,
            hi_key,
            center_key: key,
            frame_count: input.frame_count,
            sample_start: input.sample_start.map(|start| start.min(input.frame_count)),
            loop_start,
            loop_end,
            loop_crossfade: input.loops.crossfade,
            sample: input.entry,
        });
    }

    Ok(ranges)
}
