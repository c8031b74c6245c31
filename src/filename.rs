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
//! Extracts an instrument name and a key from sample filenames such as
//! `Rhodes Mark 1-096-127 Ab5.WAV` or `My Awesome Sample-48.wav`.

use std::path::{Path, PathBuf};

use crate::notes::{self, MidiKey, NoteError};

/// Separates the instrument name from the key portion of a filename.
const SEPARATOR: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("filename '{0}' has no recognizable key")]
    UnrecognizedKeyToken(String),

    #[error("filename '{0}': {1}")]
    Note(String, NoteError),

    #[error("filename '{0}': key {1} is outside the MIDI key range 0-127")]
    KeyOutOfRange(String, i64),
}

/// One sample file, as understood from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    /// The sanitized instrument name.
    pub base_name: String,
    /// The key the sample was recorded at.
    pub key: MidiKey,
    /// Where the sample lives on disk.
    pub source_path: PathBuf,
    /// The name the sample is written under in the preset directory.
    pub sanitized_filename: String,
    /// The velocity named after the key, as in `Piano-48-127.wav`.
    pub velocity: Option<u32>,
}

impl SampleEntry {
    /// Builds an entry from a file on disk.
    pub fn from_path(path: &Path) -> Result<SampleEntry, FilenameError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let (base_name, key) = parse_filename(&filename)?;

        Ok(SampleEntry {
            base_name,
            key,
            source_path: path.to_path_buf(),
            sanitized_filename: sanitize_name(&filename),
            velocity: parse_velocity(&filename),
        })
    }
}

/// Strips every character that isn't safe in a preset or sample filename.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '#' | '-' | '(' | ')' | '.'))
        .collect()
}

/// Splits a filename into its sanitized base name and its key.
///
/// The remainder after the first hyphen is searched for a note token first;
/// only if there is none does the first run of digits count as the key.
pub fn parse_filename(filename: &str) -> Result<(String, MidiKey), FilenameError> {
    let (head, remainder) = filename
        .split_once(SEPARATOR)
        .ok_or_else(|| FilenameError::UnrecognizedKeyToken(filename.to_string()))?;
    let base_name = sanitize_name(head);

    if let Some(token) = find_note_token(remainder) {
        let key = notes::note_to_midi(token).map_err(|e| match e {
            NoteError::OutOfRange(value) => {
                FilenameError::KeyOutOfRange(filename.to_string(), value.into())
            }
            e => FilenameError::Note(filename.to_string(), e),
        })?;
        return Ok((base_name, key));
    }

    if let Some(digits) = find_digit_run(remainder) {
        let value = digits
            .parse::<i64>()
            .map_err(|_| FilenameError::KeyOutOfRange(filename.to_string(), i64::MAX))?;
        let key = i32::try_from(value)
            .ok()
            .and_then(MidiKey::new)
            .ok_or_else(|| FilenameError::KeyOutOfRange(filename.to_string(), value))?;
        return Ok((base_name, key));
    }

    Err(FilenameError::UnrecognizedKeyToken(filename.to_string()))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `text[start..end]` sits between word boundaries. Both offsets must
/// be on character boundaries.
fn bounded(text: &str, start: usize, end: usize) -> bool {
    let before = !matches!(text[..start].chars().next_back(), Some(c) if is_word(c));
    let after = !matches!(text[end..].chars().next(), Some(c) if is_word(c));
    before && after
}

/// Reads the velocity from a filename: the last standalone number after the
/// first hyphen that isn't the key itself.
pub fn parse_velocity(filename: &str) -> Option<u32> {
    let (_, remainder) = filename.split_once(SEPARATOR)?;
    let stem = remainder
        .rsplit_once('.')
        .map_or(remainder, |(stem, _)| stem);
    let runs = digit_runs(stem);

    let velocity = match note_token_span(stem) {
        Some((start, end)) => runs
            .into_iter()
            .rfind(|&(a, b)| b <= start || a >= end),
        None => runs.into_iter().skip(1).next_back(),
    };
    velocity.and_then(|(start, end)| stem[start..end].parse().ok())
}

/// Finds the first standalone note token: an uppercase letter A-G, an optional
/// `b`, `#` or `-`, an optional `-`, and a single octave digit.
fn find_note_token(text: &str) -> Option<&str> {
    note_token_span(text).map(|(start, end)| &text[start..end])
}

fn note_token_span(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    for start in 0..bytes.len() {
        if !(b'A'..=b'G').contains(&bytes[start]) {
            continue;
        }
        let mut pos = start + 1;
        if pos < bytes.len() && matches!(bytes[pos], b'b' | b'#' | b'-') {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'-' {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos].is_ascii_digit() && bounded(text, start, pos + 1) {
            return Some((start, pos + 1));
        }
    }
    None
}

/// Finds the first standalone run of decimal digits.
fn find_digit_run(text: &str) -> Option<&str> {
    digit_runs(text)
        .first()
        .map(|&(start, end)| &text[start..end])
}

/// Every standalone run of decimal digits, as byte spans.
fn digit_runs(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        if !bytes[start].is_ascii_digit() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if bounded(text, start, end) {
            runs.push((start, end));
        }
        start = end;
    }
    runs
}
