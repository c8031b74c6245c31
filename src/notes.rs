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
//! Conversion between note names (`C#4`, `Db5`, `C-1`) and MIDI keys.

use std::{fmt, str::FromStr};

use midly::num::u7;
use serde::Serialize;

/// Semitone offset of each natural letter, indexed from `A`. These already
/// include the one-octave shift that puts `C-1` at key 0.
const LETTER_OFFSETS: [i32; 7] = [21, 23, 12, 14, 16, 17, 19];

/// Canonical spelling of each pitch class. Black keys are always sharps.
const PITCH_CLASSES: [(char, Accidental); 12] = [
    ('C', Accidental::Natural),
    ('C', Accidental::Sharp),
    ('D', Accidental::Natural),
    ('D', Accidental::Sharp),
    ('E', Accidental::Natural),
    ('F', Accidental::Natural),
    ('F', Accidental::Sharp),
    ('G', Accidental::Natural),
    ('G', Accidental::Sharp),
    ('A', Accidental::Natural),
    ('A', Accidental::Sharp),
    ('B', Accidental::Natural),
];

/// Errors produced while decoding a note name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("malformed note '{0}'")]
    MalformedNote(String),

    #[error("invalid note letter '{0}'")]
    InvalidNoteLetter(char),

    #[error("note value {0} is outside the MIDI key range 0-127")]
    OutOfRange(i32),
}

/// A MIDI key in the range 0-127. Middle C is 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MidiKey(u8);

impl MidiKey {
    pub const MIN: MidiKey = MidiKey(0);
    pub const MAX: MidiKey = MidiKey(127);

    /// Creates a key if the value is within 0-127.
    pub fn new(value: i32) -> Option<MidiKey> {
        if (0..=127).contains(&value) {
            Some(MidiKey(value as u8))
        } else {
            None
        }
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// The key immediately above this one, if any.
    pub fn next(self) -> Option<MidiKey> {
        MidiKey::new(i32::from(self.0) + 1)
    }
}

impl From<MidiKey> for u7 {
    fn from(key: MidiKey) -> u7 {
        u7::new(key.0)
    }
}

impl fmt::Display for MidiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MidiKey {
    type Err = NoteError;

    /// Accepts either a plain key number or a note name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<i32>() {
            Ok(value) => MidiKey::new(value).ok_or(NoteError::OutOfRange(value)),
            Err(_) => note_to_midi(trimmed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    fn delta(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// A structured note name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName {
    pub letter: char,
    pub accidental: Accidental,
    pub octave: i32,
}

impl NoteName {
    /// Computes the MIDI value of this note, which may fall outside 0-127.
    pub fn value(&self) -> Result<i32, NoteError> {
        let index = (self.letter.to_ascii_uppercase() as i32) - ('A' as i32);
        if !(0..7).contains(&index) {
            return Err(NoteError::InvalidNoteLetter(self.letter));
        }
        Ok(self.octave * 12 + LETTER_OFFSETS[index as usize] + self.accidental.delta())
    }

    pub fn to_midi(&self) -> Result<MidiKey, NoteError> {
        let value = self.value()?;
        MidiKey::new(value).ok_or(NoteError::OutOfRange(value))
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        };
        write!(f, "{}{}{}", self.letter, accidental, self.octave)
    }
}

impl FromStr for NoteName {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| *c != ' ').collect();
        let mut chars = compact.chars();
        let (letter, rest) = match (chars.next(), chars.as_str()) {
            (Some(letter), rest) if !rest.is_empty() => (letter, rest),
            _ => return Err(NoteError::MalformedNote(s.to_string())),
        };

        let letter = letter.to_ascii_uppercase();
        if !('A'..='G').contains(&letter) {
            return Err(NoteError::InvalidNoteLetter(letter));
        }

        let (accidental, octave) = match rest.chars().next() {
            Some('#') => (Accidental::Sharp, &rest[1..]),
            Some('b') | Some('B') => (Accidental::Flat, &rest[1..]),
            _ => (Accidental::Natural, rest),
        };

        let octave = octave
            .parse::<i32>()
            .map_err(|_| NoteError::MalformedNote(s.to_string()))?;

        Ok(NoteName {
            letter,
            accidental,
            octave,
        })
    }
}

/// Decodes a note name such as `C4`, `f#2`, `Db5` or `C-1` into a MIDI key.
pub fn note_to_midi(text: &str) -> Result<MidiKey, NoteError> {
    text.parse::<NoteName>()?.to_midi()
}

/// Renders a key with its canonical (sharp) spelling. Key 60 is `C4`.
pub fn midi_to_note(key: MidiKey) -> NoteName {
    let value = i32::from(key.as_u8());
    let (letter, accidental) = PITCH_CLASSES[(value % 12) as usize];
    NoteName {
        letter,
        accidental,
        octave: value / 12 - 1,
    }
}
