// MIDI output for generated melodies.
//
// Writes a pitch sequence as a Standard MIDI File with a single track on
// channel 0. Each pitch becomes a NoteOn at delta 0 followed by a NoteOff
// `note_duration` ticks later, so notes play back to back with no overlap
// and no rests. Output is SMF Format 1 with metrical timing.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{MarkovError, Result};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u28},
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Largest value a 15-bit ticks-per-quarter field can hold.
const MAX_TICKS_PER_QUARTER: u16 = 0x7FFF;

/// Largest delta time a MIDI event can carry (28 bits).
const MAX_DELTA: u32 = (1 << 28) - 1;

/// Timing and dynamics for the written track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiSettings {
    /// Ticks per quarter note.
    pub ticks_per_quarter: u16,
    /// Length of every note, in ticks.
    pub note_duration: u32,
    /// Velocity for both NoteOn and NoteOff.
    pub velocity: u8,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            ticks_per_quarter: 480,
            note_duration: 480,
            velocity: 100,
        }
    }
}

impl MidiSettings {
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > MAX_TICKS_PER_QUARTER {
            return Err(MarkovError::InvalidParameter(format!(
                "ticks_per_quarter must be in 1..={MAX_TICKS_PER_QUARTER}, got {}",
                self.ticks_per_quarter
            )));
        }
        if self.note_duration > MAX_DELTA {
            return Err(MarkovError::InvalidParameter(format!(
                "note_duration must be at most {MAX_DELTA} ticks, got {}",
                self.note_duration
            )));
        }
        if self.velocity > 127 {
            return Err(MarkovError::InvalidParameter(format!(
                "velocity must be at most 127, got {}",
                self.velocity
            )));
        }
        Ok(())
    }
}

/// Build an in-memory SMF for `pitches`.
pub fn melody_to_smf(pitches: &[u8], settings: &MidiSettings) -> Result<Smf<'static>> {
    settings.validate()?;
    if let Some(&pitch) = pitches.iter().find(|&&p| p > 127) {
        return Err(MarkovError::PitchOutOfRange {
            pitch: u32::from(pitch),
        });
    }

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(settings.ticks_per_quarter)),
    ));

    let channel = u4::new(0);
    let vel = u7::new(settings.velocity);
    let mut track: Track<'static> = Vec::with_capacity(pitches.len() * 2 + 1);
    for &pitch in pitches {
        let key = u7::new(pitch);
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(settings.note_duration),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel },
            },
        });
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

/// Write `pitches` as a MIDI file to `path`.
pub fn write_midi(pitches: &[u8], settings: &MidiSettings, path: &Path) -> Result<()> {
    let smf = melody_to_smf(pitches, settings)?;
    smf.save(path)?;
    Ok(())
}

/// Write `pitches` as MIDI bytes to any writer.
pub fn write_midi_to<W: Write>(pitches: &[u8], settings: &MidiSettings, writer: W) -> Result<()> {
    let smf = melody_to_smf(pitches, settings)?;
    smf.write_std(writer)?;
    Ok(())
}
