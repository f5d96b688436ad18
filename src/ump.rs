//! Universal MIDI Packet word construction.
//!
//! Outbound traffic on the transport is a sequence of 32-bit UMP words.
//! This module builds the words for the common MIDI 1.0 channel voice
//! messages, exposes the system real time words as constants, and converts
//! SysEx byte streams to and from 64-bit data messages.

/// A single 32-bit Universal MIDI Packet word.
pub type Word = u32;

const MSG_TYPE_SYSTEM: Word = 0x1 << 28;
const MSG_TYPE_MIDI1: Word = 0x2 << 28;
const MSG_TYPE_DATA: Word = 0x3 << 28;

pub const CLOCK: Word = MSG_TYPE_SYSTEM | 0xF8 << 16;
pub const START: Word = MSG_TYPE_SYSTEM | 0xFA << 16;
pub const CONTINUE: Word = MSG_TYPE_SYSTEM | 0xFB << 16;
pub const STOP: Word = MSG_TYPE_SYSTEM | 0xFC << 16;
pub const ACTIVE_SENSING: Word = MSG_TYPE_SYSTEM | 0xFE << 16;
pub const RESET: Word = MSG_TYPE_SYSTEM | 0xFF << 16;

const OPCODE_SHIFT: u32 = 20;
const CHANNEL_SHIFT: u32 = 16;

const NOTE_OFF: Word = MSG_TYPE_MIDI1 | 0x8 << OPCODE_SHIFT;
const NOTE_ON: Word = MSG_TYPE_MIDI1 | 0x9 << OPCODE_SHIFT;
const POLY_PRESSURE: Word = MSG_TYPE_MIDI1 | 0xA << OPCODE_SHIFT;
const CONTROL_CHANGE: Word = MSG_TYPE_MIDI1 | 0xB << OPCODE_SHIFT;
const PROGRAM_CHANGE: Word = MSG_TYPE_MIDI1 | 0xC << OPCODE_SHIFT;
const CHANNEL_PRESSURE: Word = MSG_TYPE_MIDI1 | 0xD << OPCODE_SHIFT;
const PITCH_BEND: Word = MSG_TYPE_MIDI1 | 0xE << OPCODE_SHIFT;

fn channel_voice(opcode: Word, channel: u8, data1: u8, data2: u8) -> Word {
    opcode
        | (Word::from(channel & 0x0F) << CHANNEL_SHIFT)
        | (Word::from(data1 & 0x7F) << 8)
        | Word::from(data2 & 0x7F)
}

pub fn note_on(channel: u8, note: u8, velocity: u8) -> Word {
    channel_voice(NOTE_ON, channel, note, velocity)
}

pub fn note_off(channel: u8, note: u8, velocity: u8) -> Word {
    channel_voice(NOTE_OFF, channel, note, velocity)
}

pub fn poly_pressure(channel: u8, note: u8, pressure: u8) -> Word {
    channel_voice(POLY_PRESSURE, channel, note, pressure)
}

pub fn control_change(channel: u8, controller: u8, value: u8) -> Word {
    channel_voice(CONTROL_CHANGE, channel, controller, value)
}

pub fn program_change(channel: u8, program: u8) -> Word {
    channel_voice(PROGRAM_CHANGE, channel, program, 0)
}

pub fn channel_pressure(channel: u8, pressure: u8) -> Word {
    channel_voice(CHANNEL_PRESSURE, channel, pressure, 0)
}

/// 14-bit pitch bend, 0x2000 is center.
pub fn pitch_bend(channel: u8, value: u16) -> Word {
    channel_voice(PITCH_BEND, channel, (value & 0x7F) as u8, (value >> 7) as u8)
}

const SYSEX_BYTES_SHIFT: u32 = 16;
const SYSEX_STATUS_SHIFT: u32 = 20;
const SYSEX_STATUS_MASK: Word = 0xF << SYSEX_STATUS_SHIFT;

const SYSEX_START: Word = 0x1 << SYSEX_STATUS_SHIFT;
const SYSEX_CONTINUE: Word = 0x2 << SYSEX_STATUS_SHIFT;
const SYSEX_END: Word = 0x3 << SYSEX_STATUS_SHIFT;

/// Encodes a SysEx byte stream as 64-bit UMP data messages, two words per
/// message, six payload bytes per message.
///
/// The `0xF0`/`0xF7` framing bytes are stripped when present; UMP carries
/// the framing in the message status field instead. A payload that fits a
/// single message gets the "complete" status, longer payloads get a
/// start/continue/end run.
pub fn sysex_to_words(bytes: &[u8]) -> Vec<Word> {
    let mut payload = bytes;
    if payload.first() == Some(&0xF0) {
        payload = &payload[1..];
    }
    if payload.last() == Some(&0xF7) {
        payload = &payload[..payload.len() - 1];
    }

    let mut words = Vec::with_capacity(payload.len() / 6 * 2 + 2);
    let mut status = SYSEX_START;
    for chunk in payload.chunks(6) {
        let mut w1 = MSG_TYPE_DATA | status | (chunk.len() as Word) << SYSEX_BYTES_SHIFT;
        let mut w2: Word = 0;
        for (i, &byte) in chunk.iter().enumerate() {
            match i {
                0 => w1 |= Word::from(byte) << 8,
                1 => w1 |= Word::from(byte),
                _ => w2 |= Word::from(byte) << (8 * (5 - i)),
            }
        }
        words.push(w1);
        words.push(w2);
        status = SYSEX_CONTINUE;
    }

    match words.len() {
        0 => {}
        // a lone message carries the "complete" status of zero
        2 => words[0] &= !SYSEX_STATUS_MASK,
        // the end status bits are a superset of continue, OR is enough
        n => words[n - 2] |= SYSEX_END,
    }

    words
}

/// Extracts the payload bytes of a sequence of 64-bit UMP data messages,
/// in stream order. Non-data words are skipped. The inverse of
/// [`sysex_to_words`], minus the `0xF0`/`0xF7` framing.
pub fn sysex_payload(words: &[Word]) -> Vec<u8> {
    let mut payload = Vec::new();
    for pair in words.chunks(2) {
        let w1 = pair[0];
        if w1 & (0xF << 28) != MSG_TYPE_DATA {
            continue;
        }
        let w2 = pair.get(1).copied().unwrap_or(0);
        let count = ((w1 >> SYSEX_BYTES_SHIFT) & 0xF).min(6) as usize;
        let bytes = [
            (w1 >> 8) as u8,
            w1 as u8,
            (w2 >> 24) as u8,
            (w2 >> 16) as u8,
            (w2 >> 8) as u8,
            w2 as u8,
        ];
        payload.extend_from_slice(&bytes[..count]);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_word_layout() {
        assert_eq!(note_on(0, 0x40, 0x40), 0x2090_4040);
        assert_eq!(note_on(9, 0x24, 0x7F), 0x2099_247F);
    }

    #[test]
    fn note_off_word_layout() {
        assert_eq!(note_off(0, 0x40, 0), 0x2080_4000);
    }

    #[test]
    fn control_change_word_layout() {
        assert_eq!(control_change(2, 7, 100), 0x20B2_0764);
    }

    #[test]
    fn pitch_bend_center() {
        assert_eq!(pitch_bend(0, 0x2000), 0x20E0_0040);
    }

    #[test]
    fn system_real_time_words() {
        assert_eq!(CLOCK, 0x10F8_0000);
        assert_eq!(START, 0x10FA_0000);
        assert_eq!(STOP, 0x10FC_0000);
    }

    #[test]
    fn sysex_single_message_is_complete() {
        let words = sysex_to_words(&[0xF0, 0x7E, 0x01, 0x02, 0xF7]);
        assert_eq!(words.len(), 2);
        // message type data, complete status, three bytes
        assert_eq!(words[0], 0x3003_7E01);
        assert_eq!(words[1], 0x0200_0000);
    }

    #[test]
    fn sysex_exactly_six_bytes_is_one_message() {
        let words = sysex_to_words(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0] & SYSEX_STATUS_MASK, 0);
        assert_eq!((words[0] >> SYSEX_BYTES_SHIFT) & 0xF, 6);
    }

    #[test]
    fn sysex_long_payload_is_start_continue_end() {
        let payload: Vec<u8> = (0..14).collect();
        let words = sysex_to_words(&payload);
        assert_eq!(words.len(), 6);
        assert_eq!(words[0] & SYSEX_STATUS_MASK, SYSEX_START);
        assert_eq!(words[2] & SYSEX_STATUS_MASK, SYSEX_CONTINUE);
        assert_eq!(words[4] & SYSEX_STATUS_MASK, SYSEX_END);
        // final message holds the two remainder bytes
        assert_eq!((words[4] >> SYSEX_BYTES_SHIFT) & 0xF, 2);
    }

    #[test]
    fn sysex_empty_payload_yields_no_words() {
        assert!(sysex_to_words(&[]).is_empty());
        assert!(sysex_to_words(&[0xF0, 0xF7]).is_empty());
    }

    #[test]
    fn sysex_round_trip_preserves_bytes() {
        let payload: Vec<u8> = (0..200u8).map(|b| b & 0x7F).collect();
        let words = sysex_to_words(&payload);
        assert_eq!(sysex_payload(&words), payload);
    }

    #[test]
    fn sysex_payload_skips_non_data_words() {
        assert!(sysex_payload(&[CLOCK, 0]).is_empty());
    }
}
