//! Hand-declared CoreMIDI event-list API.
//!
//! `coremidi-sys` predates the UMP event-list functions, so the types and
//! externs needed for word-based I/O are declared here. Layouts mirror the
//! `MIDIServices.h` declarations, which are packed to 4 bytes.

#![allow(non_snake_case, non_upper_case_globals, non_camel_case_types)]

use std::os::raw::c_void;

use block::Block;
use core_foundation_sys::base::OSStatus;
use core_foundation_sys::string::CFStringRef;
use coremidi_sys::{ByteCount, MIDIClientRef, MIDIEndpointRef, MIDIPortRef, MIDITimeStamp};

pub type MIDIProtocolID = i32;

pub const kMIDIProtocol_1_0: MIDIProtocolID = 1;

/// Largest word count one `MIDIEventPacket` can carry.
pub const MIDI_EVENT_PACKET_WORDS: usize = 64;

#[repr(C, packed(4))]
pub struct MIDIEventPacket {
    pub timeStamp: MIDITimeStamp,
    pub wordCount: u32,
    pub words: [u32; MIDI_EVENT_PACKET_WORDS],
}

#[repr(C, packed(4))]
pub struct MIDIEventList {
    pub protocol: MIDIProtocolID,
    pub numPackets: u32,
    pub packet: [MIDIEventPacket; 1],
}

extern "C" {
    pub fn MIDIInputPortCreateWithProtocol(
        client: MIDIClientRef,
        portName: CFStringRef,
        protocol: MIDIProtocolID,
        outPort: *mut MIDIPortRef,
        receiveBlock: &Block<(*const MIDIEventList, *mut c_void), ()>,
    ) -> OSStatus;

    pub fn MIDIEventListInit(
        evtlist: *mut MIDIEventList,
        protocol: MIDIProtocolID,
    ) -> *mut MIDIEventPacket;

    pub fn MIDIEventListAdd(
        evtlist: *mut MIDIEventList,
        listSize: ByteCount,
        curPacket: *mut MIDIEventPacket,
        time: MIDITimeStamp,
        wordCount: ByteCount,
        words: *const u32,
    ) -> *mut MIDIEventPacket;

    pub fn MIDISendEventList(
        port: MIDIPortRef,
        dest: MIDIEndpointRef,
        evtlist: *const MIDIEventList,
    ) -> OSStatus;
}

/// `MIDIEventPacketNext` is inline in the system headers: the next packet
/// starts right after this packet's used words.
///
/// # Safety
/// `pkt` must point into a live event list with at least one more packet.
pub unsafe fn event_packet_next(pkt: *const MIDIEventPacket) -> *const MIDIEventPacket {
    let words = std::ptr::addr_of!((*pkt).words) as *const u32;
    words.add((*pkt).wordCount as usize) as *const MIDIEventPacket
}
