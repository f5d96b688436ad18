//! Native MIDI transport binding.
//!
//! This module owns the lifecycle of one native MIDI client and its input
//! and output ports, and moves Universal MIDI Packet words across the OS
//! boundary in both directions. The main components are:
//!
//! - [`MidiService`] trait: the OS MIDI service reduced to the calls the
//!   transport needs, with native status codes as the only error channel
//! - [`Transport`]: the binding proper, with its
//!   `Uninitialized -> Initialized -> ShutDown` lifecycle
//! - `CoreMidiService`: the real backend on macOS
//! - [`MockMidiService`]: recording, scriptable backend for tests
//! - [`NopService`]: stand-in backend for unsupported platforms

mod service;
mod transport;

pub mod mock_service;
pub mod nop_service;

#[cfg(target_os = "macos")]
mod coremidi_sys_ext;

#[cfg(target_os = "macos")]
pub mod coremidi_service;

pub use service::{
    ClientRef, Endpoint, FailedOp, MidiService, OsResult, OsStatus, PortRef, ReceiveHandler,
    Result, Timestamp, TransportError,
};
pub use transport::{InputEvent, Transport};

pub use mock_service::{MockMidiService, Submission};
pub use nop_service::NopService;

#[cfg(target_os = "macos")]
pub use coremidi_service::CoreMidiService;

// Re-exported for convenience, packets are sequences of these.
pub use crate::ump::Word;

/// The native backend for the current platform.
#[cfg(target_os = "macos")]
pub type DefaultMidiService = CoreMidiService;

/// The native backend for the current platform. No backend exists here,
/// so every operation fails with a typed error instead of crashing.
#[cfg(not(target_os = "macos"))]
pub type DefaultMidiService = NopService;
