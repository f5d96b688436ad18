use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::graph::Node;
use crate::ump::Word;

/// Native status code returned by every OS MIDI call. Zero means success;
/// any other value is passed through untouched for diagnostics.
pub type OsStatus = i32;

/// Host clock timestamp in native ticks. Zero means "send immediately".
pub type Timestamp = u64;

/// Opaque reference-sized token naming a native source or destination.
/// Minted and owned by the OS; never interpreted by this crate.
pub type Endpoint = u64;

/// Opaque token for one client registration with a service.
pub type ClientRef = u64;

/// Opaque token for one port owned by a client.
pub type PortRef = u64;

pub type OsResult<T> = std::result::Result<T, OsStatus>;

/// Callback invoked once per inbound packet, on the service's own receive
/// thread. Must not block. The word slice is only valid for the duration
/// of the call; copy it to retain the data.
pub type ReceiveHandler = Arc<dyn Fn(Timestamp, Endpoint, &[Word]) + Send + Sync>;

/// The operating system's MIDI service, reduced to the calls the transport
/// needs. Implementations map each call onto exactly one native operation
/// and report the native status code unmodified.
pub trait MidiService: Send + Sync {
    fn create_client(&self, name: &str) -> OsResult<ClientRef>;

    /// Creates an input port delivering inbound packets to `handler`.
    /// Delivery starts as soon as a source is connected and runs on a
    /// thread owned by the service.
    fn create_input_port(
        &self,
        client: ClientRef,
        name: &str,
        handler: ReceiveHandler,
    ) -> OsResult<PortRef>;

    fn create_output_port(&self, client: ClientRef, name: &str) -> OsResult<PortRef>;

    /// Connects `source` to an input port. The source token doubles as the
    /// connection context, so the receive handler sees which source
    /// produced each packet.
    fn connect_source(&self, port: PortRef, source: Endpoint) -> OsResult<()>;

    /// Enqueues one outbound packet. Returns once the service has accepted
    /// the packet; delivery is not confirmed.
    fn submit(
        &self,
        port: PortRef,
        destination: Endpoint,
        timestamp: Timestamp,
        words: &[Word],
    ) -> OsResult<()>;

    fn dispose_port(&self, port: PortRef);

    fn dispose_client(&self, client: ClientRef);

    /// Largest number of words one submitted packet may carry.
    fn max_packet_words(&self) -> usize;

    /// Snapshot of the endpoint topology currently visible to the service.
    fn enumerate(&self) -> OsResult<Node>;
}

/// The native operation a [`TransportError::Os`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedOp {
    CreateClient,
    CreateInputPort,
    CreateOutputPort,
    ConnectSource,
    Submit,
    Enumerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Operation requires a successful `init` first.
    NotInitialized,
    /// `init` called while already initialized.
    AlreadyInitialized,
    /// The transport was shut down; the state is terminal.
    ShutDown,
    /// A native call failed; `status` is the untouched OS status code.
    Os { op: FailedOp, status: OsStatus },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotInitialized => write!(f, "transport is not initialized"),
            TransportError::AlreadyInitialized => write!(f, "transport is already initialized"),
            TransportError::ShutDown => write!(f, "transport has been shut down"),
            TransportError::Os { op, status } => {
                let what = match op {
                    FailedOp::CreateClient => "client creation",
                    FailedOp::CreateInputPort => "input port creation",
                    FailedOp::CreateOutputPort => "output port creation",
                    FailedOp::ConnectSource => "source connection",
                    FailedOp::Submit => "send",
                    FailedOp::Enumerate => "enumeration",
                };
                write!(f, "{} failed with status {}", what, status)
            }
        }
    }
}

impl Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;
