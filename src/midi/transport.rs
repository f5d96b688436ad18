use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crossbeam::channel::{unbounded, Receiver};
use log::{debug, info, warn};

use super::service::{
    ClientRef, Endpoint, FailedOp, MidiService, PortRef, ReceiveHandler, Result, Timestamp,
    TransportError,
};
use crate::graph::Node;
use crate::ump::{self, Word};

/// An owned copy of one inbound packet, safe to hold beyond the callback
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub timestamp: Timestamp,
    pub source: Endpoint,
    pub words: Vec<Word>,
}

#[derive(Clone, Copy)]
enum State {
    Uninitialized,
    Initialized {
        client: ClientRef,
        input: PortRef,
        output: PortRef,
    },
    ShutDown,
}

impl State {
    fn ports(&self) -> Result<(PortRef, PortRef)> {
        match *self {
            State::Initialized { input, output, .. } => Ok((input, output)),
            State::Uninitialized => Err(TransportError::NotInitialized),
            State::ShutDown => Err(TransportError::ShutDown),
        }
    }
}

type Handler = Box<dyn Fn(Timestamp, Endpoint, &[Word]) + Send + Sync>;

/// Shared between the transport and the callback held by the service.
/// Deliveries run under the handler read lock, so taking the write lock
/// fences against every in-flight callback invocation.
struct EventSink {
    closing: AtomicBool,
    handler: RwLock<Handler>,
}

impl EventSink {
    fn new() -> EventSink {
        EventSink {
            closing: AtomicBool::new(false),
            handler: RwLock::new(Box::new(|_, _, _| {})),
        }
    }

    fn deliver(&self, timestamp: Timestamp, source: Endpoint, words: &[Word]) {
        if self.closing.load(Ordering::Acquire) {
            return;
        }
        let handler = self
            .handler
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        handler(timestamp, source, words);
    }

    fn install(&self, handler: Handler) {
        let mut slot = self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = handler;
    }

    fn close(&self) {
        self.closing.store(true, Ordering::Release);
        // waits out any delivery still holding the read lock
        self.install(Box::new(|_, _, _| {}));
    }
}

/// The MIDI transport binding: one native client, one input port, one
/// output port, owned for the lifetime of this value.
///
/// Construction never touches the OS; [`Transport::init`] registers the
/// client and ports, [`Transport::shutdown`] releases them. The state
/// machine is `Uninitialized -> Initialized -> ShutDown`, with `ShutDown`
/// terminal. Every operation is callable from any thread.
pub struct Transport<S: MidiService> {
    service: S,
    name: String,
    state: Mutex<State>,
    sink: Arc<EventSink>,
}

impl<S: MidiService> Transport<S> {
    /// Allocates transport state. Pure memory operation; never fails.
    pub fn new(service: S, name: impl Into<String>) -> Transport<S> {
        Transport {
            service,
            name: name.into(),
            state: Mutex::new(State::Uninitialized),
            sink: Arc::new(EventSink::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the client with the OS MIDI service and creates the input
    /// and output ports. The receive callback is installed here, exactly
    /// once; inbound delivery begins as soon as a source is connected.
    ///
    /// If a later step fails, every resource created by an earlier step is
    /// released before returning, and the transport stays uninitialized.
    pub fn init(&self) -> Result<()> {
        let mut state = self.state();
        match *state {
            State::Uninitialized => {}
            State::Initialized { .. } => return Err(TransportError::AlreadyInitialized),
            State::ShutDown => return Err(TransportError::ShutDown),
        }

        debug!("creating MIDI client '{}'", self.name);
        let client = self
            .service
            .create_client(&self.name)
            .map_err(|status| os(FailedOp::CreateClient, status))?;

        let sink = Arc::clone(&self.sink);
        let handler: ReceiveHandler =
            Arc::new(move |timestamp, source, words| sink.deliver(timestamp, source, words));

        let input = match self.service.create_input_port(client, "input", handler) {
            Ok(port) => port,
            Err(status) => {
                warn!("input port creation failed with status {}", status);
                self.service.dispose_client(client);
                return Err(os(FailedOp::CreateInputPort, status));
            }
        };

        let output = match self.service.create_output_port(client, "output") {
            Ok(port) => port,
            Err(status) => {
                warn!("output port creation failed with status {}", status);
                self.service.dispose_port(input);
                self.service.dispose_client(client);
                return Err(os(FailedOp::CreateOutputPort, status));
            }
        };

        *state = State::Initialized {
            client,
            input,
            output,
        };
        info!("MIDI client '{}' initialized", self.name);
        Ok(())
    }

    /// Connects `source` to the input port. Packets from the source reach
    /// the registered receive handler until shutdown.
    pub fn open_input(&self, source: Endpoint) -> Result<()> {
        let state = self.state();
        let (input, _) = state.ports()?;
        self.service
            .connect_source(input, source)
            .map_err(|status| os(FailedOp::ConnectSource, status))?;
        debug!("connected source {}", source);
        Ok(())
    }

    /// Submits one packet of up to the service's word maximum on the
    /// output port. An empty word slice is a no-op. Blocks only while the
    /// service enqueues the packet; delivery is not confirmed.
    pub fn send(&self, destination: Endpoint, timestamp: Timestamp, words: &[Word]) -> Result<()> {
        if words.is_empty() {
            return Ok(());
        }
        let state = self.state();
        let (_, output) = state.ports()?;
        self.service
            .submit(output, destination, timestamp, words)
            .map_err(|status| os(FailedOp::Submit, status))
    }

    /// Sends a SysEx byte buffer of arbitrary length, encoded as UMP data
    /// messages and submitted immediately in packets that respect the
    /// service's word maximum. Byte order is preserved exactly.
    pub fn send_sysex(&self, destination: Endpoint, bytes: &[u8]) -> Result<()> {
        let words = ump::sysex_to_words(bytes);
        if words.is_empty() {
            return Ok(());
        }
        let state = self.state();
        let (_, output) = state.ports()?;
        // chunk on message boundaries, data messages are two words wide
        let max = (self.service.max_packet_words().max(2)) & !1;
        for chunk in words.chunks(max) {
            self.service
                .submit(output, destination, 0, chunk)
                .map_err(|status| os(FailedOp::Submit, status))?;
        }
        Ok(())
    }

    /// Replaces the receive handler. The handler runs on the service's
    /// receive thread and must not block; the word slice it is given is
    /// only valid for the duration of the call.
    pub fn set_receive_handler<F>(&self, handler: F)
    where
        F: Fn(Timestamp, Endpoint, &[Word]) + Send + Sync + 'static,
    {
        self.sink.install(Box::new(handler));
    }

    /// Installs a channel-backed receive handler and returns its receiving
    /// end. Each inbound packet arrives as an owned [`InputEvent`].
    /// Replaces any previously registered handler; the channel disconnects
    /// on shutdown or when a new handler is installed.
    pub fn subscribe(&self) -> Receiver<InputEvent> {
        let (tx, rx) = unbounded();
        self.set_receive_handler(move |timestamp, source, words| {
            let _ = tx.send(InputEvent {
                timestamp,
                source,
                words: words.to_vec(),
            });
        });
        rx
    }

    /// Snapshot of the endpoint topology. Does not require `init`;
    /// enumeration is a read-only service facility.
    pub fn enumerate(&self) -> Result<Node> {
        self.service
            .enumerate()
            .map_err(|status| os(FailedOp::Enumerate, status))
    }

    /// Releases the ports and the client registration. Idempotent: safe to
    /// call in any state, any number of times. Fences against in-flight
    /// receive callbacks before releasing anything, then leaves the
    /// transport in the terminal shut-down state.
    pub fn shutdown(&self) {
        // flip the state first so concurrent operations start failing,
        // then fence the receive path, then release the native resources
        let prior = {
            let mut state = self.state();
            std::mem::replace(&mut *state, State::ShutDown)
        };
        self.sink.close();
        if let State::Initialized {
            client,
            input,
            output,
        } = prior
        {
            self.service.dispose_port(input);
            self.service.dispose_port(output);
            self.service.dispose_client(client);
            info!("MIDI client '{}' shut down", self.name);
        }
    }
}

impl<S: MidiService> Drop for Transport<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn os(op: FailedOp, status: i32) -> TransportError {
    TransportError::Os { op, status }
}
