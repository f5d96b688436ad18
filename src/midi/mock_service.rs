//! In-memory stand-in for the OS MIDI service.
//!
//! Records every native call so tests can assert on exactly what reached
//! the OS layer, lets individual operations be scripted to fail with a
//! chosen status code, and simulates inbound delivery through the
//! registered receive callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::graph::{Node, NodeKind};
use crate::ump::Word;

use super::service::{
    ClientRef, Endpoint, MidiService, OsResult, OsStatus, PortRef, ReceiveHandler, Timestamp,
};

/// One outbound packet accepted by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub port: PortRef,
    pub destination: Endpoint,
    pub timestamp: Timestamp,
    pub words: Vec<Word>,
}

#[derive(Default)]
struct MockState {
    next_token: u64,
    os_calls: usize,
    handler: Option<ReceiveHandler>,
    clients: Vec<ClientRef>,
    disposed_clients: Vec<ClientRef>,
    ports: Vec<PortRef>,
    disposed_ports: Vec<PortRef>,
    connected: Vec<(PortRef, Endpoint)>,
    submissions: Vec<Submission>,
    fail_create_client: Option<OsStatus>,
    fail_create_input_port: Option<OsStatus>,
    fail_create_output_port: Option<OsStatus>,
    fail_connect: Option<OsStatus>,
    fail_submit: Option<OsStatus>,
    max_packet_words: Option<usize>,
    topology: Option<Node>,
}

impl MockState {
    fn mint(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

/// Cloning shares the recorded state, so a test can keep a handle after
/// moving the service into a transport.
#[derive(Clone, Default)]
pub struct MockMidiService {
    state: Arc<Mutex<MockState>>,
}

impl MockMidiService {
    pub fn new() -> MockMidiService {
        MockMidiService::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_create_client(&self, status: OsStatus) {
        self.lock().fail_create_client = Some(status);
    }

    pub fn fail_create_input_port(&self, status: OsStatus) {
        self.lock().fail_create_input_port = Some(status);
    }

    pub fn fail_create_output_port(&self, status: OsStatus) {
        self.lock().fail_create_output_port = Some(status);
    }

    pub fn fail_connect(&self, status: OsStatus) {
        self.lock().fail_connect = Some(status);
    }

    pub fn fail_submit(&self, status: OsStatus) {
        self.lock().fail_submit = Some(status);
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_create_client = None;
        state.fail_create_input_port = None;
        state.fail_create_output_port = None;
        state.fail_connect = None;
        state.fail_submit = None;
    }

    pub fn set_max_packet_words(&self, max: usize) {
        self.lock().max_packet_words = Some(max);
    }

    pub fn set_topology(&self, topology: Node) {
        self.lock().topology = Some(topology);
    }

    /// Total number of native calls the mock has seen, disposals included.
    pub fn os_calls(&self) -> usize {
        self.lock().os_calls
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    pub fn connected_sources(&self) -> Vec<(PortRef, Endpoint)> {
        self.lock().connected.clone()
    }

    pub fn disposed_ports(&self) -> Vec<PortRef> {
        self.lock().disposed_ports.clone()
    }

    pub fn disposed_clients(&self) -> Vec<ClientRef> {
        self.lock().disposed_clients.clone()
    }

    /// Clients created minus clients disposed.
    pub fn live_clients(&self) -> usize {
        let state = self.lock();
        state.clients.len() - state.disposed_clients.len()
    }

    /// Ports created minus ports disposed.
    pub fn live_ports(&self) -> usize {
        let state = self.lock();
        state.ports.len() - state.disposed_ports.len()
    }

    /// Pushes one packet through the registered receive callback, the way
    /// the OS would from its receive thread. Silently dropped when no
    /// input port exists.
    pub fn deliver(&self, timestamp: Timestamp, source: Endpoint, words: &[Word]) {
        let handler = self.lock().handler.clone();
        if let Some(handler) = handler {
            handler(timestamp, source, words);
        }
    }

    /// Delivers a batch of packets from one source, in order, each one
    /// synchronously before the next.
    pub fn deliver_batch(&self, source: Endpoint, packets: &[(Timestamp, Vec<Word>)]) {
        for (timestamp, words) in packets {
            self.deliver(*timestamp, source, words);
        }
    }
}

impl MidiService for MockMidiService {
    fn create_client(&self, _name: &str) -> OsResult<ClientRef> {
        let mut state = self.lock();
        state.os_calls += 1;
        if let Some(status) = state.fail_create_client {
            return Err(status);
        }
        let client = state.mint();
        state.clients.push(client);
        Ok(client)
    }

    fn create_input_port(
        &self,
        _client: ClientRef,
        _name: &str,
        handler: ReceiveHandler,
    ) -> OsResult<PortRef> {
        let mut state = self.lock();
        state.os_calls += 1;
        if let Some(status) = state.fail_create_input_port {
            return Err(status);
        }
        let port = state.mint();
        state.ports.push(port);
        state.handler = Some(handler);
        Ok(port)
    }

    fn create_output_port(&self, _client: ClientRef, _name: &str) -> OsResult<PortRef> {
        let mut state = self.lock();
        state.os_calls += 1;
        if let Some(status) = state.fail_create_output_port {
            return Err(status);
        }
        let port = state.mint();
        state.ports.push(port);
        Ok(port)
    }

    fn connect_source(&self, port: PortRef, source: Endpoint) -> OsResult<()> {
        let mut state = self.lock();
        state.os_calls += 1;
        if let Some(status) = state.fail_connect {
            return Err(status);
        }
        state.connected.push((port, source));
        Ok(())
    }

    fn submit(
        &self,
        port: PortRef,
        destination: Endpoint,
        timestamp: Timestamp,
        words: &[Word],
    ) -> OsResult<()> {
        let mut state = self.lock();
        state.os_calls += 1;
        if let Some(status) = state.fail_submit {
            return Err(status);
        }
        if words.len() > state.max_packet_words.unwrap_or(DEFAULT_MAX_PACKET_WORDS) {
            return Err(STATUS_PACKET_TOO_LONG);
        }
        state.submissions.push(Submission {
            port,
            destination,
            timestamp,
            words: words.to_vec(),
        });
        Ok(())
    }

    fn dispose_port(&self, port: PortRef) {
        let mut state = self.lock();
        state.os_calls += 1;
        state.disposed_ports.push(port);
    }

    fn dispose_client(&self, client: ClientRef) {
        let mut state = self.lock();
        state.os_calls += 1;
        state.disposed_clients.push(client);
    }

    fn max_packet_words(&self) -> usize {
        self.lock()
            .max_packet_words
            .unwrap_or(DEFAULT_MAX_PACKET_WORDS)
    }

    fn enumerate(&self) -> OsResult<Node> {
        let mut state = self.lock();
        state.os_calls += 1;
        Ok(state.topology.clone().unwrap_or_else(default_topology))
    }
}

const DEFAULT_MAX_PACKET_WORDS: usize = 64;

/// Oversized submissions are rejected the way the OS would reject them.
pub const STATUS_PACKET_TOO_LONG: OsStatus = -50;

fn default_topology() -> Node {
    let mut group = Node::new(NodeKind::PortGroup, 0, "ports");
    group.children.push(Node::new(NodeKind::Input, 5, "mock in"));
    group
        .children
        .push(Node::new(NodeKind::Output, 7, "mock out"));

    let mut device = Node::new(NodeKind::Device, 1, "Mock Device");
    device.manufacturer = "umplink".to_string();
    device.children.push(group);

    let mut root = Node::root();
    root.children.push(device);
    root
}
