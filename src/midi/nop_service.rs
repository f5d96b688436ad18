use crate::graph::Node;
use crate::ump::Word;

use super::service::{
    ClientRef, Endpoint, MidiService, OsResult, OsStatus, PortRef, ReceiveHandler, Timestamp,
};

/// Status reported for every operation on a platform without a native
/// MIDI backend.
pub const STATUS_UNSUPPORTED: OsStatus = -1;

/// Stand-in service for platforms this crate has no native backend for.
/// Every native operation fails with [`STATUS_UNSUPPORTED`]; disposals are
/// no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopService;

impl NopService {
    pub fn new() -> NopService {
        NopService
    }
}

impl MidiService for NopService {
    fn create_client(&self, _name: &str) -> OsResult<ClientRef> {
        Err(STATUS_UNSUPPORTED)
    }

    fn create_input_port(
        &self,
        _client: ClientRef,
        _name: &str,
        _handler: ReceiveHandler,
    ) -> OsResult<PortRef> {
        Err(STATUS_UNSUPPORTED)
    }

    fn create_output_port(&self, _client: ClientRef, _name: &str) -> OsResult<PortRef> {
        Err(STATUS_UNSUPPORTED)
    }

    fn connect_source(&self, _port: PortRef, _source: Endpoint) -> OsResult<()> {
        Err(STATUS_UNSUPPORTED)
    }

    fn submit(
        &self,
        _port: PortRef,
        _destination: Endpoint,
        _timestamp: Timestamp,
        _words: &[Word],
    ) -> OsResult<()> {
        Err(STATUS_UNSUPPORTED)
    }

    fn dispose_port(&self, _port: PortRef) {}

    fn dispose_client(&self, _client: ClientRef) {}

    fn max_packet_words(&self) -> usize {
        64
    }

    fn enumerate(&self) -> OsResult<Node> {
        Err(STATUS_UNSUPPORTED)
    }
}
