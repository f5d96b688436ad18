//! MIDI service backed by the system CoreMIDI framework.

use std::collections::HashMap;
use std::mem::MaybeUninit;
use std::os::raw::c_void;
use std::ptr;
use std::slice;
use std::sync::{Mutex, MutexGuard, PoisonError};

use block::{ConcreteBlock, RcBlock};
use core_foundation::base::TCFType;
use core_foundation::string::CFString;
use core_foundation_sys::string::CFStringRef;
use coremidi_sys::{
    kMIDIPropertyManufacturer, kMIDIPropertyModel, kMIDIPropertyName, kMIDIPropertyOffline,
    ByteCount, ItemCount, MIDIClientCreate, MIDIClientDispose, MIDIClientRef,
    MIDIDeviceGetEntity, MIDIDeviceGetNumberOfEntities, MIDIEndpointRef,
    MIDIEntityGetDestination, MIDIEntityGetNumberOfDestinations, MIDIEntityGetNumberOfSources,
    MIDIEntityGetSource, MIDIGetDevice, MIDIGetNumberOfDevices, MIDIObjectGetIntegerProperty,
    MIDIObjectGetStringProperty, MIDIObjectRef, MIDIOutputPortCreate, MIDIPortConnectSource,
    MIDIPortDispose, MIDIPortRef,
};

use crate::graph::{Node, NodeKind};
use crate::ump::Word;

use super::coremidi_sys_ext as sys_ext;
use super::service::{
    ClientRef, Endpoint, MidiService, OsResult, OsStatus, PortRef, ReceiveHandler, Timestamp,
};

/// `paramErr`: a submission did not fit one event list.
const STATUS_PARAM_ERR: OsStatus = -50;

type ReceiveBlock = RcBlock<(*const sys_ext::MIDIEventList, *mut c_void), ()>;

pub struct CoreMidiService {
    // receive blocks must stay alive as long as their input port
    blocks: Mutex<HashMap<PortRef, ReceiveBlock>>,
}

// Tokens are plain CoreMIDI object refs and the retained blocks are only
// touched under the mutex; CoreMIDI serializes callback delivery on its
// own queue.
unsafe impl Send for CoreMidiService {}
unsafe impl Sync for CoreMidiService {}

impl CoreMidiService {
    pub fn new() -> CoreMidiService {
        CoreMidiService {
            blocks: Mutex::new(HashMap::new()),
        }
    }

    fn blocks(&self) -> MutexGuard<'_, HashMap<PortRef, ReceiveBlock>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CoreMidiService {
    fn default() -> CoreMidiService {
        CoreMidiService::new()
    }
}

impl MidiService for CoreMidiService {
    fn create_client(&self, name: &str) -> OsResult<ClientRef> {
        let name = CFString::new(name);
        let mut client: MIDIClientRef = 0;
        let status = unsafe {
            MIDIClientCreate(name.as_concrete_TypeRef(), None, ptr::null_mut(), &mut client)
        };
        if status == 0 {
            Ok(ClientRef::from(client))
        } else {
            Err(status)
        }
    }

    fn create_input_port(
        &self,
        client: ClientRef,
        name: &str,
        handler: ReceiveHandler,
    ) -> OsResult<PortRef> {
        let name = CFString::new(name);
        let block = ConcreteBlock::new(
            move |list: *const sys_ext::MIDIEventList, src_ref: *mut c_void| {
                // src_ref carries the endpoint token registered at connect time
                let source = src_ref as usize as Endpoint;
                unsafe {
                    let mut pkt =
                        ptr::addr_of!((*list).packet) as *const sys_ext::MIDIEventPacket;
                    for _ in 0..(*list).numPackets {
                        let count = (*pkt).wordCount as usize;
                        let words =
                            slice::from_raw_parts(ptr::addr_of!((*pkt).words) as *const Word, count);
                        handler((*pkt).timeStamp, source, words);
                        pkt = sys_ext::event_packet_next(pkt);
                    }
                }
            },
        )
        .copy();

        let mut port: MIDIPortRef = 0;
        let status = unsafe {
            sys_ext::MIDIInputPortCreateWithProtocol(
                client as MIDIClientRef,
                name.as_concrete_TypeRef(),
                sys_ext::kMIDIProtocol_1_0,
                &mut port,
                &block,
            )
        };
        if status != 0 {
            return Err(status);
        }
        self.blocks().insert(PortRef::from(port), block);
        Ok(PortRef::from(port))
    }

    fn create_output_port(&self, client: ClientRef, name: &str) -> OsResult<PortRef> {
        let name = CFString::new(name);
        let mut port: MIDIPortRef = 0;
        let status = unsafe {
            MIDIOutputPortCreate(client as MIDIClientRef, name.as_concrete_TypeRef(), &mut port)
        };
        if status == 0 {
            Ok(PortRef::from(port))
        } else {
            Err(status)
        }
    }

    fn connect_source(&self, port: PortRef, source: Endpoint) -> OsResult<()> {
        let status = unsafe {
            MIDIPortConnectSource(
                port as MIDIPortRef,
                source as MIDIEndpointRef,
                source as usize as *mut c_void,
            )
        };
        if status == 0 {
            Ok(())
        } else {
            Err(status)
        }
    }

    fn submit(
        &self,
        port: PortRef,
        destination: Endpoint,
        timestamp: Timestamp,
        words: &[Word],
    ) -> OsResult<()> {
        let mut list = MaybeUninit::<sys_ext::MIDIEventList>::uninit();
        let status = unsafe {
            let pkt = sys_ext::MIDIEventListInit(list.as_mut_ptr(), sys_ext::kMIDIProtocol_1_0);
            let added = sys_ext::MIDIEventListAdd(
                list.as_mut_ptr(),
                std::mem::size_of::<sys_ext::MIDIEventList>() as ByteCount,
                pkt,
                timestamp,
                words.len() as ByteCount,
                words.as_ptr(),
            );
            if added.is_null() {
                return Err(STATUS_PARAM_ERR);
            }
            sys_ext::MIDISendEventList(
                port as MIDIPortRef,
                destination as MIDIEndpointRef,
                list.as_ptr(),
            )
        };
        if status == 0 {
            Ok(())
        } else {
            Err(status)
        }
    }

    fn dispose_port(&self, port: PortRef) {
        unsafe {
            MIDIPortDispose(port as MIDIPortRef);
        }
        self.blocks().remove(&port);
    }

    fn dispose_client(&self, client: ClientRef) {
        unsafe {
            MIDIClientDispose(client as MIDIClientRef);
        }
    }

    fn max_packet_words(&self) -> usize {
        sys_ext::MIDI_EVENT_PACKET_WORDS
    }

    fn enumerate(&self) -> OsResult<Node> {
        let mut root = Node::root();
        let device_count = unsafe { MIDIGetNumberOfDevices() };
        for i in 0..device_count {
            let device = unsafe { MIDIGetDevice(i as ItemCount) };
            if is_offline(device) {
                continue;
            }
            let mut device_node = node_for(NodeKind::Device, device);
            let entity_count = unsafe { MIDIDeviceGetNumberOfEntities(device) };
            for j in 0..entity_count {
                let entity = unsafe { MIDIDeviceGetEntity(device, j as ItemCount) };
                let mut group = node_for(NodeKind::PortGroup, entity);
                let source_count = unsafe { MIDIEntityGetNumberOfSources(entity) };
                for k in 0..source_count {
                    let source = unsafe { MIDIEntityGetSource(entity, k as ItemCount) };
                    group.children.push(node_for(NodeKind::Input, source));
                }
                let dest_count = unsafe { MIDIEntityGetNumberOfDestinations(entity) };
                for k in 0..dest_count {
                    let dest = unsafe { MIDIEntityGetDestination(entity, k as ItemCount) };
                    group.children.push(node_for(NodeKind::Output, dest));
                }
                device_node.children.push(group);
            }
            root.children.push(device_node);
        }
        Ok(root)
    }
}

fn node_for(kind: NodeKind, object: MIDIObjectRef) -> Node {
    let mut node = Node::new(
        kind,
        Endpoint::from(object),
        string_property(object, unsafe { kMIDIPropertyName }),
    );
    node.manufacturer = string_property(object, unsafe { kMIDIPropertyManufacturer });
    node.model = string_property(object, unsafe { kMIDIPropertyModel });
    node
}

fn string_property(object: MIDIObjectRef, property: CFStringRef) -> String {
    let mut value: CFStringRef = ptr::null();
    let status = unsafe { MIDIObjectGetStringProperty(object, property, &mut value) };
    if status != 0 || value.is_null() {
        return String::new();
    }
    unsafe { CFString::wrap_under_create_rule(value) }.to_string()
}

// A device with no offline property is treated as online.
fn is_offline(object: MIDIObjectRef) -> bool {
    let mut value: i32 = 0;
    let status =
        unsafe { MIDIObjectGetIntegerProperty(object, kMIDIPropertyOffline, &mut value) };
    status == 0 && value == 1
}
