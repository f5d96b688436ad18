use umplink::midi::{FailedOp, MockMidiService, Transport, TransportError};

fn transport() -> (MockMidiService, Transport<MockMidiService>) {
    let service = MockMidiService::new();
    let transport = Transport::new(service.clone(), "test-client");
    (service, transport)
}

#[test]
fn send_before_init_fails_without_touching_the_os() {
    let (service, transport) = transport();

    let result = transport.send(7, 0, &[0x0990_4040]);
    assert_eq!(result, Err(TransportError::NotInitialized));
    assert_eq!(service.os_calls(), 0);
}

#[test]
fn open_input_before_init_fails_without_touching_the_os() {
    let (service, transport) = transport();

    let result = transport.open_input(5);
    assert_eq!(result, Err(TransportError::NotInitialized));
    assert_eq!(service.os_calls(), 0);
}

#[test]
fn send_sysex_before_init_fails() {
    let (service, transport) = transport();

    let result = transport.send_sysex(7, &[0xF0, 0x01, 0x02, 0xF7]);
    assert_eq!(result, Err(TransportError::NotInitialized));
    assert_eq!(service.os_calls(), 0);
}

#[test]
fn init_creates_client_and_both_ports() {
    let (service, transport) = transport();

    transport.init().unwrap();
    assert_eq!(service.live_clients(), 1);
    assert_eq!(service.live_ports(), 2);
}

#[test]
fn happy_path_records_exactly_one_submission() {
    let (service, transport) = transport();

    transport.init().unwrap();
    transport.open_input(5).unwrap();
    transport.send(7, 0, &[0x0990_4040]).unwrap();

    let connected = service.connected_sources();
    assert_eq!(connected.len(), 1);
    assert_eq!(connected[0].1, 5);

    let submissions = service.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].destination, 7);
    assert_eq!(submissions[0].timestamp, 0);
    assert_eq!(submissions[0].words, vec![0x0990_4040]);
}

#[test]
fn empty_send_is_a_no_op() {
    let (service, transport) = transport();

    transport.init().unwrap();
    transport.send(7, 0, &[]).unwrap();
    assert!(service.submissions().is_empty());
}

#[test]
fn double_init_fails_and_leaves_first_initialization_intact() {
    let (service, transport) = transport();

    transport.init().unwrap();
    assert_eq!(transport.init(), Err(TransportError::AlreadyInitialized));

    // first initialization's ports still work
    transport.send(7, 0, &[0x0990_4040]).unwrap();
    assert_eq!(service.submissions().len(), 1);
    assert_eq!(service.live_clients(), 1);
    assert_eq!(service.live_ports(), 2);
}

#[test]
fn shutdown_is_idempotent() {
    let (service, transport) = transport();

    transport.init().unwrap();
    transport.shutdown();
    assert_eq!(service.live_clients(), 0);
    assert_eq!(service.live_ports(), 0);

    // a second shutdown releases nothing twice
    transport.shutdown();
    assert_eq!(service.disposed_ports().len(), 2);
    assert_eq!(service.disposed_clients().len(), 1);
}

#[test]
fn shutdown_on_never_initialized_transport_is_a_no_op() {
    let (service, transport) = transport();

    transport.shutdown();
    transport.shutdown();
    assert_eq!(service.os_calls(), 0);
}

#[test]
fn operations_after_shutdown_fail_with_shut_down() {
    let (_, transport) = transport();

    transport.init().unwrap();
    transport.shutdown();

    assert_eq!(transport.send(7, 0, &[1]), Err(TransportError::ShutDown));
    assert_eq!(transport.open_input(5), Err(TransportError::ShutDown));
    assert_eq!(transport.init(), Err(TransportError::ShutDown));
}

#[test]
fn failed_client_creation_surfaces_the_status_code() {
    let (service, transport) = transport();
    service.fail_create_client(-10830);

    assert_eq!(
        transport.init(),
        Err(TransportError::Os {
            op: FailedOp::CreateClient,
            status: -10830
        })
    );
    assert_eq!(service.live_clients(), 0);
}

#[test]
fn failed_input_port_creation_rolls_back_the_client() {
    let (service, transport) = transport();
    service.fail_create_input_port(-10831);

    assert_eq!(
        transport.init(),
        Err(TransportError::Os {
            op: FailedOp::CreateInputPort,
            status: -10831
        })
    );
    assert_eq!(service.live_clients(), 0);
    assert_eq!(service.live_ports(), 0);
}

#[test]
fn failed_output_port_creation_rolls_back_client_and_input_port() {
    let (service, transport) = transport();
    service.fail_create_output_port(-10831);

    assert_eq!(
        transport.init(),
        Err(TransportError::Os {
            op: FailedOp::CreateOutputPort,
            status: -10831
        })
    );
    assert_eq!(service.live_clients(), 0);
    assert_eq!(service.live_ports(), 0);

    // rollback leaves the transport reinitializable
    service.clear_failures();
    transport.init().unwrap();
    transport.send(7, 0, &[0x0990_4040]).unwrap();
    assert_eq!(service.submissions().len(), 1);
}

#[test]
fn failed_connect_surfaces_the_status_code() {
    let (service, transport) = transport();

    transport.init().unwrap();
    service.fail_connect(-10839);
    assert_eq!(
        transport.open_input(5),
        Err(TransportError::Os {
            op: FailedOp::ConnectSource,
            status: -10839
        })
    );
}

#[test]
fn failed_submit_surfaces_the_status_code() {
    let (service, transport) = transport();

    transport.init().unwrap();
    service.fail_submit(-10844);
    assert_eq!(
        transport.send(7, 0, &[1, 2]),
        Err(TransportError::Os {
            op: FailedOp::Submit,
            status: -10844
        })
    );
}

#[test]
fn independent_transports_do_not_share_state() {
    let service_a = MockMidiService::new();
    let service_b = MockMidiService::new();
    let a = Transport::new(service_a.clone(), "a");
    let b = Transport::new(service_b.clone(), "b");

    a.init().unwrap();
    assert_eq!(service_b.os_calls(), 0);

    a.send(7, 0, &[1]).unwrap();
    assert_eq!(b.send(7, 0, &[1]), Err(TransportError::NotInitialized));
    assert_eq!(service_a.submissions().len(), 1);
    assert!(service_b.submissions().is_empty());
}

#[test]
fn drop_shuts_the_transport_down() {
    let service = MockMidiService::new();
    {
        let transport = Transport::new(service.clone(), "scoped");
        transport.init().unwrap();
    }
    assert_eq!(service.live_clients(), 0);
    assert_eq!(service.live_ports(), 0);
}

#[test]
fn enumerate_reports_the_service_topology() {
    let (_, transport) = transport();

    let root = transport.enumerate().unwrap();
    let inputs = root.inputs();
    let outputs = root.outputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].entity, 5);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].entity, 7);
}
