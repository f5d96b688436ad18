use std::sync::{Arc, Mutex};

use umplink::midi::{Endpoint, MockMidiService, Timestamp, Transport};

fn transport() -> (MockMidiService, Transport<MockMidiService>) {
    let service = MockMidiService::new();
    let transport = Transport::new(service.clone(), "test-client");
    (service, transport)
}

#[test]
fn batch_of_three_invokes_the_handler_three_times_in_order() {
    let (service, transport) = transport();
    transport.init().unwrap();

    let seen: Arc<Mutex<Vec<(Timestamp, Endpoint, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    transport.set_receive_handler(move |timestamp, source, words| {
        sink.lock().unwrap().push((timestamp, source, words.len()));
    });

    transport.open_input(5).unwrap();
    service.deliver_batch(
        5,
        &[
            (100, vec![0x2090_4040]),
            (200, vec![0x2080_4000, 0x2090_4141]),
            (300, vec![0x10F8_0000]),
        ],
    );

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(100, 5, 1), (200, 5, 2), (300, 5, 1)]);
}

#[test]
fn handler_sees_the_exact_words() {
    let (service, transport) = transport();
    transport.init().unwrap();

    let seen: Arc<Mutex<Vec<Vec<u32>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    transport.set_receive_handler(move |_, _, words| {
        sink.lock().unwrap().push(words.to_vec());
    });

    service.deliver(1, 5, &[0xDEAD_BEEF, 0x0000_0042]);
    assert_eq!(*seen.lock().unwrap(), vec![vec![0xDEAD_BEEF, 0x0000_0042]]);
}

#[test]
fn subscribe_yields_owned_events() {
    let (service, transport) = transport();
    transport.init().unwrap();

    let events = transport.subscribe();
    transport.open_input(5).unwrap();
    service.deliver(42, 5, &[0x2090_4040]);

    let event = events.recv().unwrap();
    assert_eq!(event.timestamp, 42);
    assert_eq!(event.source, 5);
    assert_eq!(event.words, vec![0x2090_4040]);
}

#[test]
fn packets_before_any_handler_registration_are_dropped() {
    let (service, transport) = transport();
    transport.init().unwrap();

    // the default handler discards; nothing panics, nothing queues
    service.deliver(1, 5, &[0x2090_4040]);

    let events = transport.subscribe();
    assert!(events.try_recv().is_err());
}

#[test]
fn no_delivery_after_shutdown() {
    let (service, transport) = transport();
    transport.init().unwrap();

    let events = transport.subscribe();
    transport.open_input(5).unwrap();
    transport.shutdown();

    // the OS-side callback may still fire while disconnecting; it must be
    // ignored and must not crash
    service.deliver(1, 5, &[0x2090_4040]);
    assert!(events.try_recv().is_err());
}

#[test]
fn replacing_the_handler_redirects_delivery() {
    let (service, transport) = transport();
    transport.init().unwrap();

    let first: Arc<Mutex<Vec<Timestamp>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&first);
    transport.set_receive_handler(move |timestamp, _, _| {
        sink.lock().unwrap().push(timestamp);
    });
    service.deliver(1, 5, &[0]);

    let second: Arc<Mutex<Vec<Timestamp>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&second);
    transport.set_receive_handler(move |timestamp, _, _| {
        sink.lock().unwrap().push(timestamp);
    });
    service.deliver(2, 5, &[0]);

    assert_eq!(*first.lock().unwrap(), vec![1]);
    assert_eq!(*second.lock().unwrap(), vec![2]);
}
