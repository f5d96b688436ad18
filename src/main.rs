use clap::Parser;
use std::{thread, time::Duration};
use umplink::{
    cli::Args,
    logging,
    midi::{DefaultMidiService, Transport},
    ump,
};

fn main() {
    logging::init_logger().expect("logger initialization failed");
    log::info!("application starting");

    let args = Args::parse();
    let transport = Transport::new(DefaultMidiService::default(), args.client_name.clone());

    if args.list {
        list_endpoints(&transport);
        return;
    }

    if let Some(source) = args.monitor {
        monitor_source(&transport, source);
        return;
    }

    if let Some(destination) = args.test_note {
        send_test_note(&transport, destination);
        return;
    }

    list_endpoints(&transport);
}

fn list_endpoints(transport: &Transport<DefaultMidiService>) {
    match transport.enumerate() {
        Ok(root) => print!("{}", root.dump()),
        Err(e) => fail(&e),
    }
}

fn monitor_source(transport: &Transport<DefaultMidiService>, source: u64) {
    if let Err(e) = transport.init() {
        fail(&e);
    }
    let events = transport.subscribe();
    if let Err(e) = transport.open_input(source) {
        fail(&e);
    }

    println!("monitoring source {}, press Ctrl+C to exit", source);
    for event in events {
        println!(
            "{:016x} source={} words={:08x?}",
            event.timestamp, event.source, event.words
        );
    }
}

fn send_test_note(transport: &Transport<DefaultMidiService>, destination: u64) {
    if let Err(e) = transport.init() {
        fail(&e);
    }
    log::info!("sending test note to destination {}", destination);
    if let Err(e) = transport.send(destination, 0, &[ump::note_on(0, 60, 100)]) {
        fail(&e);
    }
    thread::sleep(Duration::from_millis(500));
    if let Err(e) = transport.send(destination, 0, &[ump::note_off(0, 60, 0)]) {
        fail(&e);
    }
    transport.shutdown();
    println!("test note sent to destination {}", destination);
}

fn fail(e: &dyn std::error::Error) -> ! {
    log::error!("{}", e);
    eprintln!("{}", e);
    std::process::exit(1);
}
