//! End-to-end tests for the public forwarding API.

use std::{
    env,
    io::{Read, Write},
    net::{TcpListener, UdpSocket},
    sync::Arc,
    thread,
    time::Duration,
};

use crossbeam_channel::unbounded;
use serial_test::serial;

use logship::{
    ContainerInfo, Envelope, ForwardError, ForwarderConfig, LogRecord, LogstashForwarder,
    OptionsMap, Route, TransportRegistry,
};

fn sample_record(message: &str, env: Vec<String>) -> LogRecord {
    LogRecord::new(
        message,
        ContainerInfo {
            name: "web1".to_string(),
            id: "abc123".to_string(),
            image: "nginx".to_string(),
            hostname: "h1".to_string(),
            args: Vec::new(),
            env,
        },
    )
}

/// Config pointing the identity lookup at a port nothing listens on, so the
/// lookup degrades to an empty identity quickly.
fn offline_metadata_config() -> ForwarderConfig {
    let addr = {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        listener.local_addr().expect("listener has address")
    };
    ForwarderConfig::default()
        .with_metadata_url(&format!("http://{addr}/latest/meta-data/instance-id"))
        .with_metadata_timeout(Duration::from_millis(500))
}

/// Spawn a one-shot responder answering any request with `body`.
fn spawn_instance_id_server(listener: TcpListener, body: &'static str) {
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
        let mut request = Vec::new();
        let mut buf = [0u8; 256];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
    });
}

#[test]
#[serial]
fn ships_envelopes_over_udp() {
    unsafe { env::remove_var("OPTIONS") };
    let server = UdpSocket::bind("127.0.0.1:0").expect("bind server");
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set timeout");
    let address = server.local_addr().expect("server addr").to_string();

    let registry = Arc::new(TransportRegistry::with_defaults());
    let forwarder =
        LogstashForwarder::with_config(Route::new(&address), registry, offline_metadata_config())
            .expect("build forwarder");
    let (tx, rx) = unbounded();
    let handle = forwarder.spawn(rx);

    tx.send(sample_record("hello", Vec::new()))
        .expect("send record");

    let mut buf = [0u8; 2048];
    let (len, _) = server.recv_from(&mut buf).expect("receive datagram");
    assert_eq!(
        std::str::from_utf8(&buf[..len]).expect("utf8 payload"),
        r#"{"message":"hello","docker.name":"web1","docker.id":"abc123","docker.image":"nginx","docker.hostname":"h1"}"#
    );

    drop(tx);
    handle.join().expect("clean shutdown");
}

#[test]
#[serial]
fn merges_default_and_source_options_and_attaches_identity() {
    unsafe { env::set_var("OPTIONS", r#"{"a":"1","b":"2"}"#) };
    let metadata_listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind metadata listener");
    let metadata_addr = metadata_listener
        .local_addr()
        .expect("listener has address");
    spawn_instance_id_server(metadata_listener, "i-0123456789abcdef0");

    let server = UdpSocket::bind("127.0.0.1:0").expect("bind server");
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set timeout");
    let address = server.local_addr().expect("server addr").to_string();

    let config = ForwarderConfig::default()
        .with_metadata_url(&format!("http://{metadata_addr}/latest/meta-data/instance-id"))
        .with_metadata_timeout(Duration::from_secs(5));
    let forwarder = LogstashForwarder::with_config(
        Route::new(&address),
        Arc::new(TransportRegistry::with_defaults()),
        config,
    )
    .expect("build forwarder");
    let (tx, rx) = unbounded();
    let handle = forwarder.spawn(rx);

    let container_env = vec![r#"LOGSPOUT_OPTIONS={"b":"9","c":"3"}"#.to_string()];
    tx.send(sample_record("hello", container_env))
        .expect("send record");

    let mut buf = [0u8; 2048];
    let (len, _) = server.recv_from(&mut buf).expect("receive datagram");
    let envelope: Envelope = serde_json::from_slice(&buf[..len]).expect("parse envelope");
    let expected: OptionsMap = [("a", "1"), ("b", "9"), ("c", "3")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(envelope.options, expected);
    assert_eq!(envelope.instance_id, "i-0123456789abcdef0");

    drop(tx);
    handle.join().expect("clean shutdown");
    unsafe { env::remove_var("OPTIONS") };
}

#[test]
#[serial]
fn ships_envelopes_over_tcp() {
    unsafe { env::remove_var("OPTIONS") };
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let address = listener.local_addr().expect("listener addr").to_string();

    let forwarder = LogstashForwarder::with_config(
        Route::new(&address).with_transport("tcp"),
        Arc::new(TransportRegistry::with_defaults()),
        offline_metadata_config(),
    )
    .expect("build forwarder");
    let (mut stream, _) = listener.accept().expect("accept");

    let (tx, rx) = unbounded();
    let handle = forwarder.spawn(rx);
    tx.send(sample_record("over tcp", Vec::new()))
        .expect("send record");
    drop(tx);
    handle.join().expect("clean shutdown");

    let mut received = String::new();
    stream.read_to_string(&mut received).expect("read stream");
    let envelope: Envelope = serde_json::from_str(&received).expect("parse envelope");
    assert_eq!(envelope.message, "over tcp");
    assert_eq!(envelope.name, "web1");
}

#[test]
#[serial]
fn join_surfaces_terminal_transport_errors() {
    unsafe { env::remove_var("OPTIONS") };
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let address = listener.local_addr().expect("listener addr").to_string();

    let forwarder = LogstashForwarder::with_config(
        Route::new(&address).with_transport("tcp"),
        Arc::new(TransportRegistry::with_defaults()),
        offline_metadata_config(),
    )
    .expect("build forwarder");
    // Close the accepted connection and stop listening so the first failed
    // write cannot reconnect.
    let (stream, _) = listener.accept().expect("accept");
    drop(stream);
    drop(listener);

    let (tx, rx) = unbounded();
    let handle = forwarder.spawn(rx);
    let record = sample_record("doomed", Vec::new());
    // Writes into the closed peer fail once the reset is observed; keep
    // feeding records until the worker gives up.
    while !handle.is_finished() {
        if tx.send(record.clone()).is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let err = handle.join().expect_err("terminal error");
    assert!(matches!(err, ForwardError::Reconnect { .. }));
}

#[test]
#[serial]
fn closing_the_channel_ends_the_stream_cleanly() {
    unsafe { env::remove_var("OPTIONS") };
    let server = UdpSocket::bind("127.0.0.1:0").expect("bind server");
    let address = server.local_addr().expect("server addr").to_string();

    let forwarder = LogstashForwarder::with_config(
        Route::new(&address),
        Arc::new(TransportRegistry::with_defaults()),
        offline_metadata_config(),
    )
    .expect("build forwarder");
    let (tx, rx) = unbounded::<LogRecord>();
    let handle = forwarder.spawn(rx);
    drop(tx);

    handle.join().expect("clean shutdown");
}
