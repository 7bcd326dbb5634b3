// tests/transport_tests.rs
//
// TCP client behaviour against a real in-process listener: framing,
// reply decoding, timeout handling, and one-shot reconnection.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bridgebot::{
    ActionRequest, BridgeTransport, LinkState, NoopMetrics, OutcomeStatus, TcpBridgeClient,
    TransportConfig,
};

fn test_config(endpoint: String) -> TransportConfig {
    TransportConfig {
        endpoint,
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_millis(200),
        freshness_window: Duration::from_secs(5),
    }
}

fn client_for(listener: &TcpListener) -> TcpBridgeClient {
    let endpoint = listener.local_addr().expect("local addr").to_string();
    TcpBridgeClient::new(test_config(endpoint), Arc::new(NoopMetrics))
}

fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read request line");
    line.trim_end().to_string()
}

#[test]
fn observation_and_action_round_trips_share_one_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut client = client_for(&listener);

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;

        let first = read_line(&mut reader);
        assert_eq!(first, "command:get_observation");
        writer
            .write_all(b"{\"player_current_health\": 50, \"player_max_health\": 99}\n")
            .expect("write reply");

        let second = read_line(&mut reader);
        let payload = second
            .strip_prefix("command:execute_action:")
            .expect("action prefix");
        let value: serde_json::Value = serde_json::from_str(payload).expect("payload json");
        assert_eq!(value["action_type"], "attack_npc");
        assert_eq!(value["parameters"]["npc_id"], 125);
        writer
            .write_all(b"{\"status\": \"submitted\"}\n")
            .expect("write reply");
    });

    let frame = client.fetch_snapshot();
    assert!(!frame.is_error());
    assert_eq!(frame.record.player_current_health, Some(50.0));
    assert!(client.is_connected());

    let outcome = client.submit_action(&ActionRequest::attack_npc(125));
    assert_eq!(outcome.status, OutcomeStatus::Submitted);

    server.join().expect("server thread");
}

#[test]
fn timeout_marks_disconnected_then_one_reconnect_recovers() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut client = client_for(&listener);

    let server = thread::spawn(move || {
        // First connection: swallow the request and never reply.
        let (stream, _) = listener.accept().expect("accept first");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let _ = read_line(&mut reader);
        thread::sleep(Duration::from_millis(400));
        drop(stream);

        // Second connection: behave.
        let (stream, _) = listener.accept().expect("accept second");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;
        let _ = read_line(&mut reader);
        writer
            .write_all(b"{\"player_current_health\": 40}\n")
            .expect("write reply");
    });

    let frame = client.fetch_snapshot();
    assert!(frame.is_error());
    let message = frame.record.message.clone().expect("error message");
    assert!(message.contains("timeout"), "message was: {message}");
    assert_eq!(client.state(), LinkState::Disconnected);
    assert!(!client.is_connected());

    let frame = client.fetch_snapshot();
    assert!(!frame.is_error());
    assert_eq!(frame.record.player_current_health, Some(40.0));
    assert_eq!(client.state(), LinkState::Connected);
    assert!(client.is_connected());

    server.join().expect("server thread");
}

#[test]
fn malformed_reply_is_an_error_but_keeps_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut client = client_for(&listener);

    let server = thread::spawn(move || {
        // A single accepted connection serves both requests; the test
        // fails if the client tries to reconnect.
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;

        let _ = read_line(&mut reader);
        writer.write_all(b"this is not json\n").expect("write junk");

        let _ = read_line(&mut reader);
        writer
            .write_all(b"{\"player_current_health\": 60}\n")
            .expect("write reply");
    });

    let frame = client.fetch_snapshot();
    assert!(frame.is_error());
    assert!(frame
        .record
        .message
        .clone()
        .expect("message")
        .contains("undecodable"));
    // The raw text rides along for diagnostics.
    assert_eq!(frame.raw, serde_json::json!("this is not json"));
    assert_eq!(client.state(), LinkState::Connected);

    let frame = client.fetch_snapshot();
    assert!(!frame.is_error());
    assert_eq!(frame.record.player_current_health, Some(60.0));

    server.join().expect("server thread");
}

#[test]
fn peer_close_is_a_channel_error_and_marks_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut client = client_for(&listener);

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let _ = read_line(&mut reader);
        // Close without replying.
        drop(stream);
    });

    let frame = client.fetch_snapshot();
    assert!(frame.is_error());
    assert_eq!(client.state(), LinkState::Disconnected);

    server.join().expect("server thread");
}

#[test]
fn unreachable_endpoint_degrades_to_error_results() {
    let mut client = TcpBridgeClient::new(
        test_config("127.0.0.1:1".to_string()),
        Arc::new(NoopMetrics),
    );

    let frame = client.fetch_snapshot();
    assert!(frame.is_error());

    let outcome = client.submit_action(&ActionRequest::walk_to(3248, 3237, 0));
    assert!(outcome.is_error());
    assert!(!client.is_connected());
}

#[test]
fn plugin_error_reply_maps_to_error_outcome() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let mut client = client_for(&listener);

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;
        let _ = read_line(&mut reader);
        writer
            .write_all(b"{\"status\": \"error\", \"message\": \"unsupported action\"}\n")
            .expect("write reply");
    });

    let outcome = client.submit_action(&ActionRequest::pickup_ground_item(526, 3248, 3237));
    assert!(outcome.is_error());
    assert_eq!(outcome.message.as_deref(), Some("unsupported action"));
    // The reply arrived; the channel itself stays up.
    assert_eq!(client.state(), LinkState::Connected);

    server.join().expect("server thread");
}
