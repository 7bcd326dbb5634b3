// src/transport.rs
//
// Synchronous request/reply client for the bridge plugin.
//
// Wire protocol (newline-framed over a single TCP connection):
//   -> "command:get_observation"
//   -> "command:execute_action:{\"action_type\":...,\"parameters\":{...}}"
//   <- one JSON object per line: the telemetry record, or
//      {"status":"submitted"|"error","message":...}
//
// Exactly one request is in flight at a time; a request is never sent
// before the prior reply is consumed. Every fault is folded into an
// Error-status result — nothing here panics or escapes to the episode
// loop.
//
// Connection lifecycle is an explicit state machine:
//   Disconnected --(call)--> Reconnecting --ok--> Connected
//   Connected --timeout/channel failure--> Disconnected
// Reconnection closes the old handle before opening a new one and is
// attempted at most once per call; if it fails the call returns an
// error result and the next call tries again.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;

use crate::config::TransportConfig;
use crate::metrics::MetricsSink;
use crate::telemetry::TelemetryFrame;
use crate::types::{ActionOutcome, ActionRequest};

/// Classification of a failed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// No reply within the request timeout. Channel fault.
    Timeout,
    /// Broken pipe, reset, EOF, or another socket-level failure.
    Channel,
    /// Reply arrived but was not decodable JSON. Peer-logic fault;
    /// the connection is kept.
    MalformedReply,
    /// Reconnection failed; no usable channel for this call.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Raw reply text for malformed-reply diagnostics.
    pub raw: Option<String>,
}

impl TransportError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Timeout,
            message: message.into(),
            raw: None,
        }
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Channel,
            message: message.into(),
            raw: None,
        }
    }

    pub fn malformed(message: impl Into<String>, raw: String) -> Self {
        Self {
            kind: TransportErrorKind::MalformedReply,
            message: message.into(),
            raw: Some(raw),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Unavailable,
            message: message.into(),
            raw: None,
        }
    }

    /// Stable label used as the metrics error kind.
    pub fn reason_label(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Channel => "channel",
            TransportErrorKind::MalformedReply => "malformed_reply",
            TransportErrorKind::Unavailable => "unavailable",
        }
    }
}

/// Connection state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Reconnecting,
    Connected,
}

/// Abstract bridge channel.
///
/// The episode controller talks to the remote world only through this
/// trait; tests substitute a scripted implementation.
pub trait BridgeTransport {
    /// Request one telemetry snapshot. Never fails outright: transport
    /// faults come back as error-status frames.
    fn fetch_snapshot(&mut self) -> TelemetryFrame;

    /// Submit one action. Never fails outright: transport faults come
    /// back as error-status outcomes.
    fn submit_action(&mut self, request: &ActionRequest) -> ActionOutcome;

    /// True only while the link is marked connected AND the last
    /// successful round trip is within the freshness window.
    fn is_connected(&self) -> bool;

    /// Release the connection handle.
    fn close(&mut self);
}

/// Blocking TCP client implementing the bridge protocol.
pub struct TcpBridgeClient {
    cfg: TransportConfig,
    metrics: Arc<dyn MetricsSink>,
    state: LinkState,
    stream: Option<TcpStream>,
    read_buf: Vec<u8>,
    last_success: Option<Instant>,
}

impl TcpBridgeClient {
    /// Create a client. No connection is opened until the first call;
    /// the reconnect-before-call path handles the initial connect.
    pub fn new(cfg: TransportConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            cfg,
            metrics,
            state: LinkState::Disconnected,
            stream: None,
            read_buf: Vec::new(),
            last_success: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Close any prior handle and open a fresh connection.
    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.state = LinkState::Reconnecting;
        // Old handle is dropped (closed) before the new one is created.
        self.stream = None;
        self.read_buf.clear();

        let addr = match resolve_endpoint(&self.cfg.endpoint) {
            Ok(addr) => addr,
            Err(err) => {
                self.state = LinkState::Disconnected;
                self.metrics.record_connection_failure();
                return Err(TransportError::unavailable(format!(
                    "cannot resolve bridge endpoint {}: {err}",
                    self.cfg.endpoint
                )));
            }
        };

        match TcpStream::connect_timeout(&addr, self.cfg.connect_timeout) {
            Ok(stream) => {
                // Socket options are best-effort; a failure here still
                // leaves a usable blocking stream.
                let _ = stream.set_read_timeout(Some(self.cfg.request_timeout));
                let _ = stream.set_write_timeout(Some(self.cfg.request_timeout));
                let _ = stream.set_nodelay(true);
                self.stream = Some(stream);
                self.state = LinkState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = LinkState::Disconnected;
                self.metrics.record_connection_failure();
                Err(TransportError::unavailable(format!(
                    "reconnect to {} failed: {err}",
                    self.cfg.endpoint
                )))
            }
        }
    }

    fn drop_connection(&mut self) {
        self.stream = None;
        self.read_buf.clear();
        self.state = LinkState::Disconnected;
    }

    /// One request/reply exchange, reconnecting first if needed.
    fn round_trip(&mut self, line: &str) -> Result<JsonValue, TransportError> {
        if self.state != LinkState::Connected || self.stream.is_none() {
            self.reconnect()?;
        }

        let timeout = self.cfg.request_timeout;
        let io_result = match (self.stream.as_mut(), &mut self.read_buf) {
            (Some(stream), buf) => {
                write_request(stream, line).and_then(|()| read_reply_line(stream, buf, timeout))
            }
            (None, _) => Err(TransportError::unavailable("no live connection handle")),
        };

        match io_result {
            Ok(text) => {
                // The channel did its job regardless of payload quality.
                self.last_success = Some(Instant::now());
                match serde_json::from_str::<JsonValue>(&text) {
                    Ok(value) => Ok(value),
                    Err(err) => Err(TransportError::malformed(
                        format!("undecodable reply payload: {err}"),
                        text,
                    )),
                }
            }
            Err(err) => {
                self.drop_connection();
                Err(err)
            }
        }
    }
}

impl BridgeTransport for TcpBridgeClient {
    fn fetch_snapshot(&mut self) -> TelemetryFrame {
        let start = Instant::now();
        let result = self.round_trip("command:get_observation");
        self.metrics
            .record_observation_latency(elapsed_ms(start));

        match result {
            Ok(value) => TelemetryFrame::from_value(value),
            Err(err) => {
                self.metrics.record_error(err.reason_label(), &err.message);
                match err.raw {
                    Some(raw) => TelemetryFrame::malformed(err.message, &raw),
                    None => TelemetryFrame::transport_error(err.message),
                }
            }
        }
    }

    fn submit_action(&mut self, request: &ActionRequest) -> ActionOutcome {
        let payload = match serde_json::to_string(&request.to_payload()) {
            Ok(payload) => payload,
            Err(err) => {
                return ActionOutcome::error(format!("unencodable action request: {err}"));
            }
        };
        let line = format!("command:execute_action:{payload}");

        let start = Instant::now();
        let result = self.round_trip(&line);
        self.metrics.record_action_latency(elapsed_ms(start));

        match result {
            Ok(value) => parse_action_reply(&value),
            Err(err) => {
                self.metrics.record_error(err.reason_label(), &err.message);
                match err.raw {
                    Some(raw) => ActionOutcome::error(format!("{} (raw: {raw})", err.message)),
                    None => ActionOutcome::error(err.message),
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
            && self
                .last_success
                .map(|t| t.elapsed() <= self.cfg.freshness_window)
                .unwrap_or(false)
    }

    fn close(&mut self) {
        self.drop_connection();
    }
}

fn resolve_endpoint(endpoint: &str) -> io::Result<SocketAddr> {
    endpoint.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "endpoint resolved to no address",
        )
    })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn write_request(stream: &mut TcpStream, line: &str) -> Result<(), TransportError> {
    let mut framed = Vec::with_capacity(line.len() + 1);
    framed.extend_from_slice(line.as_bytes());
    framed.push(b'\n');
    stream
        .write_all(&framed)
        .and_then(|()| stream.flush())
        .map_err(|err| classify_io_error(err, "sending request"))
}

/// Read bytes until the next newline. Leftover bytes after the newline
/// stay in `buf` (a well-behaved peer never produces any under strict
/// request/reply discipline).
fn read_reply_line(
    stream: &mut TcpStream,
    buf: &mut Vec<u8>,
    timeout: std::time::Duration,
) -> Result<String, TransportError> {
    loop {
        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1])
                .trim_end_matches('\r')
                .to_string();
            return Ok(text);
        }

        let mut chunk = [0u8; 4096];
        match stream.read(&mut chunk) {
            Ok(0) => {
                return Err(TransportError::channel(
                    "bridge closed the connection mid-reply",
                ));
            }
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(err) if is_timeout(&err) => {
                return Err(TransportError::timeout(format!(
                    "timeout waiting for bridge reply after {timeout:?}"
                )));
            }
            Err(err) => return Err(classify_io_error(err, "reading reply")),
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn classify_io_error(err: io::Error, phase: &str) -> TransportError {
    if is_timeout(&err) {
        TransportError::timeout(format!("timeout while {phase}: {err}"))
    } else {
        TransportError::channel(format!("channel failure while {phase}: {err}"))
    }
}

/// Decode an execute_action reply into an outcome.
fn parse_action_reply(value: &JsonValue) -> ActionOutcome {
    let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string());

    match value.get("status").and_then(|s| s.as_str()) {
        Some("submitted") => ActionOutcome {
            status: crate::types::OutcomeStatus::Submitted,
            message,
        },
        Some("error") => {
            ActionOutcome::error(message.unwrap_or_else(|| "bridge reported an error".to_string()))
        }
        _ => ActionOutcome::error(format!("unexpected reply shape: {value}")),
    }
}
