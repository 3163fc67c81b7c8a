use std::io::{Error, ErrorKind};
use std::net::UdpSocket;
use std::time::Duration;

/// Standard SSDP multicast group and port.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// One parsed SSDP response.
#[derive(Debug, Clone, PartialEq)]
pub struct SsdpResponse {
    pub location: String,
    pub st: String,
    pub usn: String,
    pub server: Option<String>,
}

/// SSDP client for service discovery.
pub struct SsdpClient {
    socket: UdpSocket,
    destination: String,
}

impl SsdpClient {
    /// Create a client that searches the standard multicast group with
    /// the specified read timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        Self::with_destination(SSDP_MULTICAST_ADDR, timeout)
    }

    /// Create a client that sends its search to a non-standard address.
    /// Used to point discovery at a scripted responder in tests.
    pub fn with_destination(destination: &str, timeout: Duration) -> Result<Self, Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(timeout))?;
        socket.set_multicast_loop_v4(true)?;

        Ok(Self {
            socket,
            destination: destination.to_string(),
        })
    }

    /// Send an M-SEARCH request and return an iterator over responses.
    /// The iterator ends when the socket's read timeout elapses, so a
    /// search always terminates.
    pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>, Error> {
        let request = format!(
            "M-SEARCH * HTTP/1.1\r\n\
            HOST: {}\r\n\
            MAN: \"ssdp:discover\"\r\n\
            MX: 2\r\n\
            ST: {}\r\n\
            USER-AGENT: squeezelite-rs/1.0 UPnP/1.0\r\n\
            \r\n",
            self.destination, search_target
        );

        self.socket.send_to(request.as_bytes(), &self.destination)?;

        Ok(SsdpResponseIterator::new(&self.socket))
    }
}

/// Iterator over SSDP responses.
pub struct SsdpResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl<'a> SsdpResponseIterator<'a> {
    fn new(socket: &'a UdpSocket) -> Self {
        Self {
            socket,
            buffer: [0; 2048],
            finished: false,
        }
    }
}

impl<'a> Iterator for SsdpResponseIterator<'a> {
    type Item = Result<SsdpResponse, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.socket.recv_from(&mut self.buffer) {
            Ok((size, _)) => {
                match std::str::from_utf8(&self.buffer[..size]) {
                    Ok(response_text) => match parse_ssdp_response(response_text) {
                        Some(response) => Some(Ok(response)),
                        // Not an SSDP response, try the next datagram
                        None => self.next(),
                    },
                    // Invalid UTF-8, try the next datagram
                    Err(_) => self.next(),
                }
            }
            Err(e) => {
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut {
                    self.finished = true;
                    None
                } else {
                    Some(Err(e))
                }
            }
        }
    }
}

/// Parse an SSDP response from HTTP-style text.
fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut st = None;
    let mut usn = None;
    let mut server = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some(value) = extract_header_value(line, "LOCATION:") {
            location = Some(value);
        } else if let Some(value) = extract_header_value(line, "ST:") {
            st = Some(value);
        } else if let Some(value) = extract_header_value(line, "USN:") {
            usn = Some(value);
        } else if let Some(value) = extract_header_value(line, "SERVER:") {
            server = Some(value);
        }
    }

    match (location, st, usn) {
        (Some(location), Some(st), Some(usn)) => Some(SsdpResponse {
            location,
            st,
            usn,
            server,
        }),
        _ => None,
    }
}

/// Extract header value from a line like "HEADER: value"
fn extract_header_value(line: &str, header: &str) -> Option<String> {
    if line.len() > header.len() && line[..header.len()].eq_ignore_ascii_case(header) {
        Some(line[header.len()..].trim().to_string())
    } else {
        None
    }
}
