use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

/// Minimal percent-encoding matching what the LMS CLI applies to
/// response fields.
pub fn encode(value: &str) -> String {
    value.replace('%', "%25").replace(':', "%3A").replace(' ', "%20")
}

/// A scripted stand-in for the LMS command-line interface: accepts one
/// connection and answers `player count` / `player id` registry queries
/// plus player-scoped commands and now-playing queries, echoing each
/// request the way the real server does.
pub struct FakeLms {
    /// MAC addresses of registered players, in registry order.
    pub players: Vec<String>,
    /// Now-playing attribute values, keyed by query verb ("title", ...).
    pub tracks: HashMap<String, String>,
    /// Hang up after serving this many requests, simulating a server
    /// that goes away mid-session.
    pub close_after: Option<usize>,
}

impl FakeLms {
    pub fn new(players: &[&str]) -> Self {
        Self {
            players: players.iter().map(|p| p.to_string()).collect(),
            tracks: HashMap::new(),
            close_after: None,
        }
    }

    pub fn close_after(mut self, requests: usize) -> Self {
        self.close_after = Some(requests);
        self
    }

    pub fn with_track(mut self, attribute: &str, value: &str) -> Self {
        self.tracks.insert(attribute.to_string(), value.to_string());
        self
    }

    /// Bind a loopback listener, serve one session on a background
    /// thread, and return the address to connect to.
    pub fn spawn(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake LMS");
        let addr = listener.local_addr().expect("fake LMS address");

        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                self.serve(stream);
            }
        });

        addr
    }

    fn serve(&self, stream: TcpStream) {
        let mut writer = stream.try_clone().expect("clone fake LMS stream");
        let reader = BufReader::new(stream);
        let mut served = 0;

        for line in reader.lines() {
            if self.close_after.is_some_and(|limit| served >= limit) {
                break;
            }
            served += 1;
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let reply = self.reply_to(line.trim_end());
            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
            if writer.write_all(b"\n").is_err() {
                break;
            }
        }
    }

    fn reply_to(&self, request: &str) -> String {
        if request == "player count ?" {
            return format!("player count {}", self.players.len());
        }

        let terms: Vec<&str> = request.split_whitespace().collect();

        if terms.len() == 4 && terms[0] == "player" && terms[1] == "id" && terms[3] == "?" {
            let reply = match terms[2].parse::<usize>().ok().and_then(|i| self.players.get(i)) {
                Some(mac) => format!("player id {} {}", terms[2], encode(mac)),
                None => format!("player id {}", terms[2]),
            };
            return reply;
        }

        // Player-scoped requests: "<mac> verb ..." — queries replace the
        // trailing "?" with the value, commands echo verbatim.
        if request.ends_with(" ?") {
            let prefix = &request[..request.len() - 2];
            let verb = terms[terms.len() - 2];
            return match self.tracks.get(verb) {
                Some(value) => format!("{} {}", prefix, encode(value)),
                None => prefix.to_string(),
            };
        }

        request.to_string()
    }
}
