use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::{Result, SqueezeliteError};
use crate::model::{NowPlaying, TrackQuery};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// One live administrative connection to the server's line-oriented
/// control port, scoped to a single player identity.
///
/// Requests are single lines; the server echoes the request with any
/// trailing `?` replaced by the percent-encoded result. The session
/// never reconnects on its own: once the connection drops, operations
/// fail and the caller must connect again.
#[derive(Debug)]
pub struct ControlSession {
    peer: String,
    mac: String,
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl ControlSession {
    /// Open a connection to `host:port` and verify that a player with
    /// the given MAC address is registered with the server.
    ///
    /// Fails with `Unreachable` when the server cannot be reached and
    /// `PlayerNotRegistered` when no registered player matches; in the
    /// latter case no session is handed back, so commands against an
    /// unknown player are unrepresentable.
    pub fn connect(host: &str, port: u16, mac: &str) -> Result<ControlSession> {
        let peer = format!("{}:{}", host, port);
        let addr = peer
            .to_socket_addrs()
            .map_err(|_| SqueezeliteError::Unreachable(peer.clone()))?
            .next()
            .ok_or_else(|| SqueezeliteError::Unreachable(peer.clone()))?;

        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .map_err(|_| SqueezeliteError::Unreachable(peer.clone()))?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let reader = BufReader::new(stream.try_clone()?);

        debug!("control session connected to {}", peer);

        let mut session = ControlSession {
            peer,
            mac: mac.to_string(),
            stream,
            reader,
        };
        session.verify_registered()?;

        Ok(session)
    }

    /// Address of the connected server.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// MAC address of the player this session controls.
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Toggle play/pause.
    pub fn play_pause(&mut self) -> Result<()> {
        self.command("pause")
    }

    /// Stop playback.
    pub fn stop(&mut self) -> Result<()> {
        self.command("stop")
    }

    /// Skip to the next track in the playlist.
    pub fn next_track(&mut self) -> Result<()> {
        self.command("playlist index +1")
    }

    /// Skip to the previous track in the playlist.
    pub fn prev_track(&mut self) -> Result<()> {
        self.command("playlist index -1")
    }

    /// Query one now-playing attribute. An empty server reply (no track
    /// loaded, or metadata missing) comes back as `Ok(None)`.
    pub fn query(&mut self, query: TrackQuery) -> Result<Option<String>> {
        let value = self.player_request(&format!("{} ?", query.command()))?;
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    /// Query an attribute by name. Unknown names are not an error: they
    /// degrade to the unavailable sentinel without touching the wire.
    pub fn query_named(&mut self, name: &str) -> Result<Option<String>> {
        match TrackQuery::from_name(name) {
            Some(query) => self.query(query),
            None => Ok(None),
        }
    }

    pub fn track_title(&mut self) -> Result<Option<String>> {
        self.query(TrackQuery::Title)
    }

    pub fn track_artist(&mut self) -> Result<Option<String>> {
        self.query(TrackQuery::Artist)
    }

    pub fn track_album(&mut self) -> Result<Option<String>> {
        self.query(TrackQuery::Album)
    }

    /// Track length in seconds.
    pub fn track_duration(&mut self) -> Result<Option<f64>> {
        self.query_seconds(TrackQuery::Duration)
    }

    /// Elapsed playback time in seconds.
    pub fn track_elapsed(&mut self) -> Result<Option<f64>> {
        self.query_seconds(TrackQuery::Elapsed)
    }

    /// Snapshot of every supported now-playing attribute.
    pub fn now_playing(&mut self) -> Result<NowPlaying> {
        Ok(NowPlaying {
            title: self.track_title()?,
            artist: self.track_artist()?,
            album: self.track_album()?,
            duration: self.track_duration()?,
            elapsed: self.track_elapsed()?,
        })
    }

    fn query_seconds(&mut self, query: TrackQuery) -> Result<Option<f64>> {
        match self.query(query)? {
            Some(value) => {
                let seconds = value.parse().map_err(|_| {
                    SqueezeliteError::Protocol(format!(
                        "expected seconds for {}, got {:?}",
                        query.command(),
                        value
                    ))
                })?;
                Ok(Some(seconds))
            }
            None => Ok(None),
        }
    }

    /// Walk the server's player registry looking for our MAC address.
    fn verify_registered(&mut self) -> Result<()> {
        let count: usize = {
            let reply = self.request("player count ?")?;
            reply.parse().map_err(|_| {
                SqueezeliteError::Protocol(format!("bad player count {:?}", reply))
            })?
        };

        for index in 0..count {
            let id = self.request(&format!("player id {} ?", index))?;
            if id.eq_ignore_ascii_case(&self.mac) {
                debug!("player {} registered as index {}", self.mac, index);
                return Ok(());
            }
        }

        Err(SqueezeliteError::PlayerNotRegistered(self.mac.clone()))
    }

    /// Fire a player-scoped command, discarding the acknowledgement.
    fn command(&mut self, command: &str) -> Result<()> {
        self.player_request(command).map(|_| ())
    }

    /// Issue a request scoped to this session's player.
    fn player_request(&mut self, command: &str) -> Result<String> {
        let request = format!(
            "{} {}",
            utf8_percent_encode(&self.mac, NON_ALPHANUMERIC),
            command
        );
        self.request(&request)
    }

    /// One request/response exchange on the control connection.
    fn request(&mut self, command: &str) -> Result<String> {
        debug!("-> {}", command);
        self.stream.write_all(command.as_bytes())?;
        self.stream.write_all(b"\n")?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            // Server closed the connection
            return Err(SqueezeliteError::Unreachable(self.peer.clone()));
        }
        let reply = line.trim_end();
        debug!("<- {}", reply);

        parse_reply(command, reply)
    }
}

/// Strip the echoed request from a reply and return the decoded result
/// value (empty for acknowledgement-only commands).
///
/// The server echoes each request term percent-encoded, with a trailing
/// `?` replaced by the result, so the result is whatever follows the
/// echoed terms.
fn parse_reply(command: &str, reply: &str) -> Result<String> {
    let mut expected: Vec<String> = command
        .split_whitespace()
        .map(decode_term)
        .collect::<Result<_>>()?;
    if expected.last().map(String::as_str) == Some("?") {
        expected.pop();
    }

    let terms: Vec<String> = reply
        .split_whitespace()
        .map(decode_term)
        .collect::<Result<_>>()?;

    if terms.len() < expected.len() || terms[..expected.len()] != expected[..] {
        return Err(SqueezeliteError::Protocol(format!(
            "reply {:?} does not echo request {:?}",
            reply, command
        )));
    }

    Ok(terms[expected.len()..].join(" "))
}

fn decode_term(term: &str) -> Result<String> {
    percent_decode_str(term)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| SqueezeliteError::Protocol(format!("invalid encoding in {:?}", term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_query_value() {
        let value = parse_reply(
            "12%3A34%3A56%3A78%3A90%3AAB title ?",
            "12%3A34%3A56%3A78%3A90%3AAB title Some%20Song",
        )
        .unwrap();
        assert_eq!(value, "Some Song");
    }

    #[test]
    fn test_parse_reply_empty_value() {
        let value = parse_reply(
            "12%3A34%3A56%3A78%3A90%3AAB title ?",
            "12%3A34%3A56%3A78%3A90%3AAB title",
        )
        .unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn test_parse_reply_ack_only_command() {
        let value = parse_reply(
            "12%3A34%3A56%3A78%3A90%3AAB playlist index +1",
            "12%3A34%3A56%3A78%3A90%3AAB playlist index +1",
        )
        .unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn test_parse_reply_server_level_query() {
        let value = parse_reply("player count ?", "player count 2").unwrap();
        assert_eq!(value, "2");
    }

    #[test]
    fn test_parse_reply_mismatched_echo() {
        let result = parse_reply("player count ?", "player id 0 aa%3Abb");
        assert!(matches!(result, Err(SqueezeliteError::Protocol(_))));
    }

    #[test]
    fn test_parse_reply_multi_term_value() {
        // Values with encoded spaces arrive as one term, but tolerate
        // servers splitting them
        let value = parse_reply("player id 0 ?", "player id 0 aa%3Abb%3Acc").unwrap();
        assert_eq!(value, "aa:bb:cc");
    }
}
