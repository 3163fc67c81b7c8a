use std::collections::HashSet;
use std::time::Duration;

use log::debug;

use super::ssdp::{SsdpClient, SsdpResponse, SSDP_MULTICAST_ADDR};
use crate::error::{Result, SqueezeliteError};

/// Search target matching every SSDP-capable device on the network.
/// LMS answers this with its web-interface address in `LOCATION`.
pub const SEARCH_ALL: &str = "ssdp:all";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// One device that answered a discovery query.
///
/// Ephemeral; produced per query and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredService {
    /// Address the service advertised in its `LOCATION` header.
    pub address: String,
    /// Port the service advertised, when the location URL carries one.
    pub port: Option<u16>,
    /// The raw response headers the service sent.
    pub response: SsdpResponse,
}

impl DiscoveredService {
    /// Build a service record from a raw SSDP response. Responses whose
    /// location URL has no extractable host are dropped.
    pub fn from_response(response: SsdpResponse) -> Option<DiscoveredService> {
        let (address, port) = split_location(&response.location)?;
        Some(DiscoveredService {
            address,
            port,
            response,
        })
    }
}

/// Seam for substituting the server-resolution mechanism, so callers and
/// tests can count or script resolutions without touching the network.
pub trait ServerDiscovery {
    /// Resolve exactly one server address, or fail.
    fn resolve(&mut self) -> Result<String>;
}

/// SSDP-based server discovery.
///
/// Runs one query per `resolve` call: broadcast, collect answers within
/// the timeout window, filter by advertised port, and require exactly
/// one match. No internal retries; callers needing resilience re-invoke.
pub struct SsdpDiscovery {
    target: String,
    port: u16,
    timeout: Duration,
    destination: String,
}

impl SsdpDiscovery {
    /// Discovery for servers advertising the given port, with the
    /// default search target and timeout.
    pub fn new(port: u16) -> Self {
        Self {
            target: SEARCH_ALL.to_string(),
            port,
            timeout: DEFAULT_TIMEOUT,
            destination: SSDP_MULTICAST_ADDR.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Point the query at a non-standard address instead of the SSDP
    /// multicast group. Used by tests with a loopback responder.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Run one discovery query and collect every distinct responder.
    pub fn collect_services(&self) -> Result<Vec<DiscoveredService>> {
        let client = SsdpClient::with_destination(&self.destination, self.timeout)
            .map_err(|e| SqueezeliteError::Discovery(format!("failed to create SSDP client: {}", e)))?;

        let responses = client
            .search(&self.target)
            .map_err(|e| SqueezeliteError::Discovery(format!("SSDP search failed: {}", e)))?;

        let mut services = Vec::new();
        for response in responses {
            match response {
                Ok(response) => {
                    if let Some(service) = DiscoveredService::from_response(response) {
                        debug!(
                            "discovery response from {} (port {:?})",
                            service.address, service.port
                        );
                        services.push(service);
                    }
                }
                Err(e) => {
                    // Skip malformed datagrams, common on busy networks
                    debug!("ignoring SSDP receive error: {}", e);
                }
            }
        }

        Ok(services)
    }
}

impl ServerDiscovery for SsdpDiscovery {
    fn resolve(&mut self) -> Result<String> {
        let services = self.collect_services()?;
        select_server(&services, self.port)
    }
}

/// Apply the resolution policy to a set of discovery responses.
///
/// Only services advertising `port` count. Zero matches fails with
/// `NoServerFound`; two or more distinct addresses fail with
/// `AmbiguousServers` rather than picking one arbitrarily; exactly one
/// returns that address verbatim.
pub fn select_server(services: &[DiscoveredService], port: u16) -> Result<String> {
    let mut matches = Vec::new();
    let mut seen = HashSet::new();

    for service in services {
        if service.port != Some(port) {
            continue;
        }
        if seen.insert(service.address.as_str()) {
            matches.push(service.address.clone());
        }
    }

    match matches.len() {
        0 => Err(SqueezeliteError::NoServerFound { port }),
        1 => Ok(matches.remove(0)),
        _ => Err(SqueezeliteError::AmbiguousServers { port }),
    }
}

/// Convenience function resolving a server with default settings.
pub fn resolve_server(port: u16) -> Result<String> {
    SsdpDiscovery::new(port).resolve()
}

/// Convenience function resolving a server with a custom listen window.
pub fn resolve_server_with_timeout(port: u16, timeout: Duration) -> Result<String> {
    SsdpDiscovery::new(port).with_timeout(timeout).resolve()
}

/// Split a location URL like `http://192.168.1.50:9000/index.html` into
/// host and optional port.
fn split_location(location: &str) -> Option<(String, Option<u16>)> {
    let rest = location
        .strip_prefix("http://")
        .or_else(|| location.strip_prefix("https://"))?;
    let authority = rest.split('/').next()?;

    if authority.is_empty() {
        return None;
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().ok()?;
            Some((host.to_string(), Some(port)))
        }
        None => Some((authority.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(address: &str, port: u16) -> DiscoveredService {
        DiscoveredService {
            address: address.to_string(),
            port: Some(port),
            response: SsdpResponse {
                location: format!("http://{}:{}/index.html", address, port),
                st: SEARCH_ALL.to_string(),
                usn: format!("uuid:{}", address),
                server: None,
            },
        }
    }

    #[test]
    fn test_select_server_single_match() {
        let services = vec![service("192.168.1.50", 9000), service("192.168.1.60", 8080)];

        let address = select_server(&services, 9000).unwrap();
        assert_eq!(address, "192.168.1.50");
    }

    #[test]
    fn test_select_server_no_match() {
        let services = vec![service("192.168.1.60", 8080)];

        match select_server(&services, 9000) {
            Err(SqueezeliteError::NoServerFound { port }) => assert_eq!(port, 9000),
            other => panic!("expected NoServerFound, got {:?}", other),
        }
    }

    #[test]
    fn test_select_server_ambiguous() {
        let services = vec![service("192.168.1.50", 9000), service("192.168.1.51", 9000)];

        match select_server(&services, 9000) {
            Err(SqueezeliteError::AmbiguousServers { port }) => assert_eq!(port, 9000),
            other => panic!("expected AmbiguousServers, got {:?}", other),
        }
    }

    #[test]
    fn test_select_server_dedups_repeat_responses() {
        // The same server often answers an M-SEARCH several times
        let services = vec![service("192.168.1.50", 9000), service("192.168.1.50", 9000)];

        let address = select_server(&services, 9000).unwrap();
        assert_eq!(address, "192.168.1.50");
    }

    #[test]
    fn test_split_location() {
        assert_eq!(
            split_location("http://192.168.1.50:9000/index.html"),
            Some(("192.168.1.50".to_string(), Some(9000)))
        );
        assert_eq!(
            split_location("http://192.168.1.50/"),
            Some(("192.168.1.50".to_string(), None))
        );
        assert_eq!(split_location("ftp://192.168.1.50:9000/"), None);
        assert_eq!(split_location("http://host:notaport/"), None);
    }

    #[test]
    fn test_from_response_drops_unparseable_location() {
        let response = SsdpResponse {
            location: "not-a-url".to_string(),
            st: SEARCH_ALL.to_string(),
            usn: "uuid:x".to_string(),
            server: None,
        };

        assert_eq!(DiscoveredService::from_response(response), None);
    }
}
