pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod supervisor;
pub mod transport;

// Re-export key types for easier access
pub use config::{PlayerConfig, PlayerConfigBuilder};
pub use error::{Result, SqueezeliteError};
pub use model::{NowPlaying, TrackQuery};
pub use session::ControlSession;
pub use supervisor::Squeezelite;
pub use transport::discovery::{
    resolve_server, resolve_server_with_timeout, DiscoveredService, ServerDiscovery, SsdpDiscovery,
};
