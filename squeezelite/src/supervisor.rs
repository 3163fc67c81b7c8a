use std::process::{Command, Stdio};

use log::{debug, warn};
use sysinfo::{ProcessesToUpdate, System};

use crate::config::PlayerConfig;
use crate::error::{Result, SqueezeliteError};
use crate::model::NowPlaying;
use crate::session::ControlSession;
use crate::transport::discovery::{ServerDiscovery, SsdpDiscovery};

/// Supervises one squeezelite player: resolves the server, holds the
/// control session, launches the player process, and can later find and
/// terminate running instances by binary path.
///
/// Single-owner and synchronous throughout; there is exactly one
/// session per supervisor and no ambient state.
pub struct Squeezelite {
    config: PlayerConfig,
    server: Option<String>,
    session: Option<ControlSession>,
}

impl Squeezelite {
    pub fn new(config: PlayerConfig) -> Squeezelite {
        let server = config.server().map(str::to_string);
        Squeezelite {
            config,
            server,
            session: None,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The server address, once configured or discovered.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Resolve the server, connect the control session, and launch the
    /// player process.
    ///
    /// Discovery runs only when no static server address is configured.
    /// The session is established before the spawn so the player's
    /// target server is confirmed reachable first. The spawn itself
    /// blocks only until the player daemonizes.
    pub fn start(&mut self) -> Result<()> {
        let mut discovery = self.default_discovery();
        self.start_with(&mut discovery)
    }

    /// As [`start`](Self::start), with an explicit discovery mechanism.
    pub fn start_with<D: ServerDiscovery>(&mut self, discovery: &mut D) -> Result<()> {
        self.connect_with(discovery)?;

        let args = self.launch_args();
        debug!("launching {} {}", self.config.binary().display(), args.join(" "));

        let status = Command::new(self.config.binary())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            warn!("squeezelite launcher exited with {}", status);
        }

        Ok(())
    }

    /// Connect the control session without launching the player.
    /// Requires a server address; runs discovery when none is set.
    pub fn connect(&mut self) -> Result<()> {
        let mut discovery = self.default_discovery();
        self.connect_with(&mut discovery)
    }

    fn connect_with<D: ServerDiscovery>(&mut self, discovery: &mut D) -> Result<()> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => {
                let server = discovery.resolve()?;
                debug!("discovered server {}", server);
                self.server = Some(server.clone());
                server
            }
        };

        self.session = Some(ControlSession::connect(
            &server,
            self.config.control_port(),
            self.config.mac(),
        )?);

        Ok(())
    }

    fn default_discovery(&self) -> SsdpDiscovery {
        SsdpDiscovery::new(self.config.server_port())
            .with_timeout(self.config.discovery_timeout())
    }

    /// Drop the control session, if any. The player process keeps
    /// running; it is detached from this supervisor's lifetime.
    pub fn disconnect(&mut self) {
        self.session = None;
    }

    /// Assemble the player's launch arguments: the daemonize flag
    /// first, then name, MAC, server, and any extra arguments verbatim.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec!["-z".to_string()];

        args.push("-n".to_string());
        args.push(self.config.name().to_string());

        args.push("-m".to_string());
        args.push(self.config.mac().to_string());

        if let Some(server) = &self.server {
            args.push("-s".to_string());
            args.push(server.clone());
        }

        args.extend(self.config.extra_args().iter().cloned());

        args
    }

    /// Terminate every running process whose executable matches the
    /// configured binary path. Returns how many were signalled; finding
    /// none is an error, never silently swallowed.
    pub fn kill(&self) -> Result<usize> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let binary = self.config.binary();
        let mut killed = 0;

        for process in system.processes().values() {
            if process.exe() == Some(binary) {
                debug!("killing pid {}", process.pid());
                if process.kill() {
                    killed += 1;
                }
            }
        }

        if killed == 0 {
            return Err(SqueezeliteError::NoSuchProcess(
                binary.display().to_string(),
            ));
        }

        Ok(killed)
    }

    pub fn play_pause(&mut self) -> Result<()> {
        self.session()?.play_pause()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.session()?.stop()
    }

    pub fn next_track(&mut self) -> Result<()> {
        self.session()?.next_track()
    }

    pub fn prev_track(&mut self) -> Result<()> {
        self.session()?.prev_track()
    }

    pub fn track_title(&mut self) -> Result<Option<String>> {
        self.session()?.track_title()
    }

    pub fn track_artist(&mut self) -> Result<Option<String>> {
        self.session()?.track_artist()
    }

    pub fn track_album(&mut self) -> Result<Option<String>> {
        self.session()?.track_album()
    }

    pub fn track_duration(&mut self) -> Result<Option<f64>> {
        self.session()?.track_duration()
    }

    pub fn track_elapsed(&mut self) -> Result<Option<f64>> {
        self.session()?.track_elapsed()
    }

    pub fn now_playing(&mut self) -> Result<NowPlaying> {
        self.session()?.now_playing()
    }

    /// Query a now-playing attribute by name. Unknown names come back
    /// as `Ok(None)` rather than an error.
    pub fn player_info(&mut self, name: &str) -> Result<Option<String>> {
        self.session()?.query_named(name)
    }

    /// Explicit precondition check: every command and query requires an
    /// established session.
    fn session(&mut self) -> Result<&mut ControlSession> {
        self.session.as_mut().ok_or(SqueezeliteError::NotConnected)
    }
}
