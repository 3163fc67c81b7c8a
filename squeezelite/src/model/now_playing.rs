/// Snapshot of the current track, as reported by the server.
///
/// Every field is best-effort; a stopped player or a stream without
/// metadata leaves fields unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlaying {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Track length in seconds.
    pub duration: Option<f64>,
    /// Elapsed playback time in seconds.
    pub elapsed: Option<f64>,
}
