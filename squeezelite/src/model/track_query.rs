/// The closed set of now-playing attributes a control session can query.
///
/// The set is deliberately enumerated rather than driven by caller
/// strings, so an unsupported attribute is unrepresentable here and the
/// string entry points degrade to an explicit "unavailable" result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackQuery {
    Title,
    Artist,
    Album,
    Duration,
    Elapsed,
}

impl TrackQuery {
    /// The CLI query verb sent over the control session.
    pub fn command(self) -> &'static str {
        match self {
            TrackQuery::Title => "title",
            TrackQuery::Artist => "artist",
            TrackQuery::Album => "album",
            TrackQuery::Duration => "duration",
            TrackQuery::Elapsed => "time",
        }
    }

    /// Map a caller-supplied attribute name to a query kind.
    ///
    /// Accepts both the bare CLI verbs and the accessor-style names the
    /// scripting surface historically used. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<TrackQuery> {
        match name {
            "title" | "track_title" | "get_track_title" => Some(TrackQuery::Title),
            "artist" | "track_artist" | "get_track_artist" => Some(TrackQuery::Artist),
            "album" | "track_album" | "get_track_album" => Some(TrackQuery::Album),
            "duration" | "track_duration" | "get_track_duration" => Some(TrackQuery::Duration),
            "time" | "elapsed" | "track_time" | "get_time_elapsed" => Some(TrackQuery::Elapsed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_verbs() {
        assert_eq!(TrackQuery::Title.command(), "title");
        assert_eq!(TrackQuery::Elapsed.command(), "time");
    }

    #[test]
    fn test_from_name_accepts_aliases() {
        assert_eq!(TrackQuery::from_name("title"), Some(TrackQuery::Title));
        assert_eq!(TrackQuery::from_name("get_track_title"), Some(TrackQuery::Title));
        assert_eq!(TrackQuery::from_name("get_time_elapsed"), Some(TrackQuery::Elapsed));
        assert_eq!(TrackQuery::from_name("track_album"), Some(TrackQuery::Album));
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert_eq!(TrackQuery::from_name("bitrate"), None);
        assert_eq!(TrackQuery::from_name(""), None);
        assert_eq!(TrackQuery::from_name("TITLE"), None);
    }
}
