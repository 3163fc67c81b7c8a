mod now_playing;
mod track_query;

pub use now_playing::NowPlaying;
pub use track_query::TrackQuery;
