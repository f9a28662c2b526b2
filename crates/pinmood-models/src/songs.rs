//! Extraction of bolded "Song - Artist" pairs from generated text.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A song suggested by the text generator, not yet looked up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SongCandidate {
    pub song: String,
    pub artist: String,
}

impl SongCandidate {
    pub fn new(song: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            song: song.into(),
            artist: artist.into(),
        }
    }

    /// Free-text catalog query for this candidate.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.song, self.artist)
    }
}

static BOLD_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*\s*(.*?)\s*-\s*(.*?)\s*\*\*").expect("valid song pattern")
});

/// Scan `text` for `**<song> - <artist>**` occurrences, in order.
///
/// Text that does not follow the bolding convention yields no candidates.
pub fn extract_song_candidates(text: &str) -> Vec<SongCandidate> {
    BOLD_PAIR
        .captures_iter(text)
        .map(|caps| {
            SongCandidate::new(
                caps.get(1).map_or("", |m| m.as_str()).trim(),
                caps.get(2).map_or("", |m| m.as_str()).trim(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_pairs_in_order() {
        let songs = extract_song_candidates("**Clocks - Coldplay**, **Yellow - Coldplay**");
        assert_eq!(
            songs,
            vec![
                SongCandidate::new("Clocks", "Coldplay"),
                SongCandidate::new("Yellow", "Coldplay"),
            ]
        );
    }

    #[test]
    fn test_no_bold_pairs_is_empty() {
        assert!(extract_song_candidates("").is_empty());
        assert!(extract_song_candidates("Clocks - Coldplay, Yellow - Coldplay").is_empty());
        assert!(extract_song_candidates("*Clocks - Coldplay*").is_empty());
    }

    #[test]
    fn test_fields_are_trimmed() {
        let songs = extract_song_candidates("1. **  Here Comes the Sun   -  The Beatles **");
        assert_eq!(songs, vec![SongCandidate::new("Here Comes the Sun", "The Beatles")]);
    }

    #[test]
    fn test_markdown_list_output() {
        let text = "Here are some songs:\n\
                    1. **Walking on Sunshine - Katrina and the Waves**: upbeat.\n\
                    2. **Happy - Pharrell Williams**: joyful.\n\
                    Enjoy!";
        let songs = extract_song_candidates(text);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].artist, "Katrina and the Waves");
        assert_eq!(songs[1], SongCandidate::new("Happy", "Pharrell Williams"));
    }

    #[test]
    fn test_search_query_joins_fields() {
        assert_eq!(SongCandidate::new("Clocks", "Coldplay").search_query(), "Clocks Coldplay");
    }
}
