//! Placeholder substitution for decoder and encoder commands.

use std::path::Path;

use sourcecast_util::{locale_to_utf8, replace_first, suffix_equals_ignore_case, ConversionMode};

use crate::config::DecoderConfig;

/// Replaced with the track path.
pub const TRACK_PLACEHOLDER: &str = "@T@";
/// Replaced with the full metadata string.
pub const METADATA_PLACEHOLDER: &str = "@M@";
/// Replaced with the artist.
pub const ARTIST_PLACEHOLDER: &str = "@a@";
/// Replaced with the title.
pub const TITLE_PLACEHOLDER: &str = "@t@";
/// Replaced with the stream name.
pub const STREAM_PLACEHOLDER: &str = "@s@";

/// Values substituted into a command line.
///
/// Each placeholder's first occurrence is replaced with the shell-quoted
/// value. Placeholders without a value are left as they are.
///
/// # Example
///
/// ```
/// use sourcecast::command::CommandTemplate;
/// use std::path::Path;
///
/// let cmd = CommandTemplate::new()
///     .with_track(Path::new("/music/it's.mp3"))
///     .render("madplay -o raw:- @T@");
///
/// assert_eq!(cmd, r"madplay -o raw:- '/music/it\'s.mp3'");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandTemplate {
    mode: ConversionMode,
    track: Option<String>,
    metadata: Option<String>,
    artist: Option<String>,
    title: Option<String>,
    stream: Option<String>,
}

impl CommandTemplate {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how locale-encoded values are converted to UTF-8.
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_track(mut self, path: &Path) -> Self {
        self.track = Some(path.to_string_lossy().into_owned());
        self
    }

    /// Set the full metadata string, overriding the artist/title default.
    pub fn with_metadata(mut self, metadata: &str) -> Self {
        self.metadata = Some(metadata.to_string());
        self
    }

    pub fn with_artist(mut self, artist: &str) -> Self {
        self.artist = Some(artist.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Set the artist from text in the locale codeset.
    pub fn with_artist_bytes(self, raw: &[u8]) -> Self {
        let artist = locale_to_utf8(Some(raw), self.mode);
        self.with_artist(&artist)
    }

    /// Set the title from text in the locale codeset.
    pub fn with_title_bytes(self, raw: &[u8]) -> Self {
        let title = locale_to_utf8(Some(raw), self.mode);
        self.with_title(&title)
    }

    pub fn with_stream(mut self, name: &str) -> Self {
        self.stream = Some(name.to_string());
        self
    }

    /// The `@M@` value: explicit metadata, else `artist - title`, else
    /// whichever of the two is set.
    pub fn metadata(&self) -> Option<String> {
        if let Some(ref metadata) = self.metadata {
            return Some(metadata.clone());
        }
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => Some(format!("{} - {}", artist, title)),
            (Some(artist), None) => Some(artist.clone()),
            (None, Some(title)) => Some(title.clone()),
            (None, None) => None,
        }
    }

    /// Substitute placeholders in `program`.
    pub fn render(&self, program: &str) -> String {
        let metadata = self.metadata();
        let values = [
            (TRACK_PLACEHOLDER, self.track.as_deref()),
            (METADATA_PLACEHOLDER, metadata.as_deref()),
            (ARTIST_PLACEHOLDER, self.artist.as_deref()),
            (TITLE_PLACEHOLDER, self.title.as_deref()),
            (STREAM_PLACEHOLDER, self.stream.as_deref()),
        ];

        let mut result = program.to_string();
        for (placeholder, value) in values {
            if let Some(value) = value {
                result = replace_first(&result, placeholder, value);
            }
        }
        tracing::trace!("Rendered command: {}", result);
        result
    }
}

/// First decoder whose extension list matches `track` (case-insensitive).
pub fn select_decoder<'a>(decoders: &'a [DecoderConfig], track: &Path) -> Option<&'a DecoderConfig> {
    let name = track.to_string_lossy();
    decoders
        .iter()
        .find(|d| d.file_ext.iter().any(|ext| suffix_equals_ignore_case(&name, ext)))
}
