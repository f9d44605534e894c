use serde::{Deserialize, Serialize};
use sourcecast_util::{parse_stream_url, ConversionMode, StreamUrl, UrlError};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Where to record the process id (removed at exit)
    #[serde(default)]
    pub pid_file: Option<PathBuf>,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub streams: Vec<StreamConfig>,

    #[serde(default)]
    pub decoders: Vec<DecoderConfig>,

    #[serde(default)]
    pub encoders: Vec<EncoderConfig>,
}

impl Config {
    /// Look up an encoder by name.
    pub fn encoder(&self, name: &str) -> Option<&EncoderConfig> {
        self.encoders.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// How characters missing from the target charset are handled
    #[serde(default)]
    pub charset_mode: ConversionMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    pub name: String,

    /// Server address in `http://host:port/mount` form
    pub url: String,

    pub format: StreamFormat,

    /// List the stream in public directories
    #[serde(default)]
    pub public: bool,

    /// Name of the `[[encoders]]` entry feeding this stream
    #[serde(default)]
    pub encoder: Option<String>,

    #[serde(default)]
    pub stream_name: Option<String>,

    #[serde(default)]
    pub stream_url: Option<String>,

    #[serde(default)]
    pub stream_genre: Option<String>,

    #[serde(default)]
    pub stream_description: Option<String>,

    #[serde(default)]
    pub stream_quality: Option<String>,

    #[serde(default)]
    pub stream_bitrate: Option<u32>,

    #[serde(default)]
    pub stream_samplerate: Option<u32>,

    #[serde(default)]
    pub stream_channels: Option<u8>,
}

impl StreamConfig {
    /// Parse the configured server address.
    pub fn endpoint(&self) -> Result<StreamUrl, UrlError> {
        parse_stream_url(&self.url)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecoderConfig {
    pub name: String,

    /// Shell command; `@T@` is replaced with the quoted track path
    pub program: String,

    /// File extensions handled by this decoder, including the dot
    #[serde(default)]
    pub file_ext: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    pub name: String,

    /// Shell command reading raw audio on stdin
    pub program: String,

    pub format: StreamFormat,
}

/// Audio/video format sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum StreamFormat {
    Vorbis,
    Mp3,
    Theora,
    Aac,
}

impl StreamFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vorbis => "VORBIS",
            Self::Mp3 => "MP3",
            Self::Theora => "THEORA",
            Self::Aac => "AAC",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreamFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VORBIS" => Ok(Self::Vorbis),
            "MP3" => Ok(Self::Mp3),
            "THEORA" => Ok(Self::Theora),
            "AAC" => Ok(Self::Aac),
            _ => Err(format!("Unknown stream format: {}", s)),
        }
    }
}

impl TryFrom<String> for StreamFormat {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StreamFormat> for String {
    fn from(format: StreamFormat) -> Self {
        format.as_str().to_string()
    }
}
