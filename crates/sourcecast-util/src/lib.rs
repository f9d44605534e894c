//! # sourcecast-util
//!
//! Text and process utilities for the sourcecast streaming client.
//!
//! This crate provides:
//!
//! - **Transcoding**: conversion between charsets through a chunked engine
//!   with transliterate, ignore and placeholder policies, plus the locale
//!   codeset to UTF-8 specializations
//! - **String helpers**: suffix comparison and shell quoting for building
//!   decoder and encoder command lines
//! - **Stream URLs**: strict `http://host:port/mount` parsing
//! - **Pid files**: a locked pid file removed at process exit
//!
//! ## Features
//!
//! - `serde` - Serialize/deserialize [`ConversionMode`] and [`StreamUrl`]
//!
//! ## Example
//!
//! ```
//! use sourcecast_util::{shell_quote, transcode, ConversionMode};
//!
//! let latin1 = transcode(
//!     Some("Motörhead".as_bytes()),
//!     "UTF-8",
//!     "ISO-8859-1",
//!     ConversionMode::ReplaceWithPlaceholder,
//! );
//! assert_eq!(latin1, b"Mot\xf6rhead");
//!
//! assert_eq!(shell_quote("it's"), r"'it\'s'");
//! ```

pub mod buffer;
mod error;
pub mod locale;
pub mod pidfile;
pub mod strings;
pub mod transcode;
pub mod url;

// Re-exports
pub use buffer::OutputBuffer;
pub use error::{PidFileError, TranscodeError, UrlError};
pub use locale::{locale_codeset, locale_to_utf8, utf8_to_locale};
pub use pidfile::{write_pid_file, PidFile};
pub use strings::{replace_first, shell_quote, suffix_equals, suffix_equals_ignore_case};
pub use transcode::{transcode, ConversionMode, Transcoder};
pub use url::{parse_stream_url, StreamUrl};
