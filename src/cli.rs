use clap::{Parser, Subcommand};
use sourcecast_util::ConversionMode;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sourcecast")]
#[command(author, version, about = "Source client utilities for Icecast streaming")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write the process id to this file (overrides the config)
    #[arg(long, global = true)]
    pub pid_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert text on stdin from the locale codeset to UTF-8
    ToUtf8 {
        /// Handling of unconvertible characters: transliterate, ignore or replace
        #[arg(short, long)]
        mode: Option<ConversionMode>,
    },

    /// Convert UTF-8 text on stdin to the locale codeset
    FromUtf8 {
        /// Handling of unconvertible characters: transliterate, ignore or replace
        #[arg(short, long)]
        mode: Option<ConversionMode>,
    },

    /// Print the codeset of the current locale
    Codeset,

    /// Quote text for use as a single shell argument
    Quote {
        /// Text to quote
        text: String,
    },

    /// Replace the first occurrence of a placeholder with a quoted value
    Replace {
        /// Command line containing the placeholder
        source: String,

        /// Placeholder to replace
        needle: String,

        /// Value to substitute
        value: String,
    },

    /// Split a stream URL into host, port and mountpoint
    ParseUrl {
        /// URL in http://host:port/mount form
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the decoder command for a track
    Decoder {
        /// Track to decode
        #[arg(required = true)]
        file: PathBuf,

        /// Artist, in the locale codeset
        #[arg(long)]
        artist: Option<OsString>,

        /// Title, in the locale codeset
        #[arg(long)]
        title: Option<OsString>,

        /// Stream name
        #[arg(long)]
        stream: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
