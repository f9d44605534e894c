//! Charset transcoding engine.
//!
//! [`Transcoder::transcode`] converts a byte string between two charsets
//! through a fixed-size chunk buffer, appending each chunk to an
//! [`OutputBuffer`]. Characters the converter rejects are replaced with `?`
//! one input byte at a time, so a conversion always runs to completion.
//!
//! Converter handles come from a [`ConverterFactory`]. Opening falls back in
//! three steps: the exact pair, then source to native charset, then native
//! charset to target. When nothing opens, the original text is returned
//! unchanged.

mod charset;
mod translit;

pub use charset::{split_qualified, Charset, CharsetConverter, CharsetFactory, Qualifiers};
pub use translit::transliterate;

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::buffer::OutputBuffer;
use crate::error::TranscodeError;

/// Size of the scratch buffer each converter call writes into.
pub const CHUNK_SIZE: usize = 1024;

/// Charset name that selects the factory's native charset.
pub const NATIVE_CHARSET: &str = "";

/// Byte emitted for each input unit that cannot be converted.
pub const PLACEHOLDER: u8 = b'?';

/// How characters without a target representation are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConversionMode {
    /// Substitute a similar-looking character where one is known.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "translit"))]
    Transliterate,
    /// Drop the character.
    Ignore,
    /// Emit `?` for every unconvertible input byte.
    #[cfg_attr(feature = "serde", serde(rename = "replace"))]
    ReplaceWithPlaceholder,
}

impl ConversionMode {
    /// Qualify a target charset name for this mode.
    pub fn qualify(&self, target: &str) -> String {
        match self {
            Self::Transliterate => format!("{target}//TRANSLIT"),
            Self::Ignore => format!("{target}//IGNORE"),
            Self::ReplaceWithPlaceholder => target.to_string(),
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transliterate => "transliterate",
            Self::Ignore => "ignore",
            Self::ReplaceWithPlaceholder => "replace",
        };
        f.write_str(s)
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transliterate" | "translit" => Ok(Self::Transliterate),
            "ignore" => Ok(Self::Ignore),
            "replace" | "placeholder" => Ok(Self::ReplaceWithPlaceholder),
            other => Err(format!("unknown conversion mode: {other}")),
        }
    }
}

/// Why a converter call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// All input was consumed.
    Complete,
    /// The output slice filled up; call again with the remaining input.
    OutputFull,
    /// The unit at `read` cannot be converted.
    Invalid,
    /// The input ends inside a multi-byte sequence starting at `read`.
    Incomplete,
}

/// Outcome of one [`Converter::convert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Input bytes consumed.
    pub read: usize,
    /// Output bytes produced.
    pub written: usize,
    pub status: StepStatus,
}

impl Step {
    pub fn new(read: usize, written: usize, status: StepStatus) -> Self {
        Self {
            read,
            written,
            status,
        }
    }
}

/// An open conversion session for one charset pair.
pub trait Converter {
    /// Convert as much of `input` as fits into `output`.
    ///
    /// `input` always extends to the end of the text being converted.
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Step;

    /// Release the session.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Source of converter sessions.
pub trait ConverterFactory {
    /// Open a converter from charset `from` to charset `to`.
    ///
    /// `to` may carry `//TRANSLIT` or `//IGNORE` qualifiers; the empty name
    /// stands for the native charset.
    fn open(&self, from: &str, to: &str) -> Result<Box<dyn Converter>, TranscodeError>;
}

/// Transcoding engine over a converter factory.
#[derive(Debug, Clone, Default)]
pub struct Transcoder<F = CharsetFactory> {
    factory: F,
}

impl Transcoder {
    /// Engine over the default charset backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: ConverterFactory> Transcoder<F> {
    pub fn with_factory(factory: F) -> Self {
        Self { factory }
    }

    /// Convert `input` from charset `from` to charset `to`.
    ///
    /// `None` yields an empty result. If no converter can be opened, or the
    /// converter fails to close, the original bytes are returned.
    pub fn transcode(
        &self,
        input: Option<&[u8]>,
        from: &str,
        to: &str,
        mode: ConversionMode,
    ) -> Vec<u8> {
        let Some(input) = input else {
            return Vec::new();
        };

        let tocode = mode.qualify(to);
        let mut converter = match self.open(from, &tocode) {
            Ok(converter) => converter,
            Err(e) => {
                tracing::error!("Cannot convert {:?} to {:?}: {}", from, tocode, e);
                return input.to_vec();
            }
        };

        let output = run(converter.as_mut(), input);

        if let Err(e) = converter.close() {
            tracing::error!("{}", TranscodeError::Close(e));
            return input.to_vec();
        }

        output.into_vec()
    }

    fn open(&self, from: &str, tocode: &str) -> Result<Box<dyn Converter>, TranscodeError> {
        let attempts = [
            (from, tocode),
            (from, NATIVE_CHARSET),
            (NATIVE_CHARSET, tocode),
        ];

        let mut last_err = None;
        for (tier, (src, dst)) in attempts.into_iter().enumerate() {
            match self.factory.open(src, dst) {
                Ok(converter) => {
                    if tier > 0 {
                        tracing::debug!(
                            "Falling back to converter {:?} -> {:?} for {:?} -> {:?}",
                            src,
                            dst,
                            from,
                            tocode
                        );
                    }
                    return Ok(converter);
                }
                Err(e) => {
                    tracing::trace!("Converter {:?} -> {:?} unavailable: {}", src, dst, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| TranscodeError::unsupported(from, tocode)))
    }
}

/// Drive `converter` over `input` until every byte is consumed.
fn run(converter: &mut dyn Converter, input: &[u8]) -> OutputBuffer {
    let mut output = OutputBuffer::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut pos = 0;

    while pos < input.len() {
        let remaining = &input[pos..];
        // The last chunk byte stays free for a placeholder.
        let step = converter.convert(remaining, &mut chunk[..CHUNK_SIZE - 1]);
        let read = step.read.min(remaining.len());
        let mut written = step.written.min(CHUNK_SIZE - 1);

        let skip = match step.status {
            StepStatus::Invalid | StepStatus::Incomplete => true,
            // No input consumed: treat the unit as unconvertible so the
            // loop still advances.
            StepStatus::Complete | StepStatus::OutputFull => read == 0,
        };

        let mut advance = read;
        if skip {
            chunk[written] = PLACEHOLDER;
            written += 1;
            advance += 1;
        }

        output.append(&chunk[..written]);
        pos = (pos + advance).min(input.len());
    }

    output
}

/// Convert `input` with the default charset backend.
///
/// See [`Transcoder::transcode`].
pub fn transcode(input: Option<&[u8]>, from: &str, to: &str, mode: ConversionMode) -> Vec<u8> {
    Transcoder::new().transcode(input, from, to, mode)
}
