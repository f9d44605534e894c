//! Charset registry and the default converter backend.
//!
//! Charsets are looked up by iconv-style names. Anything the WHATWG Encoding
//! Standard knows is served by `encoding_rs`. Plain 7-bit ASCII (the codeset of
//! the C locale) and ISO-8859-1 are handled natively because WHATWG aliases
//! both to windows-1252.

use std::io;

use encoding_rs::{Decoder, DecoderResult, Encoder, EncoderResult, Encoding};

use super::translit::transliterate;
use super::{Converter, ConverterFactory, Step, StepStatus, NATIVE_CHARSET};
use crate::error::TranscodeError;

/// Names of the C locale codeset and its usual aliases.
const ASCII_ALIASES: &[&str] = &[
    "ANSI_X3.4-1968",
    "ANSI_X3.4-1986",
    "ASCII",
    "US-ASCII",
    "US",
    "ISO646-US",
    "ISO_646.IRV:1991",
    "646",
    "CP367",
    "IBM367",
];

/// Names of ISO-8859-1, where every byte is the code point of the same value.
const LATIN1_ALIASES: &[&str] = &[
    "ISO-8859-1",
    "ISO_8859-1",
    "ISO_8859-1:1987",
    "ISO8859-1",
    "ISO88591",
    "8859_1",
    "ISO-IR-100",
    "LATIN1",
    "L1",
    "IBM819",
    "CP819",
    "CSISOLATIN1",
];

/// Output space reserved before starting a new input unit.
///
/// Covers one decoded unit (at most two characters) in any supported target,
/// including stateful escape sequences and multi-character transliterations.
const MAX_UNIT_OUTPUT: usize = 32;

/// Scratch space for the characters one input byte can complete.
const DECODE_SCRATCH: usize = 64;

/// A character encoding known to the default backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// 7-bit US-ASCII.
    Ascii,
    /// ISO-8859-1, mapping bytes to U+0000..=U+00FF.
    Latin1,
    /// An encoding from the WHATWG Encoding Standard.
    Web(&'static Encoding),
}

impl Charset {
    /// Resolve an iconv-style charset name.
    ///
    /// Returns `None` for unknown names and for the empty name, which only a
    /// [`CharsetFactory`] can resolve.
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        if ASCII_ALIASES.iter().any(|a| a.eq_ignore_ascii_case(label)) {
            return Some(Self::Ascii);
        }
        if LATIN1_ALIASES.iter().any(|a| a.eq_ignore_ascii_case(label)) {
            return Some(Self::Latin1);
        }
        Encoding::for_label(label.as_bytes()).map(Self::Web)
    }

    /// Canonical name of the charset.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Web(encoding) => encoding.name(),
        }
    }

    /// Whether text can be converted into this charset.
    ///
    /// UTF-16 and the WHATWG "replacement" encoding decode only.
    pub fn can_encode(&self) -> bool {
        match self {
            Self::Ascii | Self::Latin1 => true,
            Self::Web(encoding) => encoding.output_encoding() == *encoding,
        }
    }

    fn decoder(&self) -> CharDecoder {
        match self {
            Self::Ascii => CharDecoder::Ascii,
            Self::Latin1 => CharDecoder::Latin1,
            Self::Web(encoding) => CharDecoder::Web(encoding.new_decoder_without_bom_handling()),
        }
    }

    fn encoder(&self) -> CharEncoder {
        match self {
            Self::Ascii => CharEncoder::Ascii,
            Self::Latin1 => CharEncoder::Latin1,
            Self::Web(encoding) => CharEncoder::Web(encoding.new_encoder()),
        }
    }
}

/// Qualifiers parsed from a `NAME//TRANSLIT//IGNORE` style charset name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub translit: bool,
    pub ignore: bool,
}

/// Split a qualified charset name into the bare name and its qualifiers.
///
/// Unknown qualifiers are dropped.
pub fn split_qualified(name: &str) -> (&str, Qualifiers) {
    let mut parts = name.split("//");
    let label = parts.next().unwrap_or_default();
    let mut qualifiers = Qualifiers::default();
    for part in parts {
        if part.eq_ignore_ascii_case("TRANSLIT") {
            qualifiers.translit = true;
        } else if part.eq_ignore_ascii_case("IGNORE") {
            qualifiers.ignore = true;
        }
    }
    (label, qualifiers)
}

/// Converter factory backed by [`Charset`].
#[derive(Debug, Clone, Copy)]
pub struct CharsetFactory {
    native: Charset,
}

impl CharsetFactory {
    /// Factory whose native charset is US-ASCII, the codeset of the minimal
    /// "C" locale.
    pub fn new() -> Self {
        Self {
            native: Charset::Ascii,
        }
    }

    /// Factory with a different native charset. Returns `None` if `label` is
    /// unknown.
    pub fn with_native(label: &str) -> Option<Self> {
        Charset::for_label(label).map(|native| Self { native })
    }

    /// Charset used for the empty name.
    pub fn native(&self) -> Charset {
        self.native
    }

    fn resolve(&self, label: &str) -> Option<Charset> {
        if label.trim() == NATIVE_CHARSET {
            Some(self.native)
        } else {
            Charset::for_label(label)
        }
    }
}

impl Default for CharsetFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterFactory for CharsetFactory {
    fn open(&self, from: &str, to: &str) -> Result<Box<dyn Converter>, TranscodeError> {
        let (from_label, _) = split_qualified(from);
        let (to_label, qualifiers) = split_qualified(to);

        let source = self
            .resolve(from_label)
            .ok_or_else(|| TranscodeError::unsupported(from, to))?;
        let target = self
            .resolve(to_label)
            .filter(Charset::can_encode)
            .ok_or_else(|| TranscodeError::unsupported(from, to))?;

        tracing::trace!(
            "Opened converter {} -> {} ({:?})",
            source.name(),
            target.name(),
            qualifiers
        );
        Ok(Box::new(CharsetConverter::new(source, target, qualifiers)))
    }
}

enum Decoded {
    /// Number of UTF-8 bytes produced. Zero while a sequence is incomplete and
    /// for input that only changes decoder state, such as escape sequences.
    Chars(usize),
    /// The malformed sequence starts `rewind` bytes before the end of `src`.
    Malformed { rewind: usize },
}

enum CharDecoder {
    Ascii,
    Latin1,
    Web(Decoder),
}

impl CharDecoder {
    fn decode(&mut self, src: &[u8], dst: &mut [u8], last: bool) -> Decoded {
        match self {
            Self::Ascii => match src.first() {
                None => Decoded::Chars(0),
                Some(&b) if b.is_ascii() => {
                    dst[0] = b;
                    Decoded::Chars(1)
                }
                Some(_) => Decoded::Malformed { rewind: 1 },
            },
            Self::Latin1 => match src.first() {
                None => Decoded::Chars(0),
                Some(&b) => Decoded::Chars(char::from(b).encode_utf8(dst).len()),
            },
            Self::Web(decoder) => {
                let (result, read, written) = decoder.decode_to_utf8_without_replacement(src, dst, last);
                let unread = src.len() - read;
                match result {
                    DecoderResult::InputEmpty => Decoded::Chars(written),
                    DecoderResult::Malformed(bad, extra) => Decoded::Malformed {
                        rewind: unread + usize::from(bad) + usize::from(extra),
                    },
                    // The scratch buffer outsizes any single-byte expansion.
                    DecoderResult::OutputFull => Decoded::Malformed { rewind: unread.max(1) },
                }
            }
        }
    }
}

enum Encoded {
    Written(usize),
    Unmappable,
    OutputFull,
}

enum CharEncoder {
    Ascii,
    Latin1,
    Web(Encoder),
}

impl CharEncoder {
    fn encode(&mut self, text: &str, dst: &mut [u8]) -> Encoded {
        match self {
            Self::Ascii => {
                if !text.is_ascii() {
                    return Encoded::Unmappable;
                }
                if text.len() > dst.len() {
                    return Encoded::OutputFull;
                }
                dst[..text.len()].copy_from_slice(text.as_bytes());
                Encoded::Written(text.len())
            }
            Self::Latin1 => {
                let mut n = 0;
                for c in text.chars() {
                    let Ok(b) = u8::try_from(u32::from(c)) else {
                        return Encoded::Unmappable;
                    };
                    if n == dst.len() {
                        return Encoded::OutputFull;
                    }
                    dst[n] = b;
                    n += 1;
                }
                Encoded::Written(n)
            }
            Self::Web(encoder) => {
                let (result, _, written) = encoder.encode_from_utf8_without_replacement(text, dst, false);
                match result {
                    EncoderResult::InputEmpty => Encoded::Written(written),
                    EncoderResult::Unmappable(_) => Encoded::Unmappable,
                    EncoderResult::OutputFull => Encoded::OutputFull,
                }
            }
        }
    }

    /// Return a stateful encoder to its initial state.
    fn finish(&mut self, dst: &mut [u8]) -> usize {
        match self {
            Self::Ascii | Self::Latin1 => 0,
            Self::Web(encoder) => {
                let (_, _, written) = encoder.encode_from_utf8_without_replacement("", dst, true);
                written
            }
        }
    }
}

/// Converter between two [`Charset`]s.
///
/// Input is decoded one byte at a time so every emitted character can be
/// traced back to the input that produced it. A unit ends where a character
/// was emitted; bytes that only change decoder state (escape sequences, the
/// lead bytes of a multi-byte character) belong to the unit in progress.
/// Malformed input is located from the decoder's own report, so a valid
/// state change before it is never rejected. Decoder state is discarded
/// whenever input is rejected; the engine re-feeds input after the skipped
/// byte.
pub struct CharsetConverter {
    source: Charset,
    target: Charset,
    decoder: CharDecoder,
    encoder: CharEncoder,
    qualifiers: Qualifiers,
}

impl CharsetConverter {
    pub fn new(source: Charset, target: Charset, qualifiers: Qualifiers) -> Self {
        Self {
            source,
            target,
            decoder: source.decoder(),
            encoder: target.encoder(),
            qualifiers,
        }
    }

    fn reset_decoder(&mut self) {
        self.decoder = self.source.decoder();
    }

    /// Encode `text` for a character the target cannot represent.
    ///
    /// Returns `None` when the character must be reported to the caller.
    fn substitute(&mut self, c: char, dst: &mut [u8]) -> Option<usize> {
        if self.qualifiers.translit {
            if let Some(approx) = transliterate(c) {
                if let Encoded::Written(n) = self.encoder.encode(approx, dst) {
                    return Some(n);
                }
            }
            return match self.encoder.encode("?", dst) {
                Encoded::Written(n) => Some(n),
                _ => Some(0),
            };
        }
        if self.qualifiers.ignore {
            return Some(0);
        }
        None
    }
}

impl Converter for CharsetConverter {
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Step {
        let mut scratch = [0u8; DECODE_SCRATCH];
        let mut read = 0;
        let mut written = 0;
        let mut unit_start = 0;
        let mut unit_written = 0;

        while read < input.len() {
            if unit_start == read && output.len() - written < MAX_UNIT_OUTPUT {
                return Step::new(read, written, StepStatus::OutputFull);
            }

            let n = match self.decoder.decode(&input[read..read + 1], &mut scratch, false) {
                Decoded::Chars(n) => n,
                Decoded::Malformed { rewind } => {
                    self.reset_decoder();
                    written = unit_written;
                    let bad_start = (read + 1).saturating_sub(rewind).max(unit_start);
                    if self.qualifiers.ignore {
                        read = bad_start + 1;
                        unit_start = read;
                        continue;
                    }
                    return Step::new(bad_start, written, StepStatus::Invalid);
                }
            };
            read += 1;
            if n == 0 {
                continue;
            }

            let Ok(text) = std::str::from_utf8(&scratch[..n]) else {
                self.reset_decoder();
                return Step::new(unit_start, unit_written, StepStatus::Invalid);
            };
            for c in text.chars() {
                let mut utf8 = [0u8; 4];
                match self.encoder.encode(c.encode_utf8(&mut utf8), &mut output[written..]) {
                    Encoded::Written(k) => written += k,
                    Encoded::Unmappable => match self.substitute(c, &mut output[written..]) {
                        Some(k) => written += k,
                        None => {
                            self.reset_decoder();
                            return Step::new(unit_start, unit_written, StepStatus::Invalid);
                        }
                    },
                    Encoded::OutputFull => {
                        self.reset_decoder();
                        return Step::new(unit_start, unit_written, StepStatus::OutputFull);
                    }
                }
            }
            unit_start = read;
            unit_written = written;
        }

        // End of text: only the decoder knows whether bytes are still pending.
        let trailing = self.decoder.decode(&[], &mut scratch, true);
        self.reset_decoder();
        if let Decoded::Malformed { rewind } = trailing {
            if !self.qualifiers.ignore {
                let bad_start = input.len().saturating_sub(rewind).max(unit_start);
                return Step::new(bad_start, unit_written, StepStatus::Incomplete);
            }
            written = unit_written;
        }
        written += self.encoder.finish(&mut output[written..]);
        self.encoder = self.target.encoder();
        Step::new(input.len(), written, StepStatus::Complete)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(from: &str, to: &str, input: &[u8]) -> (Vec<u8>, Step) {
        let mut conv = CharsetFactory::new().open(from, to).unwrap();
        let mut out = [0u8; 256];
        let step = conv.convert(input, &mut out);
        (out[..step.written].to_vec(), step)
    }

    #[test]
    fn test_for_label() {
        assert_eq!(Charset::for_label("ANSI_X3.4-1968"), Some(Charset::Ascii));
        assert_eq!(Charset::for_label("us-ascii"), Some(Charset::Ascii));
        assert_eq!(
            Charset::for_label("UTF-8"),
            Some(Charset::Web(encoding_rs::UTF_8))
        );
        assert_eq!(Charset::for_label("ISO-8859-1"), Some(Charset::Latin1));
        assert_eq!(Charset::for_label("latin1"), Some(Charset::Latin1));
        assert_eq!(
            Charset::for_label("windows-1252").map(|c| c.name()),
            Some("windows-1252")
        );
        assert_eq!(Charset::for_label("NOT-A-CHARSET"), None);
        assert_eq!(Charset::for_label(""), None);
    }

    #[test]
    fn test_can_encode() {
        assert!(Charset::Ascii.can_encode());
        assert!(Charset::for_label("utf-8").unwrap().can_encode());
        assert!(!Charset::for_label("utf-16le").unwrap().can_encode());
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("UTF-8"), ("UTF-8", Qualifiers::default()));
        let (label, q) = split_qualified("ASCII//TRANSLIT");
        assert_eq!(label, "ASCII");
        assert!(q.translit && !q.ignore);
        let (label, q) = split_qualified("ASCII//translit//IGNORE");
        assert_eq!(label, "ASCII");
        assert!(q.translit && q.ignore);
        let (label, q) = split_qualified("//IGNORE");
        assert_eq!(label, "");
        assert!(q.ignore);
    }

    #[test]
    fn test_factory_native_and_unsupported() {
        let factory = CharsetFactory::new();
        assert_eq!(factory.native(), Charset::Ascii);
        assert!(factory.open("", "UTF-8").is_ok());
        assert!(factory.open("UTF-8", "bogus").is_err());
        assert!(factory.open("UTF-8", "UTF-16LE").is_err());
        assert!(factory.open("UTF-16LE", "UTF-8").is_ok());

        let latin = CharsetFactory::with_native("latin1").unwrap();
        assert_eq!(latin.native().name(), "ISO-8859-1");
        assert!(CharsetFactory::with_native("bogus").is_none());
    }

    #[test]
    fn test_latin1_to_utf8() {
        let (out, step) = run("ISO-8859-1", "UTF-8", b"caf\xe9");
        assert_eq!(out, "café".as_bytes());
        assert_eq!(step.read, 4);
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[test]
    fn test_utf8_to_latin1() {
        let (out, step) = run("UTF-8", "ISO-8859-1", "café".as_bytes());
        assert_eq!(out, b"caf\xe9");
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[test]
    fn test_unmappable_reports_unit_start() {
        let (out, step) = run("UTF-8", "ASCII", "ab\u{e9}cd".as_bytes());
        assert_eq!(out, b"ab");
        assert_eq!(step.read, 2);
        assert_eq!(step.status, StepStatus::Invalid);
    }

    #[test]
    fn test_malformed_reports_unit_start() {
        let (out, step) = run("UTF-8", "UTF-8", b"ok\xffrest");
        assert_eq!(out, b"ok");
        assert_eq!(step.read, 2);
        assert_eq!(step.status, StepStatus::Invalid);
    }

    #[test]
    fn test_truncated_sequence_is_incomplete() {
        let (out, step) = run("UTF-8", "UTF-8", b"ab\xc3");
        assert_eq!(out, b"ab");
        assert_eq!(step.read, 2);
        assert_eq!(step.status, StepStatus::Incomplete);
    }

    #[test]
    fn test_ignore_drops_silently() {
        let (out, step) = run("UTF-8", "ASCII//IGNORE", "a\u{e9}b\u{65e5}c".as_bytes());
        assert_eq!(out, b"abc");
        assert_eq!(step.status, StepStatus::Complete);

        let (out, _) = run("UTF-8", "UTF-8//IGNORE", b"a\xffb\xc3");
        assert_eq!(out, b"ab");
    }

    #[test]
    fn test_translit_approximates() {
        let (out, step) = run("UTF-8", "ASCII//TRANSLIT", "na\u{ef}ve \u{2014} \u{65e5}".as_bytes());
        assert_eq!(out, b"naive - ?");
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[test]
    fn test_output_full_at_unit_boundary() {
        let mut conv = CharsetFactory::new().open("UTF-8", "UTF-8").unwrap();
        let input = [b'x'; 100];
        let mut out = [0u8; MAX_UNIT_OUTPUT + 10];
        let step = conv.convert(&input, &mut out);
        assert_eq!(step.status, StepStatus::OutputFull);
        assert_eq!(step.read, 11);
        assert_eq!(step.written, 11);
    }

    #[test]
    fn test_shift_jis_to_utf8() {
        let (out, _) = run("SHIFT_JIS", "UTF-8", &[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA]);
        assert_eq!(out, "日本語".as_bytes());
    }

    #[test]
    fn test_stateful_target_returns_to_ascii() {
        let (out, step) = run("UTF-8", "ISO-2022-JP", "日本".as_bytes());
        assert_eq!(step.status, StepStatus::Complete);
        assert!(out.starts_with(b"\x1b$B"));
        assert!(out.ends_with(b"\x1b(B"));
    }

    #[test]
    fn test_stateful_source_ends_in_ascii() {
        let (out, step) = run("ISO-2022-JP", "UTF-8", b"\x1b$B\x46\x7c\x1b(B");
        assert_eq!(out, "日".as_bytes());
        assert_eq!(step.read, 7);
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[test]
    fn test_malformed_after_escape_keeps_escape() {
        // The escape back to ASCII is valid; only the byte after it is rejected.
        let (out, step) = run("ISO-2022-JP", "UTF-8", b"\x1b$B\x46\x7c\x1b(B\xff");
        assert_eq!(out, "日".as_bytes());
        assert_eq!(step.read, 7);
        assert_eq!(step.status, StepStatus::Invalid);
    }

    #[test]
    fn test_truncated_escape_is_incomplete() {
        let (out, step) = run("ISO-2022-JP", "UTF-8", b"ab\x1b$");
        assert_eq!(out, b"ab");
        assert_eq!(step.read, 2);
        assert_eq!(step.status, StepStatus::Incomplete);
    }

    #[test]
    fn test_latin1_is_byte_for_code_point() {
        let (out, step) = run("ISO-8859-1", "UTF-8", b"\x80\x96\xff");
        assert_eq!(out, "\u{80}\u{96}\u{ff}".as_bytes());
        assert_eq!(step.status, StepStatus::Complete);

        let (out, step) = run("UTF-8", "LATIN1", "\u{80}\u{ff}".as_bytes());
        assert_eq!(out, b"\x80\xff");
        assert_eq!(step.status, StepStatus::Complete);
    }

    #[test]
    fn test_latin1_rejects_beyond_ff() {
        let (out, step) = run("UTF-8", "ISO-8859-1", "a\u{2013}b".as_bytes());
        assert_eq!(out, b"a");
        assert_eq!(step.read, 1);
        assert_eq!(step.status, StepStatus::Invalid);

        let (out, _) = run("UTF-8", "ISO-8859-1//TRANSLIT", "a\u{2013}b\u{20ac}".as_bytes());
        assert_eq!(out, b"a-bEUR");
    }
}
