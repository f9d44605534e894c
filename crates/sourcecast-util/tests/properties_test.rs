//! Behavioral checks across the public API.

use sourcecast_util::{
    parse_stream_url, replace_first, shell_quote, suffix_equals, suffix_equals_ignore_case,
    transcode, ConversionMode, UrlError,
};

const MODES: [ConversionMode; 3] = [
    ConversionMode::Transliterate,
    ConversionMode::Ignore,
    ConversionMode::ReplaceWithPlaceholder,
];

const PAIRS: [(&str, &str); 5] = [
    ("UTF-8", "ISO-8859-1"),
    ("ISO-8859-1", "UTF-8"),
    ("UTF-8", "ASCII"),
    ("SHIFT_JIS", "UTF-8"),
    ("UTF-8", "KOI8-R"),
];

#[test]
fn empty_and_missing_input_yield_empty_output() {
    for (from, to) in PAIRS {
        for mode in MODES {
            assert!(transcode(Some(b""), from, to, mode).is_empty(), "{from}->{to} {mode}");
            assert!(transcode(None, from, to, mode).is_empty(), "{from}->{to} {mode}");
        }
    }
}

#[test]
fn lossy_round_trip_keeps_representable_text() {
    let original = "Sigur R\u{f3}s \u{2013} Hoppipolla";
    let latin1 = transcode(
        Some(original.as_bytes()),
        "UTF-8",
        "ISO-8859-1",
        ConversionMode::Ignore,
    );
    let back = transcode(Some(&latin1), "ISO-8859-1", "UTF-8", ConversionMode::Ignore);
    // ISO-8859-1 has no en dash, so only that character is lost.
    assert_eq!(String::from_utf8(back).unwrap(), "Sigur R\u{f3}s  Hoppipolla");

    let ascii = transcode(Some(original.as_bytes()), "UTF-8", "ASCII", ConversionMode::Ignore);
    assert_eq!(ascii, b"Sigur Rs  Hoppipolla");
}

#[test]
fn placeholder_output_never_exceeds_one_byte_per_rejected_input_byte() {
    let input = "\u{65e5}\u{672c}\u{8a9e} text";
    let out = transcode(
        Some(input.as_bytes()),
        "UTF-8",
        "ISO-8859-1",
        ConversionMode::ReplaceWithPlaceholder,
    );
    assert_eq!(out, b"????????? text");
}

#[test]
fn string_helpers() {
    assert!(suffix_equals("example.mp3", ".mp3"));
    assert!(!suffix_equals(".mp3", "example.mp3"));
    assert!(suffix_equals_ignore_case("EXAMPLE.MP3", ".mp3"));
    assert_eq!(shell_quote("it's"), r"'it\'s'");
    assert_eq!(replace_first("foo {X} bar", "{X}", "it's"), r"foo 'it\'s' bar");
}

#[test]
fn stream_urls() {
    let url = parse_stream_url("http://host.example:8000/mount").unwrap();
    assert_eq!(
        (url.host.as_str(), url.port, url.mount.as_str()),
        ("host.example", 8000, "/mount")
    );
    assert_eq!(
        parse_stream_url("ftp://host:8000/mount"),
        Err(UrlError::InvalidScheme)
    );
    assert!(matches!(
        parse_stream_url("http://host:99999/mount"),
        Err(UrlError::InvalidPort { .. })
    ));
    assert_eq!(
        parse_stream_url("http://host:8000"),
        Err(UrlError::MalformedMount)
    );
}
