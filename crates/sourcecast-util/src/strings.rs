//! String helpers for building external command lines.
//!
//! Suffix comparison is used to match track files against decoder
//! extensions; [`shell_quote`] and [`replace_first`] build the shell command
//! lines for decoders and encoders.

/// Longest input [`shell_quote`] will process, in bytes.
pub const SHELL_QUOTE_MAX_INPUT: usize = 8191;

/// Whether the trailing bytes of `subject` equal `suffix`.
///
/// # Examples
///
/// ```
/// use sourcecast_util::strings::suffix_equals;
///
/// assert!(suffix_equals("example.mp3", ".mp3"));
/// assert!(!suffix_equals(".mp3", "example.mp3"));
/// ```
pub fn suffix_equals(subject: &str, suffix: &str) -> bool {
    let subject = subject.as_bytes();
    let suffix = suffix.as_bytes();
    if suffix.len() > subject.len() {
        return false;
    }
    &subject[subject.len() - suffix.len()..] == suffix
}

/// ASCII case-insensitive [`suffix_equals`].
///
/// # Examples
///
/// ```
/// use sourcecast_util::strings::suffix_equals_ignore_case;
///
/// assert!(suffix_equals_ignore_case("EXAMPLE.MP3", ".mp3"));
/// ```
pub fn suffix_equals_ignore_case(subject: &str, suffix: &str) -> bool {
    let subject = subject.to_ascii_lowercase();
    let suffix = suffix.to_ascii_lowercase();
    suffix_equals(&subject, &suffix)
}

/// Wrap `input` in single quotes, escaping `'` and `\` with a backslash.
///
/// Input beyond [`SHELL_QUOTE_MAX_INPUT`] bytes is cut off (at the preceding
/// character boundary) and a warning is logged.
///
/// # Examples
///
/// ```
/// use sourcecast_util::strings::shell_quote;
///
/// assert_eq!(shell_quote("it's"), r"'it\'s'");
/// ```
pub fn shell_quote(input: &str) -> String {
    let input = truncate_to_boundary(input, SHELL_QUOTE_MAX_INPUT);
    let mut out = String::with_capacity(input.len() * 2 + 3);

    out.push('\'');
    for c in input.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn truncate_to_boundary(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }
    let mut end = max;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(
        "Shell argument truncated from {} to {} bytes",
        input.len(),
        end
    );
    &input[..end]
}

/// Replace the first occurrence of `needle` in `source` with the
/// shell-quoted `replacement`.
///
/// `source` is returned unchanged when `needle` does not occur. The
/// replacement is quoted either way.
///
/// # Examples
///
/// ```
/// use sourcecast_util::strings::replace_first;
///
/// assert_eq!(replace_first("foo {X} bar", "{X}", "it's"), r"foo 'it\'s' bar");
/// ```
pub fn replace_first(source: &str, needle: &str, replacement: &str) -> String {
    let quoted = shell_quote(replacement);

    match source.find(needle) {
        Some(idx) => {
            let mut dest = String::with_capacity(source.len() + quoted.len());
            dest.push_str(&source[..idx]);
            dest.push_str(&quoted);
            dest.push_str(&source[idx + needle.len()..]);
            dest
        }
        None => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_equals() {
        assert!(suffix_equals("example.mp3", ".mp3"));
        assert!(suffix_equals("example.mp3", ""));
        assert!(suffix_equals(".mp3", ".mp3"));
        assert!(!suffix_equals(".mp3", "example.mp3"));
        assert!(!suffix_equals("example.MP3", ".mp3"));
        assert!(!suffix_equals("example.ogg", ".mp3"));
    }

    #[test]
    fn test_suffix_equals_ignore_case() {
        assert!(suffix_equals_ignore_case("EXAMPLE.MP3", ".mp3"));
        assert!(suffix_equals_ignore_case("example.mp3", ".MP3"));
        assert!(suffix_equals_ignore_case("Track.Ogg", ".oGG"));
        assert!(!suffix_equals_ignore_case(".MP3", "EXAMPLE.MP3"));
        assert!(!suffix_equals_ignore_case("example.flac", ".mp3"));
    }

    #[test]
    fn test_suffix_equals_ignore_case_leaves_operands() {
        let subject = String::from("SONG.MP3");
        let suffix = String::from(".mp3");
        assert!(suffix_equals_ignore_case(&subject, &suffix));
        assert_eq!(subject, "SONG.MP3");
        assert_eq!(suffix, ".mp3");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("it's"), r"'it\'s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote(r"back\slash"), r"'back\\slash'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(shell_quote("Mot\u{f6}rhead"), "'Mot\u{f6}rhead'");
    }

    #[test]
    fn test_shell_quote_truncates() {
        let long = "a".repeat(SHELL_QUOTE_MAX_INPUT + 100);
        let quoted = shell_quote(&long);
        assert_eq!(quoted.len(), SHELL_QUOTE_MAX_INPUT + 2);

        let at_limit = "'".repeat(SHELL_QUOTE_MAX_INPUT);
        assert_eq!(shell_quote(&at_limit).len(), SHELL_QUOTE_MAX_INPUT * 2 + 2);
    }

    #[test]
    fn test_shell_quote_truncates_on_char_boundary() {
        // 8190 ASCII bytes followed by a two-byte character straddling the cap.
        let input = format!("{}\u{e9}tail", "a".repeat(SHELL_QUOTE_MAX_INPUT - 1));
        let quoted = shell_quote(&input);
        assert_eq!(quoted.len(), SHELL_QUOTE_MAX_INPUT - 1 + 2);
        assert!(quoted.ends_with("a'"));
    }

    #[test]
    fn test_replace_first() {
        assert_eq!(replace_first("foo {X} bar", "{X}", "it's"), r"foo 'it\'s' bar");
        assert_eq!(
            replace_first("decode @T@ @T@", "@T@", "a b.mp3"),
            "decode 'a b.mp3' @T@"
        );
        assert_eq!(replace_first("@T@", "@T@", "x"), "'x'");
    }

    #[test]
    fn test_replace_first_no_match() {
        assert_eq!(replace_first("no placeholder", "@T@", "x"), "no placeholder");
    }

    #[test]
    fn test_replace_first_empty_needle() {
        assert_eq!(replace_first("cmd", "", "v"), "'v'cmd");
    }
}
