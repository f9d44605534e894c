//! Approximations for characters the target charset cannot represent.

/// Best-effort replacement text for `c`, or `None` when no approximation is
/// known.
pub fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        // Punctuation and symbols
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => " ",
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{2022}' | '\u{00B7}' => "o",
        '\u{00AB}' => "<<",
        '\u{00BB}' => ">>",
        '\u{2039}' => "<",
        '\u{203A}' => ">",
        '\u{00A1}' => "!",
        '\u{00BF}' => "?",
        '\u{00A9}' => "(C)",
        '\u{00AE}' => "(R)",
        '\u{2122}' => "(TM)",
        '\u{20AC}' => "EUR",
        '\u{00A3}' => "GBP",
        '\u{00A5}' => "JPY",
        '\u{00D7}' => "x",
        '\u{00F7}' => ":",
        '\u{00BC}' => " 1/4",
        '\u{00BD}' => " 1/2",
        '\u{00BE}' => " 3/4",
        '\u{00B9}' => "^1",
        '\u{00B2}' => "^2",
        '\u{00B3}' => "^3",

        // Latin-1 letters
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Đ' | 'Ð' => "D",
        'ď' | 'đ' | 'ð' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ł' | 'Ľ' | 'Ĺ' => "L",
        'ł' | 'ľ' | 'ĺ' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Œ' => "OE",
        'œ' => "oe",
        'Ŕ' | 'Ř' => "R",
        'ŕ' | 'ř' => "r",
        'Ś' | 'Š' | 'Ş' => "S",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(transliterate('é'), Some("e"));
        assert_eq!(transliterate('Ö'), Some("O"));
        assert_eq!(transliterate('ß'), Some("ss"));
        assert_eq!(transliterate('Æ'), Some("AE"));
        assert_eq!(transliterate('ł'), Some("l"));
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(transliterate('\u{2019}'), Some("'"));
        assert_eq!(transliterate('\u{201C}'), Some("\""));
        assert_eq!(transliterate('\u{2014}'), Some("-"));
        assert_eq!(transliterate('\u{2026}'), Some("..."));
        assert_eq!(transliterate('\u{20AC}'), Some("EUR"));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(transliterate('日'), None);
        assert_eq!(transliterate('a'), None);
    }
}
