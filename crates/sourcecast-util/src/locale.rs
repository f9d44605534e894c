//! Conversions between the locale codeset and UTF-8.
//!
//! The codeset is read from the environment-derived locale. The `LC_CTYPE`
//! category is switched only for the duration of the lookup and put back to
//! the "C" locale before returning.

use crate::transcode::{transcode, ConversionMode};

/// Codeset reported for the "C" locale by glibc.
pub const C_LOCALE_CODESET: &str = "ANSI_X3.4-1968";

/// Name used for the UTF-8 side of locale conversions.
pub const UTF8: &str = "UTF-8";

#[cfg(unix)]
static LOCALE_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Codeset of the locale configured in the environment (`LC_ALL`,
/// `LC_CTYPE`, `LANG`).
#[cfg(unix)]
pub fn locale_codeset() -> String {
    let _guard = LOCALE_LOCK.lock();

    // SAFETY: setlocale and nl_langinfo touch process-global locale state.
    // Calls are serialized by LOCALE_LOCK, and the returned pointer is copied
    // before the locale is switched back.
    let codeset = unsafe {
        libc::setlocale(libc::LC_CTYPE, c"".as_ptr());
        let ptr = libc::nl_langinfo(libc::CODESET);
        let codeset = if ptr.is_null() {
            None
        } else {
            Some(std::ffi::CStr::from_ptr(ptr).to_string_lossy().into_owned())
        };
        libc::setlocale(libc::LC_CTYPE, c"C".as_ptr());
        codeset
    };

    match codeset {
        Some(name) if !name.is_empty() => name,
        _ => C_LOCALE_CODESET.to_string(),
    }
}

#[cfg(not(unix))]
pub fn locale_codeset() -> String {
    UTF8.to_string()
}

/// Convert locale-encoded text to UTF-8.
///
/// Bytes that survive the conversion but are not valid UTF-8 (only possible
/// when the engine falls back to returning its input) are replaced with
/// U+FFFD.
pub fn locale_to_utf8(input: Option<&[u8]>, mode: ConversionMode) -> String {
    let codeset = locale_codeset();
    let bytes = transcode(input, &codeset, UTF8, mode);
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Convert UTF-8 text to the locale codeset.
pub fn utf8_to_locale(input: Option<&str>, mode: ConversionMode) -> Vec<u8> {
    let codeset = locale_codeset();
    transcode(input.map(str::as_bytes), UTF8, &codeset, mode)
}
