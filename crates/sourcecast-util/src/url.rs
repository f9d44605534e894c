//! Parsing of `http://host:port/mount` stream addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::UrlError;

const SCHEME: &str = "http://";

/// Longest accepted port text.
const MAX_PORT_DIGITS: usize = 5;

/// A server endpoint and mountpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamUrl {
    pub host: String,
    pub port: u16,
    /// Mountpoint, including the leading `/`.
    pub mount: String,
}

impl fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}{}", SCHEME, self.host, self.port, self.mount)
    }
}

impl FromStr for StreamUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_stream_url(s)
    }
}

/// Split `url` into host, port and mountpoint.
///
/// The grammar is strictly `http://HOST:PORT/MOUNT`; the mountpoint runs to
/// the end of the string. Failures are logged.
///
/// # Examples
///
/// ```
/// use sourcecast_util::url::parse_stream_url;
///
/// let url = parse_stream_url("http://host.example:8000/mount")?;
/// assert_eq!(url.host, "host.example");
/// assert_eq!(url.port, 8000);
/// assert_eq!(url.mount, "/mount");
/// # Ok::<(), sourcecast_util::UrlError>(())
/// ```
pub fn parse_stream_url(url: &str) -> Result<StreamUrl, UrlError> {
    let result = parse(url);
    if let Err(ref e) = result {
        tracing::error!("{}", e);
    }
    result
}

fn parse(url: &str) -> Result<StreamUrl, UrlError> {
    let rest = url.strip_prefix(SCHEME).ok_or(UrlError::InvalidScheme)?;

    let (host, rest) = rest.split_once(':').ok_or(UrlError::MissingPort)?;
    if host.is_empty() {
        return Err(UrlError::MissingHost);
    }

    let slash = rest.find('/').ok_or(UrlError::MalformedMount)?;
    let (port_text, mount) = rest.split_at(slash);
    if port_text.len() > MAX_PORT_DIGITS {
        return Err(UrlError::MalformedMount);
    }

    let port = parse_port(port_text)?;

    Ok(StreamUrl {
        host: host.to_string(),
        port,
        mount: mount.to_string(),
    })
}

fn parse_port(text: &str) -> Result<u16, UrlError> {
    let invalid = |reason| UrlError::InvalidPort {
        port: text.to_string(),
        reason,
    };

    let value: i64 = text.parse().map_err(|_| invalid("invalid"))?;
    if value < 1 {
        return Err(invalid("too small"));
    }
    u16::try_from(value).map_err(|_| invalid("too large"))
}
