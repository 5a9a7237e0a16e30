/*!
    File URI helpers.

    Only `file://` URIs are meaningful to the formatters; these helpers
    convert between them and local paths with minimal percent
    encoding/decoding. Parsers are try-parse style and return `None` for
    anything they do not understand.
*/

use std::path::{Path, PathBuf};

/// Scheme of a URI, lowercased, if it has a well-formed one.
pub fn scheme(uri: &str) -> Option<String> {
    let (scheme, _) = uri.split_once(':')?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        || !scheme.starts_with(|c: char| c.is_ascii_alphabetic())
    {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

pub fn is_file_uri(uri: &str) -> bool {
    scheme(uri).as_deref() == Some("file")
}

/**
    Resolve a `file://` URI to a local path.

    Accepts an empty or `localhost` authority; percent escapes in the
    path are decoded. Returns `None` for any other scheme or malformed
    escape.
*/
pub fn to_file_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    let path = match rest.strip_prefix("localhost") {
        Some(after_host) => after_host,
        None => rest,
    };
    if !path.starts_with('/') {
        return None;
    }
    Some(PathBuf::from(percent_decode(path)?))
}

/**
    Turn a local path into a `file://` URI, percent-encoding where
    needed.
*/
pub fn from_file_path(path: &Path) -> String {
    let mut uri = String::from("file://");
    for byte in path.to_string_lossy().bytes() {
        if is_unreserved(byte) || byte == b'/' {
            uri.push(byte as char);
        } else {
            let hi = char::from_digit((byte >> 4) as u32, 16).unwrap_or('0');
            let lo = char::from_digit((byte & 0xF) as u32, 16).unwrap_or('0');
            uri.push('%');
            uri.push(hi.to_ascii_uppercase());
            uri.push(lo.to_ascii_uppercase());
        }
    }
    uri
}

/// Lowercased extension of the URI's path portion.
pub fn extension(uri: &str) -> Option<String> {
    let path = uri.rsplit('/').next().unwrap_or(uri);
    let (stem, ext) = path.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the URI's path ends in the given extension (case-insensitive).
pub fn has_extension(uri: &str, ext: &str) -> bool {
    extension(uri).as_deref() == Some(ext.to_ascii_lowercase().as_str())
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

fn percent_decode(s: &str) -> Option<String> {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let hi = hex_value(bytes.next()?)?;
            let lo = hex_value(bytes.next()?)?;
            out.push(hi << 4 | lo);
        } else {
            out.push(byte);
        }
    }
    String::from_utf8(out).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes() {
        assert_eq!(scheme("file:///a").as_deref(), Some("file"));
        assert_eq!(scheme("HTTP://x").as_deref(), Some("http"));
        assert_eq!(scheme("/plain/path"), None);
        assert_eq!(scheme("1bad://x"), None);
        assert!(is_file_uri("file:///tmp/t.xcut"));
        assert!(!is_file_uri("https://example.com/t.xcut"));
    }

    #[test]
    fn path_round_trip() {
        let path = Path::new("/tmp/some dir/clip table.xcut");
        let uri = from_file_path(path);
        assert_eq!(uri, "file:///tmp/some%20dir/clip%20table.xcut");
        assert_eq!(to_file_path(&uri).unwrap(), path);
    }

    #[test]
    fn to_file_path_rejects_foreign() {
        assert!(to_file_path("https://example.com/a.itl").is_none());
        assert!(to_file_path("file://host/a.itl").is_none());
        assert!(to_file_path("file:///bad%zz").is_none());
        assert_eq!(
            to_file_path("file://localhost/a.itl").unwrap(),
            Path::new("/a.itl")
        );
    }

    #[test]
    fn extensions() {
        assert_eq!(extension("file:///a/b.XCUT").as_deref(), Some("xcut"));
        assert_eq!(extension("file:///a/.hidden"), None);
        assert_eq!(extension("file:///a/none"), None);
        assert!(has_extension("file:///p/t.edl", "edl"));
        assert!(!has_extension("file:///p/t.edl", "itl"));
    }
}
