use std::path::{Path, PathBuf};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ParseError;

/// The characters escaped when a path segment is written back into a url.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// percent-encode a single path segment.
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// The request path after decoding and cleaning.
///
/// The segments never contain `.`, `..` or empty names, so joining them to a
/// root can't leave it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPath {
    segments: Vec<String>,
    trailing_slash: bool,
}

impl RequestPath {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ParseError::InvalidPath)?;
        // a backslash is only a separator on windows, elsewhere it's a name
        if decoded.contains('\0') || (cfg!(windows) && decoded.contains('\\')) {
            return Err(ParseError::InvalidPath);
        }
        let mut segments: Vec<String> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    // popping an empty stack keeps us at the root
                    segments.pop();
                }
                name => segments.push(name.to_owned()),
            }
        }
        let trailing_slash = decoded.is_empty() || decoded.ends_with('/');
        Ok(Self {
            segments,
            trailing_slash,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// whether the request names a directory explicitly, e.g. `/docs/`.
    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash || self.is_root()
    }

    /// the filesystem path of the request below `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    /// the cleaned path re-encoded for use in a url.
    pub fn to_url(&self) -> String {
        let mut url = String::with_capacity(64);
        for segment in &self.segments {
            url.push('/');
            url.push_str(&encode_segment(segment));
        }
        if url.is_empty() {
            url.push('/');
        }
        url
    }
}
