use crate::error::ParseError;

const HEADER_PREFIX: &str = "bytes=";

/// A satisfiable byte range of a file. `length` is never zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpRange {
    pub start: u64,
    pub length: u64,
}

type Result<T> = std::result::Result<T, ParseError>;

impl HttpRange {
    /// parse the `Range` header against a file of `file_size` bytes.
    ///
    /// Ranges which start past the end of the file are dropped; if every
    /// range was dropped the result is `ParseError::NoOverlap`.
    pub fn parse(header: &str, file_size: u64) -> Result<Vec<HttpRange>> {
        let specs = header
            .strip_prefix(HEADER_PREFIX)
            .ok_or(ParseError::InvalidRange)?;
        let mut no_overlap = false;
        let mut ranges = Vec::new();
        for spec in specs.split(',') {
            let spec = spec.trim_matches(|c: char| c == ' ' || c == '\t');
            if spec.is_empty() {
                continue;
            }
            match Self::parse_spec(spec, file_size)? {
                Some(range) => ranges.push(range),
                None => no_overlap = true,
            }
        }
        if ranges.is_empty() {
            return Err(if no_overlap {
                ParseError::NoOverlap
            } else {
                ParseError::InvalidRange
            });
        }
        Ok(ranges)
    }

    fn parse_spec(spec: &str, file_size: u64) -> Result<Option<HttpRange>> {
        let (first, last) = spec.split_once('-').ok_or(ParseError::InvalidRange)?;
        let (first, last) = (first.trim(), last.trim());
        if first.is_empty() {
            // suffix range: the last `n` bytes
            let suffix = parse_pos(last)?;
            let length = suffix.min(file_size);
            if length == 0 {
                return Ok(None);
            }
            return Ok(Some(HttpRange {
                start: file_size - length,
                length,
            }));
        }
        let start = parse_pos(first)?;
        if start >= file_size {
            return Ok(None);
        }
        let end = if last.is_empty() {
            file_size - 1
        } else {
            let end = parse_pos(last)?;
            if start > end {
                return Err(ParseError::InvalidRange);
            }
            end.min(file_size - 1)
        };
        Ok(Some(HttpRange {
            start,
            length: end - start + 1,
        }))
    }

    /// the offset of the last byte in the range.
    pub fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    /// the value of the `Content-Range` header for this range.
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end(), file_size)
    }
}

fn parse_pos(s: &str) -> Result<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidRange);
    }
    s.parse().map_err(|_| ParseError::InvalidRange)
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! test_error {
        ($parse: literal, $file_size: literal, $result: pat) => {
            let rs = HttpRange::parse($parse, $file_size);
            assert!(matches!(rs, $result), "{}: {:?}", $parse, rs);
        };
    }

    macro_rules! test_range {
        ($parse: literal, $file_size: literal, [$(($start: literal, $length: literal)),+]) => {
            let rs = HttpRange::parse($parse, $file_size).unwrap();
            assert_eq!(rs, vec![$(HttpRange { start: $start, length: $length }),+]);
        };
    }

    #[test]
    fn test_parse() {
        test_range!("bytes=-5", 10, [(5, 5)]);
        test_range!("bytes=-50", 10, [(0, 10)]);
        test_range!("bytes=0-5", 10, [(0, 6)]);
        test_range!("bytes=0-100", 10, [(0, 10)]);
        test_range!("bytes=0-", 10, [(0, 10)]);
        test_range!("bytes=9-", 10, [(9, 1)]);
        test_range!("bytes=   0- ", 10, [(0, 10)]);
        test_range!("bytes=   0-2 , 5-10", 10, [(0, 3), (5, 5)]);
        test_range!("bytes=500-600,601-999", 1000, [(500, 101), (601, 399)]);
        test_range!("bytes=0-1,20-30", 10, [(0, 2)]);
    }

    #[test]
    fn test_parse_error() {
        test_error!("", 0, Err(ParseError::InvalidRange));
        test_error!("", 100, Err(ParseError::InvalidRange));
        test_error!("items=0-5", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=5", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=5-1", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=--5", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=+1-5", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=a-b", 100, Err(ParseError::InvalidRange));
        test_error!("bytes=10-", 10, Err(ParseError::NoOverlap));
        test_error!("bytes=-0", 10, Err(ParseError::NoOverlap));
        test_error!("bytes=0-", 0, Err(ParseError::NoOverlap));
    }

    #[test]
    fn test_content_range() {
        let range = HttpRange {
            start: 5,
            length: 5,
        };
        assert_eq!(range.end(), 9);
        assert_eq!(range.content_range(10), "bytes 5-9/10");
    }
}
