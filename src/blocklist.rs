use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use log::debug;

use crate::error::Error;

/// Ordered set of substring patterns. A domain is blocked when any pattern occurs anywhere in
/// it, so `example.com` also blocks `myexample.company.org`. Patterns and domains are compared
/// as raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    patterns: Vec<Vec<u8>>,
}

impl Blocklist {
    pub fn new<I, P>(patterns: I) -> Blocklist
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        Blocklist {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Blocklist, Error> {
        let to_error = |source| Error::FilterFile {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(to_error)?;
        let blocklist = Blocklist::from_reader(BufReader::new(file)).map_err(to_error)?;
        debug!(
            "Patterns: {:?}",
            blocklist
                .patterns
                .iter()
                .map(|p| String::from_utf8_lossy(p))
                .collect::<Vec<_>>()
        );

        Ok(blocklist)
    }

    /// One pattern per line. Empty lines and lines starting with `#` are skipped, everything
    /// else is kept byte for byte apart from the `\n` terminator.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Blocklist> {
        let mut patterns = vec![];

        for line in reader.split(b'\n') {
            let line = line?;
            if line.is_empty() || line[0] == b'#' {
                continue;
            }
            patterns.push(line);
        }

        Ok(Blocklist { patterns })
    }

    pub fn matching_pattern(&self, domain: &[u8]) -> Option<&[u8]> {
        self.patterns
            .iter()
            .map(Vec::as_slice)
            .find(|pattern| contains(domain, pattern))
    }

    pub fn is_blocked(&self, domain: &[u8]) -> bool {
        self.matching_pattern(domain).is_some()
    }

    pub fn patterns(&self) -> &[Vec<u8>] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn reader_skips_comments_and_blank_lines() {
        let file = "# ads\nads.example.com\n\ntracker.net\n#tracker.org\n";

        let result = Blocklist::from_reader(Cursor::new(file)).unwrap();

        assert_eq!(result, Blocklist::new(vec!["ads.example.com", "tracker.net"]));
    }

    #[test]
    fn reader_keeps_lines_verbatim() {
        let file = "  spaced.com\nwindows.com\r\n #not-a-comment\nlast-line-without-newline";

        let result = Blocklist::from_reader(Cursor::new(file)).unwrap();

        assert_eq!(
            result.patterns(),
            &[
                b"  spaced.com".to_vec(),
                b"windows.com\r".to_vec(),
                b" #not-a-comment".to_vec(),
                b"last-line-without-newline".to_vec(),
            ]
        );
    }

    #[test]
    fn reader_keeps_non_utf8_bytes() {
        let file: &[u8] = &[0xfe, b'\n', 0xff, b'.', b'n', b'e', b't', b'\n'];

        let result = Blocklist::from_reader(Cursor::new(file)).unwrap();

        assert_eq!(result.patterns(), &[vec![0xfeu8], vec![0xff, b'.', b'n', b'e', b't']]);
    }

    #[test]
    fn load_reports_missing_file() {
        let error = Blocklist::load(Path::new("/nonexistent/dnsfilter/blocked.txt")).unwrap_err();

        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn exact_domain_is_blocked() {
        let list = Blocklist::new(vec!["ads.example.com"]);

        assert!(list.is_blocked(b"ads.example.com"));
        assert!(!list.is_blocked(b"www.good.com"));
    }

    #[test]
    fn pattern_matches_anywhere_in_domain() {
        let list = Blocklist::new(vec!["example.com"]);

        assert!(list.is_blocked(b"myexample.company.org"));
        assert!(list.is_blocked(b"notexample.comfoo"));
        assert!(list.is_blocked(b"sub.example.com"));
        assert!(!list.is_blocked(b"example.org"));
    }

    #[test]
    fn first_matching_pattern_wins() {
        let list = Blocklist::new(vec!["tracker", "ads", "ads.example.com"]);

        assert_eq!(list.matching_pattern(b"ads.example.com"), Some(&b"ads"[..]));
        assert_eq!(list.matching_pattern(b"cdn.example.com"), None);
    }

    #[test]
    fn distinct_invalid_bytes_do_not_match() {
        let list = Blocklist::new(vec![vec![0xfeu8]]);

        assert!(!list.is_blocked(&[0xff, b'.', b'c', b'o', b'm']));
        assert!(list.is_blocked(&[b'a', 0xfe, b'.', b'c', b'o', b'm']));
    }

    #[test]
    fn blocked_iff_some_pattern_is_substring() {
        let list = Blocklist::new(vec!["ads", ".doubleclick.", "com"]);
        let domains: &[&[u8]] = &[
            b"ads.example.org",
            b"x.doubleclick.net",
            b"doubleclick.net",
            b"example.com",
            b"example.org",
            b"a",
            b"",
        ];

        for domain in domains {
            let expected = list.patterns().iter().any(|p| {
                (0..=domain.len().saturating_sub(p.len()))
                    .any(|start| domain.get(start..start + p.len()) == Some(p.as_slice()))
            });
            assert_eq!(list.is_blocked(domain), expected, "domain {:?}", domain);
        }
    }

    #[test]
    fn empty_list_blocks_nothing() {
        let list = Blocklist::default();

        assert!(list.is_empty());
        assert!(!list.is_blocked(b"anything.com"));
    }
}
