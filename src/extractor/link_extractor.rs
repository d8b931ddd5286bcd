use crate::error::Result;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// Matches a Discord CDN attachment link: scheme, one of the two attachment
/// hostnames, then everything up to whitespace, a quote or an angle bracket.
/// The matched text is used verbatim as a mapping key and as the substring
/// replaced during rewriting, so no decoding or normalization happens here.
static CDN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://(?:cdn\.discordapp\.com|media\.discordapp\.com)/[^\s"<]+"#)
        .expect("Invalid CDN link regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the distinct CDN links in one line, in order of first
    /// appearance. Lines without a match contribute nothing; malformed or
    /// binary-looking input never panics.
    pub fn extract_from_line<'a>(&self, line: &'a str) -> Vec<&'a str> {
        let mut links: Vec<&str> = Vec::new();

        for m in CDN_LINK.find_iter(line) {
            let link = m.as_str();
            if !links.contains(&link) {
                links.push(link);
            }
        }

        links
    }

    /// Scans a whole file line by line and returns the distinct links in
    /// first-seen order.
    pub fn scan_file(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut links: Vec<String> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            for link in self.extract_from_line(&line) {
                if !links.iter().any(|l| l == link) {
                    links.push(link.to_string());
                }
            }
        }

        Ok(links)
    }
}
