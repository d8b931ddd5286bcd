use crate::error::Result;
use crate::extractor::LinkExtractor;
use crate::mapping::Mapping;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Produces the offline copy of an export: every occurrence of a link with a
/// resolved local path is replaced by that path, links that never resolved
/// stay as their original remote form. Substitution is literal text on the
/// exact strings the extractor matched, processed line by line so the file
/// size never matters.
pub struct OfflineRewriter {
    extractor: LinkExtractor,
}

impl OfflineRewriter {
    pub fn new() -> Self {
        Self {
            extractor: LinkExtractor::new(),
        }
    }

    pub fn rewrite_file(&self, input: &Path, output: &Path, mapping: &Mapping) -> Result<()> {
        let mut reader = BufReader::new(File::open(input)?);
        let mut writer = BufWriter::new(File::create(output)?);

        // read_line keeps the line terminator, so untouched lines are copied
        // byte for byte and the last line needs no special casing.
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }

            let rewritten = self.rewrite_line(&line, mapping);
            writer.write_all(rewritten.as_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Replaces every resolved link in one line, handling multiple distinct
    /// links and the same link repeated.
    pub fn rewrite_line(&self, line: &str, mapping: &Mapping) -> String {
        let mut edited = line.to_string();

        for link in self.extractor.extract_from_line(line) {
            if let Some(Some(local_path)) = mapping.local_path(link) {
                edited = edited.replace(link, local_path);
            }
        }

        edited
    }
}

impl Default for OfflineRewriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mapping_with(entries: &[(&str, Option<&str>)]) -> Mapping {
        let mut mapping = Mapping::new();
        for (link, path) in entries {
            mapping.insert_link(*link);
            if let Some(path) = path {
                mapping.set_local_path(link, path.to_string());
            }
        }
        mapping
    }

    #[test]
    fn test_repeated_link_replaced_everywhere() {
        let rewriter = OfflineRewriter::new();
        let mapping = mapping_with(&[(
            "https://cdn.discordapp.com/a/b.png",
            Some("attachments/b.png"),
        )]);

        let line = "see https://cdn.discordapp.com/a/b.png and \
                    https://cdn.discordapp.com/a/b.png again";
        assert_eq!(
            rewriter.rewrite_line(line, &mapping),
            "see attachments/b.png and attachments/b.png again"
        );
    }

    #[test]
    fn test_unresolved_links_left_untouched() {
        let rewriter = OfflineRewriter::new();
        let mapping = mapping_with(&[
            ("https://cdn.discordapp.com/a/ok.png", Some("attachments/ok.png")),
            ("https://cdn.discordapp.com/a/failed.png", None),
        ]);

        let line = "https://cdn.discordapp.com/a/ok.png https://cdn.discordapp.com/a/failed.png";
        assert_eq!(
            rewriter.rewrite_line(line, &mapping),
            "attachments/ok.png https://cdn.discordapp.com/a/failed.png"
        );
    }

    #[test]
    fn test_unknown_links_left_untouched() {
        let rewriter = OfflineRewriter::new();
        let mapping = Mapping::new();

        let line = "https://cdn.discordapp.com/a/unknown.png stays";
        assert_eq!(rewriter.rewrite_line(line, &mapping), line);
    }

    #[test]
    fn test_linkless_file_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("export.txt");
        let output = dir.path().join("export.offline.txt");

        let content = "no links here\r\nsecond line\nlast line without newline";
        fs::write(&input, content).unwrap();

        let rewriter = OfflineRewriter::new();
        rewriter
            .rewrite_file(&input, &output, &Mapping::new())
            .unwrap();

        assert_eq!(fs::read(&output).unwrap(), content.as_bytes());
    }

    #[test]
    fn test_rewrite_file_replaces_resolved_links() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("export.txt");
        let output = dir.path().join("export.offline.txt");

        fs::write(
            &input,
            "intro\nimg: https://cdn.discordapp.com/a/b.png?v=1\noutro\n",
        )
        .unwrap();

        let mapping = mapping_with(&[(
            "https://cdn.discordapp.com/a/b.png?v=1",
            Some("attachments/b.png"),
        )]);

        let rewriter = OfflineRewriter::new();
        rewriter.rewrite_file(&input, &output, &mapping).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "intro\nimg: attachments/b.png\noutro\n"
        );
    }
}
