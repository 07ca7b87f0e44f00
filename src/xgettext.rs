// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `xgettext` for Markdown files.
//!
//! Every paragraph, heading, list item and code block of a document
//! becomes one message of the template.

use std::fs;
use std::io;
use std::path::Path;

use polib::catalog::Catalog;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;

use crate::extract_messages;
use crate::tools::Extractor;
use crate::{Error, Result};

fn add_message(catalog: &mut Catalog, msgid: &str, source: &str) {
    let sources = match catalog.find_message(None, msgid, None) {
        Some(msg) => format!("{}\n{}", msg.source(), source),
        None => String::from(source),
    };
    let message = Message::build_singular()
        .with_source(sources)
        .with_msgid(String::from(msgid))
        .done();
    catalog.append_or_update(message);
}

/// Extract messages from Markdown documents.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownExtractor {
    granularity: usize,
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MarkdownExtractor {
    /// Line numbers in the references are rounded down to a multiple
    /// of `granularity`. They are left out when it is 0.
    pub fn new(granularity: usize) -> Self {
        Self { granularity }
    }

    fn source_reference(&self, reference: &Path, lineno: usize) -> String {
        if self.granularity == 0 {
            return reference.display().to_string();
        }
        let lineno = std::cmp::max(1, lineno - lineno % self.granularity);
        format!("{}:{}", reference.display(), lineno)
    }

    fn create_catalog(&self, document: &str, reference: &Path) -> Catalog {
        let mut metadata = CatalogMetadata::new();
        metadata.mime_version = String::from("1.0");
        metadata.content_type = String::from("text/plain; charset=UTF-8");
        metadata.content_transfer_encoding = String::from("8bit");
        metadata.pot_creation_date = chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string();
        let mut catalog = Catalog::new(metadata);

        for (lineno, msgid) in extract_messages(document) {
            let source = self.source_reference(reference, lineno);
            add_message(&mut catalog, &msgid, &source);
        }
        catalog
    }
}

impl Extractor for MarkdownExtractor {
    fn extract_template(&self, source: &Path, reference: &Path) -> Result<Catalog> {
        let document = fs::read_to_string(source).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::MissingSourceFile(source.to_path_buf()),
            _ => Error::io(source)(err),
        })?;
        Ok(self.create_catalog(&document, reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messages(catalog: &Catalog) -> Vec<(&str, &str)> {
        catalog
            .messages()
            .map(|msg| (msg.source(), msg.msgid()))
            .collect()
    }

    #[test]
    fn test_extract_template() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let source = tmpdir.path().join("guide.md");
        fs::write(
            &source,
            "# How to Foo\n\
             \n\
             The first paragraph about Foo.\n\
             Still the first paragraph.\n",
        )?;

        let catalog =
            MarkdownExtractor::default().extract_template(&source, Path::new("docs/guide.md"))?;
        assert_eq!(catalog.metadata.content_type, "text/plain; charset=UTF-8");
        assert!(!catalog.metadata.pot_creation_date.is_empty());
        assert_eq!(
            messages(&catalog),
            [
                ("docs/guide.md:1", "How to Foo"),
                (
                    "docs/guide.md:3",
                    "The first paragraph about Foo. Still the first paragraph."
                ),
            ]
        );
        for msg in catalog.messages() {
            assert!(!msg.is_translated());
        }
        Ok(())
    }

    #[test]
    fn test_duplicate_messages_share_an_entry() {
        let catalog = MarkdownExtractor::default()
            .create_catalog("Note.\n\nText.\n\nNote.\n", Path::new("guide.md"));
        assert_eq!(
            messages(&catalog),
            [("guide.md:1\nguide.md:5", "Note."), ("guide.md:3", "Text.")]
        );
    }

    #[test]
    fn test_granularity() {
        let document = "One.\n\nTwo.\n\n\n\n\n\n\n\n\n\nThree.\n";
        let catalog = MarkdownExtractor::new(10).create_catalog(document, Path::new("a.md"));
        assert_eq!(
            messages(&catalog),
            [("a.md:1", "One."), ("a.md:1", "Two."), ("a.md:10", "Three.")]
        );

        let catalog = MarkdownExtractor::new(0).create_catalog(document, Path::new("a.md"));
        assert_eq!(
            messages(&catalog),
            [("a.md", "One."), ("a.md", "Two."), ("a.md", "Three.")]
        );
    }

    #[test]
    fn test_missing_source() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let source = tmpdir.path().join("missing.md");
        assert!(matches!(
            MarkdownExtractor::default().extract_template(&source, Path::new("missing.md")),
            Err(Error::MissingSourceFile(path)) if path == source
        ));
        Ok(())
    }
}
