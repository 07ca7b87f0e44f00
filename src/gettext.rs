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

//! `gettext` for Markdown files.
//!
//! Only the text of translated messages is replaced. Everything else,
//! including messages without a translation or with a fuzzy one, is
//! copied byte for byte from the source.

use std::ops::Range;

use polib::catalog::Catalog;
use polib::message::MessageView;

use crate::tools::Translator;
use crate::{extract_events, group_events, new_cmark_parser, reconstruct_markdown, Group};

/// Look up the usable translation of `msgid`.
fn lookup<'a>(catalog: &'a Catalog, msgid: &str) -> Option<&'a str> {
    catalog
        .find_message(None, msgid, None)
        .filter(|msg| !msg.flags().is_fuzzy())
        .and_then(|msg| msg.msgstr().ok())
        .filter(|msgstr| !msgstr.is_empty())
}

/// The source bytes covered by a run of events.
fn span(ranges: &[Range<usize>]) -> Option<Range<usize>> {
    let start = ranges.iter().map(|range| range.start).min()?;
    let end = ranges.iter().map(|range| range.end).max()?;
    Some(start..end)
}

/// Write `msgstr` in place of a message starting at `offset`.
///
/// Continuation lines get the indentation and block quote markers of
/// the line the message starts on.
fn push_translation(output: &mut String, text: &str, offset: usize, msgstr: &str) {
    let line_start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let prefix = text[line_start..offset]
        .chars()
        .map(|c| if c == '>' || c.is_whitespace() { c } else { ' ' })
        .collect::<String>();

    for (idx, line) in msgstr.split_inclusive('\n').enumerate() {
        if idx > 0 {
            if line == "\n" {
                output.push_str(prefix.trim_end());
            } else {
                output.push_str(&prefix);
            }
        }
        output.push_str(line);
    }
}

/// Translate `text` with the messages of `catalog`.
pub fn translate(text: &str, catalog: &Catalog) -> String {
    let events = extract_events(text, None);
    let ranges = new_cmark_parser(text)
        .into_offset_iter()
        .map(|(_, range)| range)
        .collect::<Vec<_>>();

    let mut output = String::with_capacity(text.len());
    let mut copied = 0;
    let mut state = None;
    let mut first = 0;
    for group in group_events(&events) {
        let (run, translatable) = match group {
            Group::Translate(events) => (events, true),
            Group::Skip(events) => (events, false),
        };
        let last = first + run.len();
        let (msgid, new_state) = reconstruct_markdown(run, state);
        state = Some(new_state);

        let replacement = translatable
            .then(|| lookup(catalog, &msgid))
            .flatten()
            .zip(span(&ranges[first..last]));
        if let Some((msgstr, span)) = replacement {
            if span.start >= copied {
                output.push_str(&text[copied..span.start]);
                push_translation(&mut output, text, span.start, msgstr);
                copied = span.end;
            }
        }
        first = last;
    }
    output.push_str(&text[copied..]);
    output
}

/// The [`Translator`] for Markdown documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownTranslator;

impl Translator for MarkdownTranslator {
    fn apply(&self, text: &str, catalog: &Catalog) -> String {
        translate(text, catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polib::message::{Message, MessageMutView};
    use polib::metadata::CatalogMetadata;
    use pretty_assertions::assert_eq;

    fn create_catalog(translations: &[(&str, &str)]) -> Catalog {
        let mut catalog = Catalog::new(CatalogMetadata::new());
        for (msgid, msgstr) in translations {
            let message = Message::build_singular()
                .with_msgid(String::from(*msgid))
                .with_msgstr(String::from(*msgstr))
                .done();
            catalog.append_or_update(message);
        }
        catalog
    }

    #[test]
    fn test_translate_single_paragraph() {
        let catalog = create_catalog(&[("Hello", "こんにちは")]);
        assert_eq!(translate("Hello\n", &catalog), "こんにちは\n");
    }

    #[test]
    fn test_translate_multiple_paragraphs() {
        let catalog = create_catalog(&[("foo bar", "FOO BAR")]);
        assert_eq!(
            translate(
                "first paragraph\n\
                 \n\
                 foo bar\n\
                 \n\
                 last paragraph\n",
                &catalog
            ),
            "first paragraph\n\
             \n\
             FOO BAR\n\
             \n\
             last paragraph\n"
        );
    }

    #[test]
    fn test_translate_wrapped_paragraph() {
        let catalog = create_catalog(&[("first paragraph", "ERSTER ABSATZ")]);
        assert_eq!(
            translate("first\nparagraph\n\n\nlast\n", &catalog),
            "ERSTER ABSATZ\n\n\nlast\n"
        );
    }

    #[test]
    fn test_translate_heading_and_list() {
        let catalog = create_catalog(&[
            ("Install", "Installation"),
            ("Download it.", "Herunterladen."),
        ]);
        assert_eq!(
            translate("# Install\n\n- Download it.\n- Run it.\n", &catalog),
            "# Installation\n\n- Herunterladen.\n- Run it.\n"
        );
    }

    #[test]
    fn test_translate_code_block() {
        let catalog = create_catalog(&[(
            "fn foo() {\n\n    let x = 10;\n\n}\n",
            "fn FOO() {\n\n    let X = 10;\n\n}\n",
        )]);
        assert_eq!(
            translate(
                "Text before.\n\
                 \n\
                 \n\
                 ```rust,editable\n\
                 fn foo() {\n\n    let x = 10;\n\n}\n\
                 ```\n\
                 \n\
                 Text after.\n",
                &catalog
            ),
            "Text before.\n\
             \n\
             \n\
             ```rust,editable\n\
             fn FOO() {\n\n    let X = 10;\n\n}\n\
             ```\n\
             \n\
             Text after.\n",
        );
    }

    #[test]
    fn test_translate_skips_fuzzy_and_empty() {
        let mut catalog = create_catalog(&[("World", "")]);
        let mut fuzzy = Message::build_singular()
            .with_msgid(String::from("Hello"))
            .with_msgstr(String::from("Hallo"))
            .done();
        fuzzy.flags_mut().add_flag("fuzzy");
        catalog.append_or_update(fuzzy);
        assert_eq!(
            MarkdownTranslator.apply("Hello\n\nWorld\n", &catalog),
            "Hello\n\nWorld\n"
        );
    }

    #[test]
    fn test_untranslated_text_is_unchanged() {
        let catalog = create_catalog(&[]);
        let text = "Title\n=====\n\n\
                    Some *emphasis* and a [link].\n\n\
                    * one\n\
                    * two\n\n\
                    [link]: https://example.com\n";
        assert_eq!(translate(text, &catalog), text);
    }

    #[test]
    fn test_translate_keeps_surrounding_markup() {
        let catalog = create_catalog(&[
            ("Title", "Titel"),
            ("one", "eins"),
            (
                "Some _emphasis_ and a [link](https://example.com).",
                "Etwas *Betonung* und ein [Link].",
            ),
        ]);
        assert_eq!(
            translate(
                "Title\n=====\n\n\
                 Some *emphasis* and a [link].\n\n\
                 * one\n\
                 * two\n\n\
                 [link]: https://example.com\n",
                &catalog
            ),
            "Titel\n=====\n\n\
             Etwas *Betonung* und ein [Link].\n\n\
             * eins\n\
             * two\n\n\
             [link]: https://example.com\n"
        );
    }

    #[test]
    fn test_translate_block_quote_lines() {
        let catalog = create_catalog(&[("first second", "erste\nzweite")]);
        assert_eq!(
            translate("> first\n> second\n", &catalog),
            "> erste\n> zweite\n"
        );
    }
}
