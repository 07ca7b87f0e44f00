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

//! `msginit`, `msgmerge` and `msgcat` implemented on top of `polib`.
//!
//! Obsolete (`#~`) entries are not kept by `polib`, so they are
//! always dropped regardless of the options.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use polib::catalog::Catalog;
use polib::message::{Message, MessageFlags, MessageView};
use polib::metadata::CatalogMetadata;
use polib::po_file;

use crate::config::TranslatorIdentity;
use crate::tools::{
    CatalogStore, CatalogTool, ConcatOptions, HeaderField, MergeOptions, SortOrder,
};
use crate::{Error, Result};

/// Minimum similarity for a fuzzy match, the same cut-off as `msgmerge`.
const FUZZY_THRESHOLD: f64 = 0.6;

fn parse_catalog(tool: &'static str, path: &Path) -> Result<Catalog> {
    po_file::parse(path).map_err(Error::tool(tool, path))
}

fn write_catalog(tool: &'static str, catalog: &Catalog, path: &Path) -> Result<()> {
    po_file::write(catalog, path).map_err(Error::tool(tool, path))
}

/// Messages are identified by their context and their `msgid`.
fn message_key(message: &dyn MessageView) -> (&str, &str) {
    (message.msgctxt(), message.msgid())
}

/// Split a `#:` reference like `src/foo.md:12` into path and line.
fn parse_reference(reference: &str) -> (&str, usize) {
    match reference.rsplit_once(':') {
        Some((path, lineno)) => match lineno.parse() {
            Ok(lineno) => (path, lineno),
            Err(_) => (reference, 0),
        },
        None => (reference, 0),
    }
}

fn first_reference(message: &dyn MessageView) -> (&str, usize) {
    message
        .source()
        .split_whitespace()
        .next()
        .map(parse_reference)
        .unwrap_or(("", 0))
}

fn sort_messages(messages: &mut [Message], order: SortOrder) {
    match order {
        SortOrder::ByFile => {
            messages.sort_by(|a, b| first_reference(a).cmp(&first_reference(b)))
        }
        SortOrder::ByMsgid => messages.sort_by(|a, b| {
            (a.msgid(), a.msgctxt()).cmp(&(b.msgid(), b.msgctxt()))
        }),
    }
}

fn catalog_from(metadata: CatalogMetadata, messages: Vec<Message>) -> Catalog {
    let mut catalog = Catalog::new(metadata);
    for message in messages {
        catalog.append_or_update(message);
    }
    catalog
}

/// Build a message with the id, references and comments of `template`
/// and the translation of `translation`.
fn rebuild_message(
    template: &dyn MessageView,
    translation: &dyn MessageView,
    flags: MessageFlags,
) -> Message {
    if template.is_plural() {
        let mut msgstr_plural = translation.msgstr_plural().cloned().unwrap_or_default();
        if msgstr_plural.is_empty() {
            msgstr_plural = vec![String::new(), String::new()];
        }
        Message::build_plural()
            .with_comments(String::from(template.comments()))
            .with_source(String::from(template.source()))
            .with_flags(flags)
            .with_msgctxt(String::from(template.msgctxt()))
            .with_msgid(String::from(template.msgid()))
            .with_msgid_plural(String::from(template.msgid_plural().unwrap_or_default()))
            .with_msgstr_plural(msgstr_plural)
            .done()
    } else {
        Message::build_singular()
            .with_comments(String::from(template.comments()))
            .with_source(String::from(template.source()))
            .with_flags(flags)
            .with_msgctxt(String::from(template.msgctxt()))
            .with_msgid(String::from(template.msgid()))
            .with_msgstr(String::from(translation.msgstr().unwrap_or_default()))
            .done()
    }
}

fn copy_message(message: &dyn MessageView) -> Message {
    rebuild_message(message, message, message.flags().clone())
}

fn clear_header_field(metadata: &mut CatalogMetadata, field: HeaderField) {
    match field {
        HeaderField::PotCreationDate => metadata.pot_creation_date.clear(),
        HeaderField::PoRevisionDate => metadata.po_revision_date.clear(),
        HeaderField::LastTranslator => metadata.last_translator.clear(),
        HeaderField::LanguageTeam => metadata.language_team.clear(),
        // Not part of the polib header, so it is never written.
        HeaderField::ReportMsgidBugsTo => {}
    }
}

/// Similarity of two strings between 0 and 1, based on the number of
/// shared character bigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    fn bigrams(text: &str) -> Vec<(char, char)> {
        let chars = text.chars().collect::<Vec<_>>();
        chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
    }
    let (a, b) = (bigrams(a), bigrams(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut counts = HashMap::<(char, char), usize>::new();
    for bigram in &a {
        *counts.entry(*bigram).or_default() += 1;
    }
    let mut shared = 0;
    for bigram in &b {
        if let Some(count) = counts.get_mut(bigram).filter(|count| **count > 0) {
            *count -= 1;
            shared += 1;
        }
    }
    2.0 * shared as f64 / (a.len() + b.len()) as f64
}

/// Find the translated message most similar to `msgid`.
fn fuzzy_match<'a>(
    msgid: &str,
    candidates: &[&'a dyn MessageView],
) -> Option<&'a dyn MessageView> {
    let mut best: Option<(f64, &'a dyn MessageView)> = None;
    for candidate in candidates {
        let score = similarity(msgid, candidate.msgid());
        if score >= FUZZY_THRESHOLD && best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, *candidate));
        }
    }
    best.map(|(_, message)| message)
}

/// The `nplurals` and `plural` expression `msginit` uses for a locale.
pub fn plural_rules(locale: &str) -> (usize, &'static str) {
    let normalized = locale.replace('-', "_");
    let language = normalized
        .split(['_', '.', '@'])
        .next()
        .unwrap_or_default();
    match (normalized.as_str(), language) {
        ("pt_BR", _) => (2, "(n > 1)"),
        (_, "ja" | "ko" | "zh" | "vi" | "th" | "id" | "ms" | "lo" | "my" | "km") => (1, "0"),
        (_, "fr" | "oc" | "ln" | "fil" | "br") => (2, "(n > 1)"),
        (_, "ru" | "uk" | "be" | "sr" | "hr" | "bs") => (
            3,
            "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)",
        ),
        (_, "pl") => (
            3,
            "(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)",
        ),
        (_, "cs" | "sk") => (3, "(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2"),
        (_, "lt") => (
            3,
            "(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2)",
        ),
        (_, "lv") => (3, "(n%10==1 && n%100!=11 ? 0 : n != 0 ? 1 : 2)"),
        (_, "ro") => (3, "(n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2)"),
        (_, "sl") => (4, "(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3)"),
        (_, "ga") => (5, "n==1 ? 0 : n==2 ? 1 : (n>2 && n<7) ? 2 :(n>6 && n<11) ? 3 : 4"),
        (_, "ar") => (
            6,
            "(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5)",
        ),
        _ => (2, "(n != 1)"),
    }
}

/// The catalog tools implemented in-process with `polib`.
#[derive(Debug, Default, Clone)]
pub struct PolibCatalogTool {
    translator: TranslatorIdentity,
}

impl PolibCatalogTool {
    pub fn new(translator: TranslatorIdentity) -> Self {
        Self { translator }
    }
}

impl CatalogTool for PolibCatalogTool {
    fn init(&self, template: &Path, output: &Path, locale: &str) -> Result<()> {
        let mut catalog = parse_catalog("msginit", template)?;
        let metadata = &mut catalog.metadata;
        metadata.language = String::from(locale);
        metadata.language_team = String::from(locale);
        metadata.last_translator = self.translator.header_value();
        metadata.po_revision_date = chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string();
        let (nplurals, expr) = plural_rules(locale);
        metadata.plural_rules.nplurals = nplurals;
        metadata.plural_rules.expr = String::from(expr);
        log::debug!("Initializing {} for {locale}", output.display());
        write_catalog("msginit", &catalog, output)
    }

    fn merge(
        &self,
        definitions: &Path,
        reference: &Path,
        output: &Path,
        options: &MergeOptions,
    ) -> Result<()> {
        let mut definitions = parse_catalog("msgmerge", definitions)?;
        let mut reference = parse_catalog("msgmerge", reference)?;

        let mut metadata = std::mem::replace(&mut definitions.metadata, CatalogMetadata::new());
        metadata.pot_creation_date = std::mem::take(&mut reference.metadata.pot_creation_date);

        let by_key = definitions
            .messages()
            .map(|message| (message_key(message), message))
            .collect::<HashMap<_, _>>();
        let candidates = if options.no_fuzzy_matching {
            Vec::new()
        } else {
            definitions
                .messages()
                .filter(|message| message.is_translated() && !message.msgid().is_empty())
                .collect::<Vec<_>>()
        };

        let mut used = HashSet::new();
        let mut messages = Vec::new();
        for message in reference.messages() {
            let key = message_key(message);
            let merged = match by_key.get(&key).copied() {
                Some(definition) if definition.is_translated() => {
                    used.insert(key);
                    rebuild_message(message, definition, definition.flags().clone())
                }
                Some(_) => {
                    used.insert(key);
                    copy_message(message)
                }
                None if !message.is_translated() => {
                    match fuzzy_match(message.msgid(), &candidates) {
                        Some(similar) => {
                            let mut flags = message.flags().clone();
                            flags.add_flag("fuzzy");
                            rebuild_message(message, similar, flags)
                        }
                        None => copy_message(message),
                    }
                }
                None => copy_message(message),
            };
            messages.push(merged);
        }

        let obsolete = by_key.keys().filter(|key| !used.contains(*key)).count();
        if obsolete > 0 && !options.no_obsolete_entries {
            log::warn!(
                "Dropping {obsolete} obsolete messages of {}",
                output.display()
            );
        }

        if options.sort_by_file {
            sort_messages(&mut messages, SortOrder::ByFile);
        }
        write_catalog("msgmerge", &catalog_from(metadata, messages), output)
    }

    fn concat(&self, inputs: &[PathBuf], output: &Path, options: &ConcatOptions) -> Result<()> {
        let mut metadata = None;
        let mut seen = HashSet::new();
        let mut messages = Vec::new();
        for input in inputs {
            let mut catalog = parse_catalog("msgcat", input)?;
            if metadata.is_none() {
                metadata = Some(std::mem::replace(
                    &mut catalog.metadata,
                    CatalogMetadata::new(),
                ));
            }
            for message in catalog.messages() {
                if options.no_fuzzy && message.is_fuzzy() {
                    continue;
                }
                let (msgctxt, msgid) = message_key(message);
                if seen.insert((String::from(msgctxt), String::from(msgid))) {
                    messages.push(copy_message(message));
                }
            }
        }

        let mut metadata = metadata.unwrap_or_else(CatalogMetadata::new);
        for field in &options.remove_header_fields {
            clear_header_field(&mut metadata, *field);
        }
        if let Some(order) = options.sort {
            sort_messages(&mut messages, order);
        }
        write_catalog("msgcat", &catalog_from(metadata, messages), output)
    }
}

/// Parse catalogs with `polib`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoStore;

impl CatalogStore for PoStore {
    fn parse_file(&self, path: &Path) -> Result<Catalog> {
        po_file::parse(path).map_err(|err| Error::MalformedCatalog {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}
