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

//! The collaborators used by the tasks.
//!
//! The tasks decide *when* a catalog is extracted, merged or
//! concatenated. The traits here do the actual work and can be
//! replaced, e.g. by a test double.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use polib::catalog::Catalog;

use crate::catalog::{PoStore, PolibCatalogTool};
use crate::clock::{Clock, SystemClock};
use crate::gettext::MarkdownTranslator;
use crate::paths::ArtifactPaths;
use crate::xgettext::MarkdownExtractor;
use crate::{Config, Result};

/// Extract a message template from a source file.
pub trait Extractor {
    /// Extract the messages of `source`. The `reference` is the name
    /// used for the source in the `#:` comments of the template.
    fn extract_template(&self, source: &Path, reference: &Path) -> Result<Catalog>;
}

/// Header fields which can be removed when concatenating catalogs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderField {
    PotCreationDate,
    PoRevisionDate,
    ReportMsgidBugsTo,
    LastTranslator,
    LanguageTeam,
}

impl HeaderField {
    /// Fields which change on every extraction or edit without any
    /// change to the messages.
    pub const VOLATILE: [HeaderField; 4] = [
        HeaderField::ReportMsgidBugsTo,
        HeaderField::LastTranslator,
        HeaderField::LanguageTeam,
        HeaderField::PotCreationDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HeaderField::PotCreationDate => "POT-Creation-Date",
            HeaderField::PoRevisionDate => "PO-Revision-Date",
            HeaderField::ReportMsgidBugsTo => "Report-Msgid-Bugs-To",
            HeaderField::LastTranslator => "Last-Translator",
            HeaderField::LanguageTeam => "Language-Team",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub sort_by_file: bool,
    pub no_fuzzy_matching: bool,
    pub no_obsolete_entries: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortOrder {
    /// By the first `#:` reference, then by line number.
    ByFile,
    ByMsgid,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConcatOptions {
    pub sort: Option<SortOrder>,
    pub no_fuzzy: bool,
    pub remove_header_fields: Vec<HeaderField>,
}

/// The three catalog primitives of the Gettext tool chain.
pub trait CatalogTool {
    /// Create `output` from `template` for `locale`, like `msginit`.
    fn init(&self, template: &Path, output: &Path, locale: &str) -> Result<()>;

    /// Write the messages of `reference`, translated with the messages
    /// of `definitions`, to `output`, like `msgmerge`. The output may be
    /// one of the inputs.
    fn merge(
        &self,
        definitions: &Path,
        reference: &Path,
        output: &Path,
        options: &MergeOptions,
    ) -> Result<()>;

    /// Concatenate `inputs` into `output`, like `msgcat`. The first
    /// occurrence of a message wins.
    fn concat(&self, inputs: &[PathBuf], output: &Path, options: &ConcatOptions) -> Result<()>;
}

/// Load a catalog from disk.
pub trait CatalogStore {
    fn parse_file(&self, path: &Path) -> Result<Catalog>;
}

/// Replace the translatable text of a document using a catalog.
pub trait Translator {
    fn apply(&self, text: &str, catalog: &Catalog) -> String;
}

/// Hook run on every translated file before it is written.
///
/// The arguments are the source text, the translated text and the
/// paths of the file being translated.
pub type PostProcessor = dyn Fn(&str, String, &ArtifactPaths) -> String;

/// Everything the task actions need to do their work.
pub struct Toolbox {
    pub extractor: Box<dyn Extractor>,
    pub catalogs: Box<dyn CatalogTool>,
    pub store: Box<dyn CatalogStore>,
    pub translator: Box<dyn Translator>,
    pub clock: Box<dyn Clock>,
    post_processor: Option<Box<PostProcessor>>,
    locale_catalogs: RefCell<HashMap<String, Rc<Catalog>>>,
}

impl Toolbox {
    pub fn new(
        extractor: Box<dyn Extractor>,
        catalogs: Box<dyn CatalogTool>,
        store: Box<dyn CatalogStore>,
        translator: Box<dyn Translator>,
    ) -> Self {
        Self {
            extractor,
            catalogs,
            store,
            translator,
            clock: Box::new(SystemClock),
            post_processor: None,
            locale_catalogs: RefCell::new(HashMap::new()),
        }
    }

    /// The Markdown extractor and translator with the polib tools.
    pub fn builtin(config: &Config) -> Self {
        Self::new(
            Box::new(MarkdownExtractor::new(config.granularity)),
            Box::new(PolibCatalogTool::new(config.translator.clone())),
            Box::new(PoStore),
            Box::new(MarkdownTranslator),
        )
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_post_processor<F>(mut self, post_processor: F) -> Self
    where
        F: Fn(&str, String, &ArtifactPaths) -> String + 'static,
    {
        self.post_processor = Some(Box::new(post_processor));
        self
    }

    /// Run the post-processor, if any, on `translated`.
    pub fn post_process(&self, input: &str, translated: String, paths: &ArtifactPaths) -> String {
        match &self.post_processor {
            Some(post_processor) => post_processor(input, translated, paths),
            None => translated,
        }
    }

    /// Stamp a freshly written artifact with the current time.
    pub fn stamp(&self, path: &Path) -> Result<()> {
        self.clock.stamp(path)
    }

    /// Load the catalog of `locale` from `all_po`.
    ///
    /// The catalog is parsed once and reused until
    /// [`Toolbox::forget_catalogs`] is called.
    pub fn locale_catalog(&self, locale: &str, all_po: &Path) -> Result<Rc<Catalog>> {
        if let Some(catalog) = self.locale_catalogs.borrow().get(locale) {
            return Ok(Rc::clone(catalog));
        }
        let catalog = Rc::new(self.store.parse_file(all_po)?);
        self.locale_catalogs
            .borrow_mut()
            .insert(String::from(locale), Rc::clone(&catalog));
        Ok(catalog)
    }

    /// Drop the cached locale catalogs, they are reloaded on demand.
    pub fn forget_catalogs(&self) {
        self.locale_catalogs.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Layout;
    use polib::message::Message;
    use polib::metadata::CatalogMetadata;
    use std::cell::Cell;

    struct CountingStore {
        parsed: Rc<Cell<usize>>,
    }

    impl CatalogStore for CountingStore {
        fn parse_file(&self, _path: &Path) -> Result<Catalog> {
            self.parsed.set(self.parsed.get() + 1);
            let mut catalog = Catalog::new(CatalogMetadata::new());
            catalog.append_or_update(
                Message::build_singular()
                    .with_msgid(String::from("Hello"))
                    .with_msgstr(String::from("Hallo"))
                    .done(),
            );
            Ok(catalog)
        }
    }

    fn counting_toolbox(parsed: Rc<Cell<usize>>) -> Toolbox {
        let config = Config::default();
        let builtin = Toolbox::builtin(&config);
        Toolbox::new(
            builtin.extractor,
            builtin.catalogs,
            Box::new(CountingStore { parsed }),
            builtin.translator,
        )
    }

    #[test]
    fn test_locale_catalog_is_cached() -> anyhow::Result<()> {
        let parsed = Rc::new(Cell::new(0));
        let toolbox = counting_toolbox(Rc::clone(&parsed));
        let all_po = Path::new("_po/de.po");

        toolbox.locale_catalog("de", all_po)?;
        toolbox.locale_catalog("de", all_po)?;
        assert_eq!(parsed.get(), 1);

        toolbox.forget_catalogs();
        toolbox.locale_catalog("de", all_po)?;
        assert_eq!(parsed.get(), 2);
        Ok(())
    }

    #[test]
    fn test_post_process_defaults_to_identity() {
        let paths = ArtifactPaths::new(&Layout::new(".", "_po"), "de", "guide.md");
        let toolbox = counting_toolbox(Rc::new(Cell::new(0)));
        assert_eq!(
            toolbox.post_process("Hello", String::from("Hallo"), &paths),
            "Hallo"
        );

        let toolbox = toolbox.with_post_processor(|input, translated, paths| {
            format!("<!-- {} from {input:?} -->\n{translated}", paths.locale)
        });
        assert_eq!(
            toolbox.post_process("Hello", String::from("Hallo"), &paths),
            "<!-- de from \"Hello\" -->\nHallo"
        );
    }

    #[test]
    fn test_header_field_names() {
        assert_eq!(
            HeaderField::VOLATILE.map(|field| field.name()),
            [
                "Report-Msgid-Bugs-To",
                "Last-Translator",
                "Language-Team",
                "POT-Creation-Date"
            ]
        );
    }
}
