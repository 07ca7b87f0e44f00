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

//! Paths of the artifacts derived from a source file.
//!
//! Everything here is plain path arithmetic: nothing touches the
//! filesystem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The two roots every artifact path is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory the source files and the translated files are
    /// relative to.
    pub base_dir: PathBuf,
    /// Directory holding the PO files, relative to `base_dir`.
    pub po_dir: PathBuf,
}

impl Layout {
    pub fn new<B: Into<PathBuf>, P: Into<PathBuf>>(base_dir: B, po_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            po_dir: po_dir.into(),
        }
    }

    /// The PO directory as seen from the current directory.
    pub fn po_root(&self) -> PathBuf {
        self.base_dir.join(&self.po_dir)
    }

    /// The catalog with all translations for `locale`.
    pub fn all_po(&self, locale: &str) -> PathBuf {
        self.po_root().join(format!("{locale}.po"))
    }
}

/// All artifacts of one source file in one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub locale: String,
    /// The source file as configured, used in `#:` references.
    pub reference: PathBuf,
    /// The source file as seen from the current directory.
    pub source: PathBuf,
    /// Directory holding the PO family of files below.
    pub po_dir: PathBuf,
    pub source_pot: PathBuf,
    pub pot: PathBuf,
    pub edit_po: PathBuf,
    pub po: PathBuf,
    pub time_stamp: PathBuf,
    pub all_po: PathBuf,
    pub translated: PathBuf,
    pub translated_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(layout: &Layout, locale: &str, source: P) -> Self {
        let reference = source.as_ref().to_path_buf();

        let mut po_dir = layout.po_root().join(locale);
        if let Some(parent) = reference.parent().filter(|p| !p.as_os_str().is_empty()) {
            po_dir.push(parent);
        }
        let stem = reference.file_stem().unwrap_or_default();
        let with_extension = |extension: &str| {
            let mut file_name = OsString::from(stem);
            file_name.push(".");
            file_name.push(extension);
            po_dir.join(file_name)
        };

        let translated = layout.base_dir.join(locale).join(&reference);
        let translated_dir = translated
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| layout.base_dir.join(locale));

        Self {
            locale: String::from(locale),
            source: layout.base_dir.join(&reference),
            source_pot: with_extension("source.pot"),
            pot: with_extension("pot"),
            edit_po: with_extension("edit.po"),
            po: with_extension("po"),
            time_stamp: with_extension("time_stamp"),
            all_po: layout.all_po(locale),
            translated,
            translated_dir,
            po_dir,
            reference,
        }
    }
}
