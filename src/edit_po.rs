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

//! Build the `edit.po` draft of a source file.
//!
//! The draft is what translators edit. It is rebuilt in three stages:
//! the fresh template is merged in first, then the compacted `po`
//! file if it changed since, and finally the catalog of the whole
//! locale. Translations in the later stages take precedence.

use std::fs;
use std::path::Path;

use polib::po_file;

use crate::clock::{modified, remove_if_exists};
use crate::paths::ArtifactPaths;
use crate::staleness::is_canonical_newer;
use crate::tools::{ConcatOptions, HeaderField, MergeOptions, SortOrder, Toolbox};
use crate::{Error, Result};

/// Extract the template of the source file into `source.pot` and
/// normalize it into `pot`.
pub fn update_template(toolbox: &Toolbox, paths: &ArtifactPaths) -> Result<()> {
    fs::create_dir_all(&paths.po_dir).map_err(Error::io(&paths.po_dir))?;

    let catalog = toolbox
        .extractor
        .extract_template(&paths.source, &paths.reference)?;
    po_file::write(&catalog, &paths.source_pot)
        .map_err(Error::tool("xgettext", &paths.source_pot))?;
    toolbox.stamp(&paths.source_pot)?;

    let options = ConcatOptions {
        sort: Some(SortOrder::ByFile),
        no_fuzzy: false,
        remove_header_fields: HeaderField::VOLATILE.to_vec(),
    };
    toolbox
        .catalogs
        .concat(&[paths.source_pot.clone()], &paths.pot, &options)?;
    toolbox.stamp(&paths.pot)
}

/// Create the draft from the compacted catalog, or from the template
/// when there is no compacted catalog yet.
fn seed(toolbox: &Toolbox, paths: &ArtifactPaths) -> Result<()> {
    if paths.po.exists() {
        log::info!("Seeding {} from {}", paths.edit_po.display(), paths.po.display());
        fs::copy(&paths.po, &paths.edit_po).map_err(Error::io(&paths.edit_po))?;
    } else {
        toolbox
            .catalogs
            .init(&paths.pot, &paths.edit_po, &paths.locale)?;
    }
    toolbox.stamp(&paths.edit_po)
}

/// Let the translations of `definitions` override the draft.
fn merge_authoritative(toolbox: &Toolbox, definitions: &Path, edit_po: &Path) -> Result<()> {
    let options = MergeOptions {
        sort_by_file: true,
        no_fuzzy_matching: true,
        no_obsolete_entries: true,
    };
    toolbox
        .catalogs
        .merge(definitions, edit_po, edit_po, &options)?;
    toolbox.stamp(edit_po)
}

/// Bring the `edit.po` draft of `paths` up to date.
pub fn build_edit_po(toolbox: &Toolbox, paths: &ArtifactPaths) -> Result<()> {
    update_template(toolbox, paths)?;

    if is_canonical_newer(paths)? {
        log::info!(
            "{} changed, resetting {}",
            paths.po.display(),
            paths.edit_po.display()
        );
        remove_if_exists(&paths.edit_po)?;
        remove_if_exists(&paths.all_po)?;
    }

    if !paths.edit_po.exists() {
        seed(toolbox, paths)?;
    }

    let edit_po_mtime = modified(&paths.edit_po)?;
    let options = MergeOptions {
        sort_by_file: true,
        ..MergeOptions::default()
    };
    toolbox
        .catalogs
        .merge(&paths.edit_po, &paths.pot, &paths.edit_po, &options)?;
    toolbox.stamp(&paths.edit_po)?;

    if modified(&paths.po)? > edit_po_mtime {
        merge_authoritative(toolbox, &paths.po, &paths.edit_po)?;
    }
    if paths.all_po.exists() {
        merge_authoritative(toolbox, &paths.all_po, &paths.edit_po)?;
    }
    Ok(())
}
