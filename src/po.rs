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

//! Compact the drafts into `po` files and the catalog of a locale.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use crate::clock::modified;
use crate::paths::ArtifactPaths;
use crate::tools::{ConcatOptions, HeaderField, SortOrder, Toolbox};
use crate::Result;

/// Compact `edit.po` into `po` and record that it was done.
pub fn build_po(toolbox: &Toolbox, paths: &ArtifactPaths) -> Result<()> {
    let mut remove_header_fields = HeaderField::VOLATILE.to_vec();
    remove_header_fields.push(HeaderField::PoRevisionDate);
    let options = ConcatOptions {
        sort: Some(SortOrder::ByFile),
        no_fuzzy: true,
        remove_header_fields,
    };
    toolbox
        .catalogs
        .concat(&[paths.edit_po.clone()], &paths.po, &options)?;
    toolbox.stamp(&paths.po)?;
    toolbox.clock.touch(&paths.time_stamp)
}

/// Order catalogs from the most to the least recently modified.
///
/// Catalogs with the same modification time keep their order.
pub fn newest_first(catalogs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut dated = catalogs
        .iter()
        .map(|path| Ok((modified(path)?, path.clone())))
        .collect::<Result<Vec<_>>>()?;
    dated.sort_by_key(|(mtime, _)| Reverse(*mtime));
    Ok(dated.into_iter().map(|(_, path)| path).collect())
}

/// Concatenate the `po` files of a locale into `all_po`.
///
/// When a message appears in several files, the translation from the
/// most recently modified file wins.
pub fn build_all_po(toolbox: &Toolbox, all_po: &Path, catalogs: &[PathBuf]) -> Result<()> {
    let inputs = newest_first(catalogs)?;
    let options = ConcatOptions {
        sort: Some(SortOrder::ByMsgid),
        no_fuzzy: true,
        remove_header_fields: Vec::new(),
    };
    toolbox.catalogs.concat(&inputs, all_po, &options)?;
    toolbox.stamp(all_po)
}
