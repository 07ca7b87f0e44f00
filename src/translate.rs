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

use std::fs;
use std::io;

use crate::paths::ArtifactPaths;
use crate::tools::Toolbox;
use crate::{Error, Result};

/// Write the translation of the source file of `paths`.
///
/// The catalog of the locale is read from `all.po`, once per build.
pub fn build_translated(toolbox: &Toolbox, paths: &ArtifactPaths) -> Result<()> {
    let catalog = toolbox.locale_catalog(&paths.locale, &paths.all_po)?;
    let input = fs::read_to_string(&paths.source).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::MissingSourceFile(paths.source.clone()),
        _ => Error::io(&paths.source)(err),
    })?;

    let translated = toolbox.translator.apply(&input, &catalog);
    let mut translated = toolbox.post_process(&input, translated, paths);
    if !translated.ends_with('\n') {
        translated.push('\n');
    }

    fs::create_dir_all(&paths.translated_dir).map_err(Error::io(&paths.translated_dir))?;
    fs::write(&paths.translated, translated).map_err(Error::io(&paths.translated))?;
    toolbox.stamp(&paths.translated)
}
