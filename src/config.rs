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

//! Configuration of the translation tasks.
//!
//! The configuration is normally read from an `i18n.toml` file:
//!
//! ```toml
//! po-dir = "_po"
//! locales = ["ja", "pt-BR"]
//! files = ["index.md", "docs/install.md"]
//!
//! [translator]
//! name = "Jane Doe"
//! email = "jane@example.com"
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::paths::{ArtifactPaths, Layout};
use crate::{Error, Result};

/// The person recorded as `Last-Translator` in new catalogs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatorIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl TranslatorIdentity {
    /// Format the identity for the `Last-Translator` header.
    ///
    /// Without a name and an email address, the catalog is marked as
    /// automatically generated.
    pub fn header_value(&self) -> String {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => format!("{name} <{email}>"),
            (Some(name), None) => name.clone(),
            (None, Some(email)) => format!("<{email}>"),
            (None, None) => String::from("Automatically generated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Directory the source files are relative to. A relative path is
    /// resolved against the directory of the configuration file.
    pub base_dir: PathBuf,
    /// Directory for the PO files, relative to `base_dir`.
    pub po_dir: PathBuf,
    pub locales: Vec<String>,
    /// Source files, relative to `base_dir`.
    pub files: Vec<PathBuf>,
    pub translator: TranslatorIdentity,
    /// Round line numbers in `#:` references down to a multiple of
    /// this value. Use 0 to omit line numbers.
    pub granularity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            po_dir: PathBuf::from("_po"),
            locales: Vec::new(),
            files: Vec::new(),
            translator: TranslatorIdentity::default(),
            granularity: 1,
        }
    }
}

impl Config {
    /// Read and validate the configuration in `path`.
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(Error::io(path))?;
        let mut config = Config::from_toml(&text)?;
        if config.base_dir.is_relative() {
            if let Some(dir) = path.parent() {
                config.base_dir = dir.join(&config.base_dir);
            }
        }
        Ok(config)
    }

    /// Parse and validate a configuration.
    pub fn from_toml(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.locales.is_empty() {
            return Err(Error::Config(String::from("no locales configured")));
        }
        for locale in &self.locales {
            if locale.is_empty() || locale.contains(['/', '\\', ':']) || locale.starts_with('.') {
                return Err(Error::Config(format!("invalid locale {locale:?}")));
            }
        }
        for file in &self.files {
            let is_plain = file.components().all(|c| matches!(c, Component::Normal(_)));
            if file.as_os_str().is_empty() || !is_plain {
                return Err(Error::Config(format!(
                    "source file {} must be a relative path without \"..\" or \".\"",
                    file.display()
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.base_dir, &self.po_dir)
    }

    /// Artifact paths for every configured file in `locale`.
    pub fn artifacts(&self, locale: &str) -> Vec<ArtifactPaths> {
        let layout = self.layout();
        self.files
            .iter()
            .map(|file| ArtifactPaths::new(&layout, locale, file))
            .collect()
    }
}
