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

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source file {} does not exist", .0.display())]
    MissingSourceFile(PathBuf),
    #[error("{tool} failed for {}: {message}", .path.display())]
    ExternalToolFailure {
        tool: &'static str,
        path: PathBuf,
        message: String,
    },
    #[error("Could not parse {} as PO file: {message}", .path.display())]
    MalformedCatalog { path: PathBuf, message: String },
    #[error("Don't know how to build task {0:?}")]
    UnknownTask(String),
    #[error("Circular dependency detected: {0}")]
    DependencyCycle(String),
    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// Build a closure which wraps an [`io::Error`] for `path`.
    ///
    /// Meant for `map_err`: `fs::read(&path).map_err(Error::io(&path))`.
    pub fn io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
        move |source| Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Build a closure which reports a failed tool invocation.
    pub fn tool<'a, E: std::fmt::Display>(
        tool: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(E) -> Error + 'a {
        move |err| Error::ExternalToolFailure {
            tool,
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
