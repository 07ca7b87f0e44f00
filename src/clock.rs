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

//! Modification times of artifacts.
//!
//! Freshness is decided by comparing file modification times. Reading
//! them goes through [`modified`]; every artifact written by the tasks
//! is stamped with [`Clock::stamp`]. Tests swap in a clock which
//! advances by a fixed step on every call so that the order of writes
//! is visible in the mtimes without sleeping.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::{Error, Result};

/// Source of the times recorded on artifacts.
pub trait Clock {
    fn now(&self) -> SystemTime;

    /// Set the modification time of an existing file to [`Clock::now`].
    fn stamp(&self, path: &Path) -> Result<()> {
        let file = fs::File::options()
            .append(true)
            .open(path)
            .map_err(Error::io(path))?;
        file.set_modified(self.now()).map_err(Error::io(path))
    }

    /// Create `path` if needed and stamp it, like `touch(1)`.
    fn touch(&self, path: &Path) -> Result<()> {
        fs::File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(Error::io(path))?;
        self.stamp(path)
    }
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock which moves forward by `step` every time it is read.
#[derive(Debug)]
pub struct SteppingClock {
    next: std::cell::Cell<SystemTime>,
    step: std::time::Duration,
}

impl SteppingClock {
    pub fn new(start: SystemTime, step: std::time::Duration) -> Self {
        Self {
            next: std::cell::Cell::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> SystemTime {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

/// Return the modification time of `path`, or `None` if it does not
/// exist.
pub fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(metadata) => metadata.modified().map(Some).map_err(Error::io(path)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(path)(err)),
    }
}

/// Remove `path` if it exists.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::io(path)(err)),
    }
}
