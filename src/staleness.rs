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

use crate::clock::modified;
use crate::paths::ArtifactPaths;
use crate::Result;

/// Check if the compacted catalog changed after it was last folded
/// back into the draft.
///
/// This is the case when the `po` file is strictly newer than the
/// `time_stamp` sentinel. A missing file means there is nothing to
/// fold back.
pub fn is_canonical_newer(paths: &ArtifactPaths) -> Result<bool> {
    let Some(po) = modified(&paths.po)? else {
        return Ok(false);
    };
    let Some(time_stamp) = modified(&paths.time_stamp)? else {
        return Ok(false);
    };
    Ok(po > time_stamp)
}
