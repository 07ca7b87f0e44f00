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

//! The named translation tasks and the graph behind them.
//!
//! | Task                      | Effect                                    |
//! |---------------------------|-------------------------------------------|
//! | `i18n:po:edit:<l>:update` | update the `.edit.po` drafts of `<l>`     |
//! | `i18n:po:<l>:update`      | update the `.po` files and `<l>.po`       |
//! | `i18n:po:update`          | `i18n:po:<l>:update` for every locale     |
//! | `i18n:<l>:translate`      | write the translated files of `<l>`       |
//! | `i18n:translate`          | `i18n:<l>:translate` for every locale     |
//! | `i18n:clean`              | remove drafts, templates and `<l>.po`     |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::clock::remove_if_exists;
use crate::edit_po::build_edit_po;
use crate::graph::{NodeKey, TaskGraph};
use crate::po::{build_all_po, build_po};
use crate::staleness::is_canonical_newer;
use crate::tools::Toolbox;
use crate::translate::build_translated;
use crate::{Config, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Makes the drafts depending on it out of date.
    Force,
    EditPoUpdate(String),
    PoUpdate(String),
    PoUpdateAll,
    Translate(String),
    TranslateAll,
    Clean,
}

impl Target {
    /// The targets a user can invoke, in listing order.
    pub fn all(config: &Config) -> Vec<Target> {
        let mut targets = Vec::new();
        for locale in &config.locales {
            targets.push(Target::EditPoUpdate(locale.clone()));
            targets.push(Target::PoUpdate(locale.clone()));
        }
        targets.push(Target::PoUpdateAll);
        for locale in &config.locales {
            targets.push(Target::Translate(locale.clone()));
        }
        targets.push(Target::TranslateAll);
        targets.push(Target::Clean);
        targets
    }

    /// One line describing the target, if it is meant to be invoked
    /// directly.
    pub fn description(&self) -> Option<String> {
        match self {
            Target::Force => None,
            Target::EditPoUpdate(locale) => {
                Some(format!("Update .edit.po files for [{locale}] locale"))
            }
            Target::PoUpdate(locale) => Some(format!("Update .po files for [{locale}] locale")),
            Target::PoUpdateAll => Some(String::from("Update .po files for all locales")),
            Target::Translate(locale) => Some(format!("Translate files for [{locale}] locale")),
            Target::TranslateAll => Some(String::from("Translate files for all locales")),
            Target::Clean => Some(String::from(
                "Remove .edit.po, .pot and time stamp files and the locale catalogs",
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Force => write!(f, "i18n:internal:force"),
            Target::EditPoUpdate(locale) => write!(f, "i18n:po:edit:{locale}:update"),
            Target::PoUpdate(locale) => write!(f, "i18n:po:{locale}:update"),
            Target::PoUpdateAll => write!(f, "i18n:po:update"),
            Target::Translate(locale) => write!(f, "i18n:{locale}:translate"),
            Target::TranslateAll => write!(f, "i18n:translate"),
            Target::Clean => write!(f, "i18n:clean"),
        }
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(name: &str) -> Result<Target> {
        let unknown = || Error::UnknownTask(String::from(name));
        let rest = name.strip_prefix("i18n:").ok_or_else(unknown)?;
        let target = match rest {
            "internal:force" => Target::Force,
            "po:update" => Target::PoUpdateAll,
            "translate" => Target::TranslateAll,
            "clean" => Target::Clean,
            _ => {
                let locale_between = |prefix: &str, suffix: &str| {
                    rest.strip_prefix(prefix)
                        .and_then(|rest| rest.strip_suffix(suffix))
                        .filter(|locale| !locale.is_empty() && !locale.contains(':'))
                        .map(String::from)
                };
                if let Some(locale) = locale_between("po:edit:", ":update") {
                    Target::EditPoUpdate(locale)
                } else if let Some(locale) = locale_between("po:", ":update") {
                    Target::PoUpdate(locale)
                } else if let Some(locale) = locale_between("", ":translate") {
                    Target::Translate(locale)
                } else {
                    return Err(unknown());
                }
            }
        };
        Ok(target)
    }
}

/// Files removed by `i18n:clean`.
fn clean_list(config: &Config) -> Vec<PathBuf> {
    let layout = config.layout();
    let mut paths = Vec::new();
    for locale in &config.locales {
        for artifacts in config.artifacts(locale) {
            paths.push(artifacts.edit_po);
            paths.push(artifacts.time_stamp);
            paths.push(artifacts.pot);
            paths.push(artifacts.source_pot);
        }
        paths.push(layout.all_po(locale));
    }
    paths
}

/// Build the task graph for `config`.
///
/// The graph looks at the files on disk: a draft whose `po` file
/// changed since it was last compacted is forced to rebuild.
pub fn define(config: &Config) -> Result<TaskGraph<Toolbox>> {
    let layout = config.layout();
    let mut graph = TaskGraph::new();
    graph.phony(Target::Force, Vec::new(), None);

    for locale in &config.locales {
        let artifacts = config.artifacts(locale);

        let mut edit_pos = Vec::new();
        for paths in &artifacts {
            graph.directory(&paths.po_dir);
            let mut deps = vec![NodeKey::path(&paths.source), NodeKey::path(&paths.po_dir)];
            if is_canonical_newer(paths)? {
                deps.push(Target::Force.into());
            }
            let action_paths = paths.clone();
            graph.file(&paths.edit_po, deps, move |toolbox: &Toolbox| {
                build_edit_po(toolbox, &action_paths)
            });
            edit_pos.push(NodeKey::path(&paths.edit_po));
        }
        graph.phony(Target::EditPoUpdate(locale.clone()), edit_pos, None);

        let mut pos = Vec::new();
        for paths in &artifacts {
            let action_paths = paths.clone();
            graph.file(
                &paths.po,
                vec![NodeKey::path(&paths.edit_po)],
                move |toolbox: &Toolbox| build_po(toolbox, &action_paths),
            );
            pos.push(paths.po.clone());
        }
        let all_po = layout.all_po(locale);
        let all_po_deps = pos.iter().map(NodeKey::path).collect();
        let action_all_po = all_po.clone();
        graph.file(&all_po, all_po_deps, move |toolbox: &Toolbox| {
            build_all_po(toolbox, &action_all_po, &pos)
        });
        graph.phony(
            Target::PoUpdate(locale.clone()),
            vec![NodeKey::path(&all_po)],
            None,
        );

        let mut translated = Vec::new();
        for paths in &artifacts {
            graph.directory(&paths.translated_dir);
            let deps = vec![
                NodeKey::path(&paths.source),
                Target::PoUpdate(locale.clone()).into(),
                NodeKey::path(&paths.translated_dir),
            ];
            let action_paths = paths.clone();
            graph.file(&paths.translated, deps, move |toolbox: &Toolbox| {
                build_translated(toolbox, &action_paths)
            });
            translated.push(NodeKey::path(&paths.translated));
        }
        graph.phony(Target::Translate(locale.clone()), translated, None);
    }

    let per_locale = |target: fn(String) -> Target| {
        config
            .locales
            .iter()
            .map(|locale| NodeKey::Target(target(locale.clone())))
            .collect::<Vec<_>>()
    };
    graph.phony(Target::PoUpdateAll, per_locale(Target::PoUpdate), None);
    graph.phony(Target::TranslateAll, per_locale(Target::Translate), None);

    let cleanup = clean_list(config);
    graph.phony(
        Target::Clean,
        Vec::new(),
        Some(Box::new(move |_: &Toolbox| -> Result<()> {
            for path in &cleanup {
                remove_if_exists(path)?;
            }
            Ok(())
        })),
    );

    Ok(graph)
}

/// The translation tasks of a project.
pub struct I18nTasks {
    config: Config,
    toolbox: Toolbox,
}

impl I18nTasks {
    /// Use the builtin Markdown and polib tools.
    pub fn new(config: Config) -> Result<Self> {
        let toolbox = Toolbox::builtin(&config);
        Self::with_toolbox(config, toolbox)
    }

    pub fn with_toolbox(config: Config, toolbox: Toolbox) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, toolbox })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    /// Bring `target` up to date.
    ///
    /// The graph is built from the current state of the files, so
    /// every run sees the changes of the previous ones.
    pub fn run(&self, target: &Target) -> Result<()> {
        let graph = define(&self.config)?;
        self.toolbox.forget_catalogs();
        graph.invoke(&NodeKey::Target(target.clone()), &self.toolbox)
    }

    /// Parse `name` and run the target.
    pub fn run_named(&self, name: &str) -> Result<()> {
        self.run(&name.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{modified, SteppingClock};
    use crate::edit_po::tests::{pairs, translations, write_catalog};
    use crate::paths::ArtifactPaths;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::time::{Duration, SystemTime};

    fn setup(files: &[(&str, &str)]) -> anyhow::Result<(tempfile::TempDir, I18nTasks)> {
        let tmpdir = tempfile::tempdir()?;
        let config = Config {
            base_dir: tmpdir.path().to_path_buf(),
            locales: vec![String::from("ja")],
            files: files.iter().map(|(path, _)| PathBuf::from(path)).collect(),
            ..Config::default()
        };
        let clock = SteppingClock::new(SystemTime::now(), Duration::from_secs(1));
        let toolbox = Toolbox::builtin(&config).with_clock(clock);
        let tasks = I18nTasks::with_toolbox(config, toolbox)?;
        for (path, text) in files {
            let path = tmpdir.path().join(path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, text)?;
            tasks.toolbox().stamp(&path)?;
        }
        Ok((tmpdir, tasks))
    }

    fn artifacts(tasks: &I18nTasks) -> ArtifactPaths {
        let config = tasks.config();
        ArtifactPaths::new(&config.layout(), "ja", &config.files[0])
    }

    #[test]
    fn test_target_names() -> anyhow::Result<()> {
        let ja = || String::from("ja");
        for (target, name) in [
            (Target::Force, "i18n:internal:force"),
            (Target::EditPoUpdate(ja()), "i18n:po:edit:ja:update"),
            (Target::PoUpdate(ja()), "i18n:po:ja:update"),
            (Target::PoUpdateAll, "i18n:po:update"),
            (Target::Translate(ja()), "i18n:ja:translate"),
            (Target::TranslateAll, "i18n:translate"),
            (Target::Clean, "i18n:clean"),
        ] {
            assert_eq!(target.to_string(), name);
            assert_eq!(name.parse::<Target>()?, target);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_names() {
        for name in ["translate", "i18n:", "i18n:po:edit::update", "i18n:a:b:translate"] {
            assert!(
                matches!(name.parse::<Target>(), Err(Error::UnknownTask(_))),
                "{name:?} should not parse"
            );
        }
    }

    #[test]
    fn test_listing() {
        let config = Config {
            locales: vec![String::from("ja"), String::from("fr")],
            ..Config::default()
        };
        let listing = Target::all(&config)
            .iter()
            .map(|target| target.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            listing,
            [
                "i18n:po:edit:ja:update",
                "i18n:po:ja:update",
                "i18n:po:edit:fr:update",
                "i18n:po:fr:update",
                "i18n:po:update",
                "i18n:ja:translate",
                "i18n:fr:translate",
                "i18n:translate",
                "i18n:clean",
            ]
        );
        assert!(Target::all(&config)
            .iter()
            .all(|target| target.description().is_some()));
        assert_eq!(Target::Force.description(), None);
    }

    #[test]
    fn test_graph_has_every_target() -> anyhow::Result<()> {
        let config = Config {
            locales: vec![String::from("ja")],
            files: vec![PathBuf::from("guide.md")],
            ..Config::default()
        };
        let graph = define(&config)?;
        for target in Target::all(&config) {
            assert!(graph.contains(&target.into()));
        }
        assert!(graph.contains(&Target::Force.into()));
        Ok(())
    }

    #[test]
    fn test_end_to_end() -> anyhow::Result<()> {
        let (tmpdir, tasks) = setup(&[("guide.md", "Hello\n")])?;
        let paths = artifacts(&tasks);

        tasks.run(&Target::TranslateAll)?;
        assert_eq!(fs::read_to_string(tmpdir.path().join("ja/guide.md"))?, "Hello\n");
        assert!(tmpdir.path().join("_po/ja/guide.pot").exists());
        assert_eq!(translations(&paths.edit_po), pairs(&[("Hello", "")]));

        // A translator fills in the draft.
        write_catalog(
            tasks.toolbox(),
            &paths.edit_po,
            "guide.md",
            &[("Hello", "こんにちは")],
        )?;

        tasks.run_named("i18n:po:ja:update")?;
        assert_eq!(
            translations(&tmpdir.path().join("_po/ja/guide.po")),
            pairs(&[("Hello", "こんにちは")])
        );
        assert_eq!(
            translations(&tmpdir.path().join("_po/ja.po")),
            pairs(&[("Hello", "こんにちは")])
        );

        tasks.run_named("i18n:translate")?;
        assert_eq!(
            fs::read_to_string(tmpdir.path().join("ja/guide.md"))?,
            "こんにちは\n"
        );
        Ok(())
    }

    #[test]
    fn test_fresh_draft_is_not_rebuilt() -> anyhow::Result<()> {
        let (_tmpdir, tasks) = setup(&[("docs/guide.md", "Hello\n")])?;
        let paths = artifacts(&tasks);

        tasks.run(&Target::TranslateAll)?;
        let edit_po = modified(&paths.edit_po)?;
        let po = modified(&paths.po)?;
        assert!(edit_po.is_some());

        tasks.run(&Target::TranslateAll)?;
        assert_eq!(modified(&paths.edit_po)?, edit_po);
        assert_eq!(modified(&paths.po)?, po);
        assert!(paths.translated.exists());
        Ok(())
    }

    #[test]
    fn test_edited_po_forces_draft_reset() -> anyhow::Result<()> {
        let (_tmpdir, tasks) = setup(&[("guide.md", "Hello\n")])?;
        let paths = artifacts(&tasks);
        tasks.run(&Target::PoUpdateAll)?;
        assert!(paths.all_po.exists());

        // The compacted catalog is edited directly.
        write_catalog(tasks.toolbox(), &paths.po, "guide.md", &[("Hello", "やあ")])?;

        tasks.run(&Target::EditPoUpdate(String::from("ja")))?;
        assert!(!paths.all_po.exists());
        assert_eq!(translations(&paths.edit_po), pairs(&[("Hello", "やあ")]));
        Ok(())
    }

    #[test]
    fn test_clean() -> anyhow::Result<()> {
        let (_tmpdir, tasks) = setup(&[("guide.md", "Hello\n")])?;
        let paths = artifacts(&tasks);
        tasks.run(&Target::TranslateAll)?;

        tasks.run(&Target::Clean)?;
        for removed in [
            &paths.edit_po,
            &paths.time_stamp,
            &paths.pot,
            &paths.source_pot,
            &paths.all_po,
        ] {
            assert!(!removed.exists(), "{} should be removed", removed.display());
        }
        assert!(paths.po.exists());
        assert!(paths.translated.exists());

        // Cleaning twice is fine.
        tasks.run(&Target::Clean)?;
        Ok(())
    }

    #[test]
    fn test_missing_source_file() -> anyhow::Result<()> {
        let (tmpdir, tasks) = setup(&[("guide.md", "Hello\n")])?;
        fs::remove_file(tmpdir.path().join("guide.md"))?;
        assert!(matches!(
            tasks.run(&Target::TranslateAll),
            Err(Error::MissingSourceFile(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unconfigured_locale() -> anyhow::Result<()> {
        let (_tmpdir, tasks) = setup(&[("guide.md", "Hello\n")])?;
        assert!(matches!(
            tasks.run_named("i18n:fr:translate"),
            Err(Error::UnknownTask(name)) if name == "i18n:fr:translate"
        ));
        Ok(())
    }
}
