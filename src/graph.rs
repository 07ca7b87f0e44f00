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

//! A small make-like dependency graph.
//!
//! There are three kinds of nodes:
//!
//! - file nodes run their action when the file is missing or older
//!   than one of their dependencies,
//! - directory nodes create the directory when it is missing, they
//!   never make their dependents out of date,
//! - phony nodes always run and make every file depending on them out
//!   of date.
//!
//! A path which is not registered is a leaf: it must exist on disk.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::clock::modified;
use crate::tasks::Target;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Target(Target),
    Path(PathBuf),
}

impl NodeKey {
    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        NodeKey::Path(path.into())
    }
}

impl From<Target> for NodeKey {
    fn from(target: Target) -> Self {
        NodeKey::Target(target)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Target(target) => write!(f, "{target}"),
            NodeKey::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// When a node was last brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stamp {
    /// Older than everything, such as a directory.
    Early,
    At(SystemTime),
    /// Newer than everything, such as a phony node.
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Directory,
    Phony,
}

pub type Action<C> = Box<dyn Fn(&C) -> Result<()>>;

struct Node<C> {
    kind: Kind,
    deps: Vec<NodeKey>,
    action: Option<Action<C>>,
}

/// The nodes visited during one invocation.
#[derive(Default)]
struct Evaluation {
    done: HashMap<NodeKey, Stamp>,
    active: HashSet<NodeKey>,
    stack: Vec<NodeKey>,
}

/// A dependency graph whose actions receive a context of type `C`.
pub struct TaskGraph<C> {
    nodes: HashMap<NodeKey, Node<C>>,
}

impl<C> Default for TaskGraph<C> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<C> TaskGraph<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file built by `action`.
    ///
    /// Registering the same file again adds the dependencies and
    /// replaces the action.
    pub fn file<P, F>(&mut self, path: P, deps: Vec<NodeKey>, action: F)
    where
        P: Into<PathBuf>,
        F: Fn(&C) -> Result<()> + 'static,
    {
        let node = self.nodes.entry(NodeKey::path(path)).or_insert(Node {
            kind: Kind::File,
            deps: Vec::new(),
            action: None,
        });
        node.kind = Kind::File;
        for dep in deps {
            if !node.deps.contains(&dep) {
                node.deps.push(dep);
            }
        }
        node.action = Some(Box::new(action));
    }

    /// Register a directory which is created when missing.
    pub fn directory<P: Into<PathBuf>>(&mut self, path: P) {
        self.nodes.entry(NodeKey::path(path)).or_insert(Node {
            kind: Kind::Directory,
            deps: Vec::new(),
            action: None,
        });
    }

    /// Register a target which always runs after its dependencies.
    pub fn phony(&mut self, target: Target, deps: Vec<NodeKey>, action: Option<Action<C>>) {
        self.nodes.insert(
            NodeKey::Target(target),
            Node {
                kind: Kind::Phony,
                deps,
                action,
            },
        );
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Bring `key` and everything it depends on up to date.
    ///
    /// Every node runs at most once. The first failing action stops
    /// the evaluation.
    pub fn invoke(&self, key: &NodeKey, context: &C) -> Result<()> {
        let mut evaluation = Evaluation::default();
        self.visit(key, context, &mut evaluation)?;
        Ok(())
    }

    fn visit(&self, key: &NodeKey, context: &C, evaluation: &mut Evaluation) -> Result<Stamp> {
        if let Some(stamp) = evaluation.done.get(key) {
            return Ok(*stamp);
        }
        if evaluation.active.contains(key) {
            let chain = evaluation
                .stack
                .iter()
                .skip_while(|k| *k != key)
                .chain(std::iter::once(key))
                .map(NodeKey::to_string)
                .collect::<Vec<_>>();
            return Err(Error::DependencyCycle(chain.join(" => ")));
        }

        let Some(node) = self.nodes.get(key) else {
            return leaf_stamp(key);
        };

        evaluation.active.insert(key.clone());
        evaluation.stack.push(key.clone());
        let mut newest = Stamp::Early;
        for dep in &node.deps {
            newest = newest.max(self.visit(dep, context, evaluation)?);
        }
        evaluation.stack.pop();
        evaluation.active.remove(key);

        let stamp = match (node.kind, key) {
            (Kind::File, NodeKey::Path(path)) => {
                let needed = match modified(path)? {
                    None => true,
                    Some(mtime) => newest > Stamp::At(mtime),
                };
                if needed {
                    self.run(key, node, context)?;
                } else {
                    log::debug!("{key} is up to date");
                }
                modified(path)?.map_or(Stamp::Late, Stamp::At)
            }
            (Kind::Directory, NodeKey::Path(path)) => {
                if !path.is_dir() {
                    log::info!("Creating {}", path.display());
                    fs::create_dir_all(path).map_err(Error::io(path))?;
                }
                Stamp::Early
            }
            _ => {
                self.run(key, node, context)?;
                Stamp::Late
            }
        };
        evaluation.done.insert(key.clone(), stamp);
        Ok(stamp)
    }

    fn run(&self, key: &NodeKey, node: &Node<C>, context: &C) -> Result<()> {
        if let Some(action) = &node.action {
            log::info!("Running {key}");
            action(context)?;
        }
        Ok(())
    }
}

fn leaf_stamp(key: &NodeKey) -> Result<Stamp> {
    match key {
        NodeKey::Path(path) => match modified(path)? {
            Some(mtime) => Ok(Stamp::At(mtime)),
            None => Err(Error::MissingSourceFile(path.clone())),
        },
        NodeKey::Target(target) => Err(Error::UnknownTask(target.to_string())),
    }
}
