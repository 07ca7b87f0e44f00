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

//! Run the translation tasks of a project.
//!
//! The project is described by an `i18n.toml` file:
//!
//! ```shell
//! i18n-tasks -T                  # list the tasks
//! i18n-tasks i18n:po:ja:update   # update the PO files for Japanese
//! i18n-tasks                     # translate everything
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use i18n_po_tasks::{Config, I18nTasks, Target};
use log::info;

#[derive(Debug, Parser)]
#[command(about = "Keep PO files and translated documents up to date")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, value_name = "i18n.toml", default_value = "i18n.toml")]
    config: PathBuf,
    /// List the tasks with their description and exit.
    #[arg(short = 'T', long)]
    list: bool,
    /// Tasks to run, in order.
    #[arg(value_name = "TASK", default_value = "i18n:translate")]
    tasks: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Could not load {}", cli.config.display()))?;

    if cli.list {
        let targets = Target::all(&config);
        let width = targets
            .iter()
            .map(|target| target.to_string().len())
            .max()
            .unwrap_or_default();
        for target in targets {
            if let Some(description) = target.description() {
                println!("{:width$}  # {description}", target.to_string());
            }
        }
        return Ok(());
    }

    let tasks = I18nTasks::new(config)?;
    for name in &cli.tasks {
        info!("Invoking {name}");
        tasks
            .run_named(name)
            .with_context(|| format!("Task {name} failed"))?;
    }
    Ok(())
}
