/*
 *  Copyright 2026 The Authors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! `taskqueue`: worker/spawner loops and queue administration over a
//! `taskqueue-core` store.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod address;
mod cli;
mod commands;
mod environment;
mod registry;
mod support;

use cli::{Cli, Commands};
use taskqueue_core::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let mut config = Config::from_env();
    if let Some(base_dir) = &cli.base_dir {
        config.base_dir = base_dir.clone();
    }
    if let Some(user) = &cli.user {
        config.default_user = user.clone();
    }
    let base_dir = config.base_dir.clone();
    let default_user = config.default_user.clone();

    match cli.command {
        Commands::Work { queue, tmid, id } => commands::work::run(&base_dir, &config, &default_user, &queue, tmid, id),
        Commands::Spawn { queue, timeout } => commands::spawn::run(&base_dir, &config, &default_user, &queue, timeout),
        Commands::Queues { glob } => commands::queues::run(&base_dir, &config, &default_user, &glob),
        Commands::Tasks { queue, tmid, id, state } => {
            commands::tasks::run(&base_dir, &config, &default_user, &queue, tmid, id, &state)
        }
        Commands::Pause { queue } => commands::pause_resume::pause(&base_dir, &config, &default_user, &queue),
        Commands::Resume { queue } => commands::pause_resume::resume(&base_dir, &config, &default_user, &queue),
        Commands::Delete { queue, force } => commands::delete::run(&base_dir, &config, &default_user, &queue, force),
        Commands::Retry { queue, state } => commands::retry::run(&base_dir, &config, &default_user, &queue, &state),
        Commands::Reap { queue, stale_after } => commands::reap::run(&base_dir, &config, &default_user, &queue, stale_after),
    }
}
