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

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "taskqueue",
    version,
    about = "Durable task queue: worker and spawner loops, queue administration"
)]
pub struct Cli {
    /// Root directory under which `<user>/<queue>/queue.sqlite` files live.
    #[arg(long, global = true, env = "TASKQUEUE_BASE_DIR")]
    pub base_dir: Option<std::path::PathBuf>,

    /// User namespace used when a queue is addressed without a `user/` prefix.
    #[arg(long, global = true, env = "TASKQUEUE_USER")]
    pub user: Option<String>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the worker loop once against a single queue.
    Work {
        #[arg(short = 'q', long = "queue")]
        queue: String,

        /// Scope to tasks submitted under this manager id.
        #[arg(long)]
        tmid: Option<Uuid>,

        /// Scope to a single task id (stops after it is processed).
        #[arg(long)]
        id: Option<Uuid>,
    },

    /// Run the spawner loop against one or more queues.
    Spawn {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,

        /// Wall-clock budget for the loop, in seconds.
        #[arg(long, default_value_t = 3600)]
        timeout: u64,
    },

    /// List matching queues with a per-state summary.
    Queues {
        /// `user_glob/name_glob` pattern; `*` matches any run of characters.
        #[arg(short = 'q', long = "queue", default_value = "*/*")]
        glob: String,
    },

    /// List tasks in a queue.
    Tasks {
        #[arg(short = 'q', long = "queue")]
        queue: String,

        #[arg(long)]
        tmid: Option<Uuid>,

        #[arg(long)]
        id: Option<Uuid>,

        /// Defaults to FAILED (spec §6).
        #[arg(long, default_value = "FAILED")]
        state: String,
    },

    /// Stop a queue from handing out new work.
    Pause {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,
    },

    /// Resume a paused queue.
    Resume {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,
    },

    /// Delete one or more queues. Refuses without `--force`.
    Delete {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,

        #[arg(long)]
        force: bool,
    },

    /// Move tasks in a given state back to PENDING.
    Retry {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,

        /// Defaults to KILLED (spec §6).
        #[arg(long, default_value = "KILLED")]
        state: String,
    },

    /// Mark RUNNING tasks whose heartbeat has gone stale as UNKNOWN.
    Reap {
        #[arg(short = 'q', long = "queue", required = true)]
        queue: Vec<String>,

        /// Seconds a RUNNING task may go without a heartbeat before it is
        /// considered stale.
        #[arg(long, default_value_t = 3600)]
        stale_after: u64,
    },
}
