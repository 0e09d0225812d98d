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

//! Diesel row models for the four store relations, and the versioned
//! binary payload codec used inside `tasks.payload` / `managers.payload`.

pub mod payload;
pub mod row;

pub use row::{ManagerRow, MetadataRow, NewManagerRow, NewRequireRow, NewTaskRow, RequireRow, TaskRow};
