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

//! Queryable/Insertable row structs mapping onto the four store relations.

use diesel::prelude::*;

use crate::database::schema::{managers, metadata, requires, tasks};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
pub struct TaskRow {
    pub id: String,
    pub payload: Vec<u8>,
    pub state: String,
    pub manager_id: String,
    pub heartbeat_at: i64,
    pub rowid: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub id: String,
    pub payload: Vec<u8>,
    pub state: String,
    pub manager_id: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = requires)]
pub struct RequireRow {
    pub id: String,
    pub require: String,
}

pub type NewRequireRow = RequireRow;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = managers)]
pub struct ManagerRow {
    pub manager_id: String,
    pub payload: Vec<u8>,
}

pub type NewManagerRow = ManagerRow;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = metadata)]
pub struct MetadataRow {
    pub key: String,
    pub value: String,
}
