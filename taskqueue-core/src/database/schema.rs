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

//! Diesel table definitions for the four store relations (spec §4.1).

diesel::table! {
    tasks (id) {
        id -> Text,
        payload -> Binary,
        state -> Text,
        manager_id -> Text,
        heartbeat_at -> BigInt,
        rowid -> BigInt,
    }
}

diesel::table! {
    requires (id, require) {
        id -> Text,
        require -> Text,
    }
}

diesel::table! {
    managers (manager_id) {
        manager_id -> Text,
        payload -> Binary,
    }
}

diesel::table! {
    metadata (key) {
        key -> Text,
        value -> Text,
    }
}
