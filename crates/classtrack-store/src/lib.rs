//! # ClassTrack Store
//! JSON-file persistence, human-readable and git-friendly.
//! `students.json` holds the roster map; `logs.json` the append-only
//! audit log. Reads and writes are whole-file: the bot processes one
//! event at a time, so there is no finer-grained locking.

mod json_store;

pub use json_store::JsonStore;
