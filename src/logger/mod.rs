//! Activity logging: append-only JSONL behind a shared handle.

pub mod activity;
pub mod jsonl;
