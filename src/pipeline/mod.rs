//! Pipeline stages for one file conversion.
//!
//! ## Data Flow
//!
//! ```text
//! job ──▶ upload ──▶ wait ──▶ output
//! (graph)  (bytes)   (poll)   (download + rename)
//! ```
//!
//! 1. [`job`]    — build the three-task request and resolve the created
//!    job's tasks by role into a fixed record
//! 2. [`wait`]   — poll the export task with a bounded, growing interval
//! 3. [`output`] — derive the `.pdf` path and write it via a part file
//!
//! The upload itself is a single [`crate::api::CloudApi::upload`] call and
//! has no stage of its own.

pub mod job;
pub mod output;
pub mod wait;
