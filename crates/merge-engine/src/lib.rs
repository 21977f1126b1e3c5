//! Quadcam Merge Engine
//!
//! Turns complete clip groups into quadrant composites by driving external
//! media tools, with bounded retries and a fixed-size worker pool.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ClipGroup ──► BatchCoordinator ──► RetrySupervisor ──► MergeExecutor
//!                  (worker pool)       (attempts,           │
//!                       │               backoff,            ├── MediaValidator ──► ffprobe
//!                       │               timeout)            │     (output, then inputs)
//!                       ▼                                   │
//!                  BatchReport                              └── Composer ──► ffmpeg
//!                       │
//!                       ▼
//!                 failures.log
//! ```

pub mod compose;
pub mod coordinator;
pub mod job;
pub mod probe;
pub mod process;
pub mod report;
pub mod retry;

pub use compose::*;
pub use coordinator::*;
pub use job::*;
pub use probe::*;
pub use report::*;
pub use retry::*;
