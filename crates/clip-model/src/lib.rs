//! Quadcam Clip Model
//!
//! Defines the data contracts for four-camera recorder batches:
//! - **Roles:** Which camera a clip came from, derived from its file name
//! - **Layout:** Where each camera lands on the composite canvas
//! - **Groups:** Clips sharing a recording timestamp, keyed by role
//! - **Scanning:** Recursive discovery and grouping of raw clips
//!
//! Clips and groups are built once during scanning and are read-only
//! afterwards.

pub mod clip;
pub mod layout;
pub mod role;
pub mod scan;
pub mod timestamp;

pub use clip::*;
pub use layout::*;
pub use role::*;
pub use scan::*;
pub use timestamp::*;
