//! Output generation for the `events` command.
//!
//! # Submodules
//!
//! - [`json`]: Writes an `EventsResponse` to disk
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── 2024_March_4.json
//! └── 2024_March_5.json
//! ```

pub mod json;
