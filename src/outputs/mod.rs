//! Output generation for merged article collections.
//!
//! # Submodules
//!
//! - [`json`]: Reads and writes the merged collection (and its backup copy)
//!   as pretty-printed JSON
//!
//! # Output Structure
//!
//! ```text
//! all_merged.json          # primary merged collection
//! backup_all_merged.json   # byte-identical backup copy
//! ```

pub mod json;
