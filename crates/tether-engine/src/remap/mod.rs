//! Version-chained member renames
//!
//! A [`RemapTable`] records, per logical owner type, how member signatures
//! changed between releases. Lookups walk the chain of renames from the
//! release a member was declared against to the release actually loaded,
//! in either direction. Class renames are walked the same way so a type
//! can be found by its logical path on any release.

mod source;
mod table;

pub use source::{load_file, load_toml_str, RemapDocument, RemapSourceError};
pub use table::{ClassRemap, RemapEntry, RemapError, RemapResult, RemapTable, RemapTableBuilder, Remapped};
