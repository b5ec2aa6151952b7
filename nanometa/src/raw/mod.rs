//! Structures mirroring the on-disk ECMA-335 layout of a compiled managed
//! assembly: the PE/COFF container, the CLI header, the metadata heaps and
//! tables, and IL method bodies. Everything here is read-only and
//! index-based (tokens, coded indices); [`crate::loader`] turns it into the
//! resolved object graph the lowering pipeline consumes.

pub mod assembly;
pub mod heaps;
pub mod il;
pub mod indices;
pub mod pe;
