//! Denesting - flatten export records and look fields up by name
//!
//! Export files nest the same information inconsistently, so each record is
//! flattened once into a [`FlatRecord`] and fields are then pulled out with
//! substring lookups instead of fixed paths.

pub mod flatten;
pub mod matcher;

pub use flatten::{flatten, FlatRecord, Flattener};
pub use matcher::{find_item, find_items, stringify};
