//! Descriptor bookkeeping.
//!
//! Components allocate their bind groups from a fixed-capacity `BindingTable`
//! and address them through typed handles instead of raw heap offsets.

mod table;

pub use table::{BindingError, BindingHandle, BindingTable};
