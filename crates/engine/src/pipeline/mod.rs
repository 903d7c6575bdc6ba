//! Save, load and recover, implemented on [`SaveContext`](crate::SaveContext).
//!
//! All three share the context's scratch arena, so they must not overlap.

mod load;
mod recover;
mod save;
