//! Collections provided by the crate.
//!
//! - `deque`: the bucket-backed double-ended queue and its cursors

pub mod deque;

pub use deque::{BucketDeque, Cursor, CursorMut, IntoIter, Iter, IterMut, BASE_SIZE};
