//! Offline services over the engine's databases.

pub mod memo_tool;

pub use memo_tool::{MemoOperation, MemoTool};
