//! Storage-tree plumbing and text export

pub mod seabass;
pub mod tree;

pub use seabass::{SeaBassHeader, SeaBassWriter};
pub use tree::{Dataset, Group, Root};
