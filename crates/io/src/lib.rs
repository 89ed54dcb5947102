#![forbid(unsafe_code)]

pub mod labels;
pub mod pcd;
pub mod sparse;

pub use labels::{read_labels, write_labels};
pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use sparse::write_sparse;
