pub mod error;
pub mod graph;
pub mod minimum_cost_flow;
pub mod shortest_path;

pub use error::{Error, Result};
