pub mod dynamic_shortest_path;

pub use dynamic_shortest_path::DynamicShortestPath;
