mod change_handler;
pub mod network_model;
pub mod network_simplex;
mod pivot;
mod potentials;
pub mod pricing;
pub mod spanning_tree_structure;
pub mod status;

pub use network_model::{AttributeNames, Diagnostic, DiagnosticKind, SupplyConvention};
pub use network_simplex::NetworkSimplex;
pub use pricing::PricingStrategy;
pub use status::{ArcStatus, SolutionStatus};
