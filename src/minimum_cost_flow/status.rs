#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum SolutionStatus {
    #[default]
    Undefined,
    Optimal,
    Infeasible,
}

/// Position of an arc relative to the spanning-tree basis.
#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum ArcStatus {
    #[default]
    NonbasicLower,
    NonbasicUpper,
    Basic,
}
