use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Contract, ContractResponsible, Matricula};

/// Read-only view over the contract-to-reviewer assignments.
///
/// The mapping itself is maintained by administrative CRUD elsewhere in the
/// portal; the workflow only resolves it.
pub trait ResponsibleDirectory: Send + Sync {
    fn lookup(&self, contract: &Contract) -> Option<ContractResponsible>;
}

/// Resolves which reviewer a practice is handed to at each stage.
///
/// The final validation stage deliberately bypasses this router: its
/// reviewer is the globally configured validator, not a per-contract lookup.
pub struct ResponsibilityRouter<D> {
    directory: Arc<D>,
}

impl<D> ResponsibilityRouter<D>
where
    D: ResponsibleDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// First-line reviewer, assigned when a practice is created.
    pub fn sesmt_reviewer(&self, contract: &Contract) -> Option<Matricula> {
        self.directory
            .lookup(contract)
            .map(|entry| entry.sesmt_reviewer)
    }

    /// Second-line reviewer, assigned when the SESMT stage passes.
    pub fn management_reviewer(&self, contract: &Contract) -> Option<Matricula> {
        self.directory
            .lookup(contract)
            .map(|entry| entry.management_reviewer)
    }
}

/// Non-fatal signal that a contract has no reviewer mapping.
///
/// The practice is left ownerless (stalled) rather than failing the
/// transition; fixing the directory is an administrative task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingWarning {
    UnassignedContract { contract: Contract },
}

impl RoutingWarning {
    pub fn message(&self) -> String {
        match self {
            RoutingWarning::UnassignedContract { contract } => format!(
                "no reviewer mapping configured for contract {}; practice left unassigned",
                contract.0
            ),
        }
    }
}
