use armguard_types::{ControlResult, OutcomeCounts};

/// Everything one evaluation produced for one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainReport {
    /// Feature-group order, then control order; nested results follow their parent's group.
    pub results: Vec<ControlResult>,
    pub resources_scanned: u32,
    pub counts: OutcomeCounts,
}

impl DomainReport {
    pub fn new(results: Vec<ControlResult>, resources_scanned: u32) -> Self {
        let counts = OutcomeCounts::from_results(&results);
        Self {
            results,
            resources_scanned,
            counts,
        }
    }
}
