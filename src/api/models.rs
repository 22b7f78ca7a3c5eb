//! Typed representation of an external program tree.
//!
//! These are the ephemeral inputs to reconciliation: validated at the
//! registry boundary, walked once by the engine, never persisted.

/// Which registry endpoint family a fetch reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryDomain {
    /// Tracker and event programs (the program endpoint)
    Tracker,
    /// Aggregate datasets (the dataset endpoint)
    Aggregate,
}

impl std::fmt::Display for RegistryDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RegistryDomain::Tracker => "tracker",
            RegistryDomain::Aggregate => "aggregate",
        })
    }
}

/// Caller-supplied hint distinguishing tracker programs from event
/// programs when the registry payload does not say
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramType {
    Tracker,
    Event,
}

/// What kind of program a fetched tree describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramDomain {
    /// Registration program with tracked-entity attributes
    Tracker,
    /// Event program: stages and data elements only
    Event,
    /// Aggregate dataset, flattened into one synthetic stage
    Aggregate,
}

impl std::fmt::Display for ProgramDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProgramDomain::Tracker => "tracker",
            ProgramDomain::Event => "event",
            ProgramDomain::Aggregate => "aggregate",
        })
    }
}

/// One answer choice of an external option set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOption {
    pub value: String,
    pub code: Option<String>,
}

/// An external option set (or a category combination flattened into one:
/// option-combo names as values, combo ids as codes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOptionSet {
    pub id: String,
    pub name: String,
    pub options: Vec<ExternalOption>,
}

/// A data element or tracked-entity attribute as the engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalElement {
    pub id: String,
    pub label: String,
    pub value_type: Option<String>,
    pub option_set: Option<ExternalOptionSet>,
}

/// A program stage and its data elements, in declaration order.
/// Aggregate datasets have no stages; their elements arrive in one
/// synthetic stage with `id: None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStage {
    pub id: Option<String>,
    pub name: String,
    pub data_elements: Vec<ExternalElement>,
}

/// A fully validated external program, ready for reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProgramTree {
    pub id: String,
    pub name: String,
    pub domain: ProgramDomain,
    pub attributes: Vec<ExternalElement>,
    pub stages: Vec<ExternalStage>,
    pub category_combo: Option<ExternalOptionSet>,
}

impl ExternalProgramTree {
    /// Total number of data elements across all stages
    pub fn element_count(&self) -> usize {
        self.stages.iter().map(|s| s.data_elements.len()).sum()
    }
}
