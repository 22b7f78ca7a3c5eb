//! Wire-format DTOs for registry payloads.
//!
//! The registry nests elements behind junction objects
//! (`programStageDataElements` wrapping `dataElement`, and so on).
//! These types mirror that shape exactly and flatten into the typed
//! tree at the boundary; unknown payload fields are ignored.

use serde::Deserialize;

use super::models::{
    ExternalElement, ExternalOption, ExternalOptionSet, ExternalProgramTree, ExternalStage,
    ProgramDomain, ProgramType,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProgram {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub program_type: Option<String>,
    #[serde(default)]
    pub program_tracked_entity_attributes: Vec<WireProgramAttribute>,
    #[serde(default)]
    pub program_stages: Vec<WireStage>,
    #[serde(default)]
    pub category_combo: Option<WireCategoryCombo>,
}

/// Junction row wrapping a tracked-entity attribute
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProgramAttribute {
    #[serde(default)]
    pub tracked_entity_attribute: Option<WireElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub program_stage_data_elements: Vec<WireStageElement>,
}

/// Junction row wrapping a data element
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStageElement {
    #[serde(default)]
    pub data_element: Option<WireElement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireElement {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub option_set: Option<WireOptionSet>,
}

impl WireElement {
    fn into_element(self) -> ExternalElement {
        let label = display_or_name(self.display_name, self.name);
        ExternalElement {
            id: self.id,
            label,
            value_type: self.value_type,
            option_set: self.option_set.map(WireOptionSet::into_option_set),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOptionSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<WireOption>,
}

impl WireOptionSet {
    fn into_option_set(self) -> ExternalOptionSet {
        ExternalOptionSet {
            id: self.id,
            name: self.name,
            options: self
                .options
                .into_iter()
                .map(|option| ExternalOption {
                    value: option.name,
                    code: option.code,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOption {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCategoryCombo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_option_combos: Vec<WireComboOption>,
}

impl WireCategoryCombo {
    /// A category combination behaves like an option set whose values
    /// are the option-combo names, with the combo ids as codes.
    fn into_option_set(self) -> ExternalOptionSet {
        ExternalOptionSet {
            id: self.id,
            name: self.name,
            options: self
                .category_option_combos
                .into_iter()
                .map(|combo| ExternalOption {
                    value: combo.name,
                    code: Some(combo.id),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComboOption {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDataSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub data_set_elements: Vec<WireDataSetElement>,
    #[serde(default)]
    pub category_combo: Option<WireCategoryCombo>,
}

/// Junction row wrapping a dataset data element
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDataSetElement {
    #[serde(default)]
    pub data_element: Option<WireElement>,
}

impl WireProgram {
    /// Flatten the junction-heavy payload into the typed tree.
    ///
    /// The caller's program-type hint wins over the payload's
    /// `programType`; with neither, the program is treated as tracker.
    pub fn into_tree(self, type_hint: Option<ProgramType>) -> ExternalProgramTree {
        let domain = match type_hint {
            Some(ProgramType::Tracker) => ProgramDomain::Tracker,
            Some(ProgramType::Event) => ProgramDomain::Event,
            None => match self.program_type.as_deref() {
                Some("WITHOUT_REGISTRATION") => ProgramDomain::Event,
                _ => ProgramDomain::Tracker,
            },
        };

        let attributes = self
            .program_tracked_entity_attributes
            .into_iter()
            .filter_map(|junction| match junction.tracked_entity_attribute {
                Some(attribute) => Some(attribute.into_element()),
                None => {
                    log::warn!("Skipping attribute junction without a trackedEntityAttribute");
                    None
                }
            })
            .collect();

        let stages = self
            .program_stages
            .into_iter()
            .map(|stage| ExternalStage {
                id: stage.id,
                name: stage.name,
                data_elements: stage
                    .program_stage_data_elements
                    .into_iter()
                    .filter_map(|junction| match junction.data_element {
                        Some(element) => Some(element.into_element()),
                        None => {
                            log::warn!("Skipping stage junction without a dataElement");
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        ExternalProgramTree {
            id: self.id,
            name: display_or_name(self.display_name, self.name),
            domain,
            attributes,
            stages,
            category_combo: self.category_combo.map(WireCategoryCombo::into_option_set),
        }
    }
}

impl WireDataSet {
    /// Datasets have no stages; their elements land in one synthetic
    /// stage with no external stage id.
    pub fn into_tree(self) -> ExternalProgramTree {
        let name = display_or_name(self.display_name, self.name);

        let data_elements = self
            .data_set_elements
            .into_iter()
            .filter_map(|junction| match junction.data_element {
                Some(element) => Some(element.into_element()),
                None => {
                    log::warn!("Skipping dataset junction without a dataElement");
                    None
                }
            })
            .collect();

        ExternalProgramTree {
            id: self.id,
            name: name.clone(),
            domain: ProgramDomain::Aggregate,
            attributes: Vec::new(),
            stages: vec![ExternalStage {
                id: None,
                name,
                data_elements,
            }],
            category_combo: self.category_combo.map(WireCategoryCombo::into_option_set),
        }
    }
}

fn display_or_name(display_name: Option<String>, name: String) -> String {
    match display_name {
        Some(label) if !label.trim().is_empty() => label,
        _ => name,
    }
}
