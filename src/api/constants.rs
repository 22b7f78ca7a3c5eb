//! Endpoint and field-selection constants for the external registry API

/// Base API path of the registry
pub const API_BASE_PATH: &str = "/api";

/// Field selection for program fetches. The registry returns only the
/// named fields, trimming payloads to the slices reconciliation reads.
pub const PROGRAM_FIELDS: &str = "id,name,displayName,programType,\
    programTrackedEntityAttributes[trackedEntityAttribute[id,name,displayName,valueType,\
    optionSet[id,name,options[name,code]]]],\
    programStages[id,name,programStageDataElements[dataElement[id,name,displayName,valueType,\
    optionSet[id,name,options[name,code]]]]],\
    categoryCombo[id,name,categoryOptionCombos[id,name]]";

/// Field selection for dataset fetches
pub const DATASET_FIELDS: &str = "id,name,displayName,\
    dataSetElements[dataElement[id,name,displayName,valueType,\
    optionSet[id,name,options[name,code]]]],\
    categoryCombo[id,name,categoryOptionCombos[id,name]]";

/// Build the program fetch URL (tracker and event programs)
pub fn program_endpoint(base_url: &str, program_id: &str) -> String {
    format!(
        "{}{}/programs/{}.json?fields={}",
        base_url.trim_end_matches('/'),
        API_BASE_PATH,
        program_id,
        PROGRAM_FIELDS
    )
}

/// Build the dataset fetch URL (aggregate domain)
pub fn dataset_endpoint(base_url: &str, dataset_id: &str) -> String {
    format!(
        "{}{}/dataSets/{}.json?fields={}",
        base_url.trim_end_matches('/'),
        API_BASE_PATH,
        dataset_id,
        DATASET_FIELDS
    )
}
