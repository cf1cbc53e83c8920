use serde::Deserialize;

use crate::error::ConciliationError;
use crate::filter::DateFilter;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConciliationConfig {
    pub name: String,
    /// Procedure code both sources are narrowed to before matching.
    pub procedure_code: String,
    #[serde(default)]
    pub filter: DateFilter,
    pub encounters: EncounterSource,
    pub sales: SaleSource,
    #[serde(default)]
    pub page: PageConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncounterSource {
    pub file: String,
    #[serde(default)]
    pub columns: EncounterColumns,
    /// Take the patient id from the `P#…` prefix of the record id
    /// (health-story ids look like `P#abc_HS#xyz`).
    #[serde(default)]
    pub derive_patient_id: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleSource {
    pub file: String,
    #[serde(default)]
    pub columns: SaleColumns,
}

/// Header names in the encounters CSV. Description, reason, note, age and
/// birthdate are optional: absent headers read as empty / unknown.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncounterColumns {
    pub record_id: String,
    pub patient_id: String,
    pub timestamp: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub reason: String,
    pub note: String,
    pub patient_age: String,
    pub birthdate: String,
}

impl Default for EncounterColumns {
    fn default() -> Self {
        Self {
            record_id: "id".into(),
            patient_id: "patient_id".into(),
            timestamp: "timestamp".into(),
            procedure_code: "procedure_code".into(),
            procedure_description: "procedure_description".into(),
            reason: "reason".into(),
            note: "note".into(),
            patient_age: "patient_age".into(),
            birthdate: "birthdate".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaleColumns {
    pub record_id: String,
    pub patient_id: String,
    pub timestamp: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub amount: String,
    pub patient_age: String,
    pub birthdate: String,
}

impl Default for SaleColumns {
    fn default() -> Self {
        Self {
            record_id: "id".into(),
            patient_id: "patient_id".into(),
            timestamp: "timestamp".into(),
            procedure_code: "procedure_code".into(),
            procedure_description: "procedure_description".into(),
            amount: "amount".into(),
            patient_age: "patient_age".into(),
            birthdate: "birthdate".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// 1-based page number.
    pub number: usize,
    pub size: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { number: 1, size: 20 }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ConciliationConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConciliationError> {
        let config: ConciliationConfig =
            toml::from_str(input).map_err(|e| ConciliationError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConciliationError> {
        if self.procedure_code.trim().is_empty() {
            return Err(ConciliationError::ConfigValidation(
                "procedure_code must not be empty".into(),
            ));
        }

        if self.encounters.file.trim().is_empty() || self.sales.file.trim().is_empty() {
            return Err(ConciliationError::ConfigValidation(
                "encounters.file and sales.file are required".into(),
            ));
        }

        self.filter.validate()?;
        self.page.validate()?;

        Ok(())
    }
}

impl PageConfig {
    pub fn validate(&self) -> Result<(), ConciliationError> {
        if self.number == 0 {
            return Err(ConciliationError::ConfigValidation(
                "page.number starts at 1".into(),
            ));
        }
        if self.size == 0 {
            return Err(ConciliationError::ConfigValidation(
                "page.size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
