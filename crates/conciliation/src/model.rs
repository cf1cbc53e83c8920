use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::classify::classify_pair;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Patient age in whole years, or unknown when no usable birthdate exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientAge {
    Years(u32),
    Unknown,
}

impl PatientAge {
    pub fn years(&self) -> Option<u32> {
        match self {
            Self::Years(y) => Some(*y),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for PatientAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Years(y) => write!(f, "{y}"),
            Self::Unknown => write!(f, "ND"),
        }
    }
}

impl Serialize for PatientAge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Years(y) => serializer.serialize_u32(*y),
            Self::Unknown => serializer.serialize_str("ND"),
        }
    }
}

/// A clinical encounter, already filtered to one procedure code.
#[derive(Debug, Clone)]
pub struct EncounterRecord {
    pub id: String,
    pub patient_id: String,
    /// `None` when the source timestamp is missing or unparsable.
    pub timestamp: Option<NaiveDateTime>,
    pub procedure_code: String,
    pub procedure_description: String,
    pub reason: String,
    pub note: String,
    pub patient_age: PatientAge,
}

/// A sales ledger entry. `amount_cents` is the absolute value of the entry.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub id: String,
    pub patient_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub procedure_code: String,
    pub procedure_description: String,
    pub amount_cents: i64,
    pub patient_age: PatientAge,
}

/// Pre-loaded records for one conciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ConciliationInput {
    pub encounters: Vec<EncounterRecord>,
    pub sales: Vec<SaleRecord>,
}

// ---------------------------------------------------------------------------
// Consolidated output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConciliationStatus {
    PerfectMatch,
    LikelyMatch,
    AttentionOnly,
    SaleOnly,
}

impl ConciliationStatus {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::PerfectMatch | Self::LikelyMatch)
    }
}

impl std::fmt::Display for ConciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerfectMatch => write!(f, "perfect-match"),
            Self::LikelyMatch => write!(f, "likely-match"),
            Self::AttentionOnly => write!(f, "attention-only"),
            Self::SaleOnly => write!(f, "sale-only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterSummary {
    pub id: String,
    /// Wall-clock `HH:MM`, or `--:--` when the timestamp is invalid.
    pub time: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub reason: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleSummary {
    pub id: String,
    pub time: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub amount_cents: i64,
}

/// Which sides of a consolidated record are present. At least one always is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "SidesRepr")]
pub enum RecordSides {
    EncounterOnly(EncounterSummary),
    SaleOnly(SaleSummary),
    Matched {
        encounter: EncounterSummary,
        sale: SaleSummary,
        time_difference_minutes: i64,
    },
}

impl RecordSides {
    pub fn status(&self) -> ConciliationStatus {
        match self {
            Self::EncounterOnly(_) => ConciliationStatus::AttentionOnly,
            Self::SaleOnly(_) => ConciliationStatus::SaleOnly,
            Self::Matched { time_difference_minutes, .. } => {
                classify_pair(*time_difference_minutes)
            }
        }
    }

    pub fn encounter(&self) -> Option<&EncounterSummary> {
        match self {
            Self::EncounterOnly(e) | Self::Matched { encounter: e, .. } => Some(e),
            Self::SaleOnly(_) => None,
        }
    }

    pub fn sale(&self) -> Option<&SaleSummary> {
        match self {
            Self::SaleOnly(s) | Self::Matched { sale: s, .. } => Some(s),
            Self::EncounterOnly(_) => None,
        }
    }

    pub fn time_difference_minutes(&self) -> Option<i64> {
        match self {
            Self::Matched { time_difference_minutes, .. } => Some(*time_difference_minutes),
            _ => None,
        }
    }
}

/// Flat wire shape for [`RecordSides`]: absent sides are omitted.
#[derive(Serialize)]
struct SidesRepr {
    #[serde(skip_serializing_if = "Option::is_none")]
    encounter: Option<EncounterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sale: Option<SaleSummary>,
    conciliation_status: ConciliationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_difference_minutes: Option<i64>,
}

impl From<RecordSides> for SidesRepr {
    fn from(sides: RecordSides) -> Self {
        let conciliation_status = sides.status();
        match sides {
            RecordSides::EncounterOnly(e) => SidesRepr {
                encounter: Some(e),
                sale: None,
                conciliation_status,
                time_difference_minutes: None,
            },
            RecordSides::SaleOnly(s) => SidesRepr {
                encounter: None,
                sale: Some(s),
                conciliation_status,
                time_difference_minutes: None,
            },
            RecordSides::Matched { encounter, sale, time_difference_minutes } => SidesRepr {
                encounter: Some(encounter),
                sale: Some(sale),
                conciliation_status,
                time_difference_minutes: Some(time_difference_minutes),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedRecord {
    pub id: String,
    /// Anonymized: `****` followed by the last four characters.
    pub patient_id: String,
    pub patient_age: PatientAge,
    /// Encounter timestamp when present, else the sale timestamp.
    pub date: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub sides: RecordSides,
}

impl ConsolidatedRecord {
    pub fn status(&self) -> ConciliationStatus {
        self.sides.status()
    }
}

// ---------------------------------------------------------------------------
// Stats + Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConciliationStats {
    pub total_records: usize,
    pub perfect_matches: usize,
    pub likely_matches: usize,
    pub attention_only: usize,
    pub sale_only: usize,
    /// Percentage of records that are matched pairs.
    pub conciliation_rate: f64,
    pub total_sales_cents: i64,
    pub avg_sale_cents: f64,
    pub avg_time_difference_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_patient_age: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedResponse {
    pub meta: ConciliationMeta,
    pub stats: ConciliationStats,
    pub pagination: Pagination,
    pub records: Vec<ConsolidatedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConciliationMeta {
    pub config_name: String,
    pub procedure_code: String,
    pub engine_version: String,
    pub run_at: String,
}

// ---------------------------------------------------------------------------
// Monthly aggregation
// ---------------------------------------------------------------------------

/// Encounter count for one (month, treatment) cell of the dashboard chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreatmentMonthCount {
    pub year_month: String,
    pub year: i32,
    pub month: u32,
    pub treatment_code: String,
    pub treatment_description: String,
    pub count: usize,
}

/// Sales total for one (month, treatment) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesMonthTotal {
    pub year_month: String,
    pub year: i32,
    pub month: u32,
    pub treatment_code: String,
    pub treatment_description: String,
    pub total_cents: i64,
    pub record_count: usize,
}

/// Calendar month key used by the aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self { year: date.year(), month: date.month() }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
