//! Procedure-code and calendar filters applied before matching.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::ConciliationError;
use crate::model::{EncounterRecord, SaleRecord};

/// Year / month / day drill-down filter. Each level requires the one above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateFilter {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

/// Inclusive timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateBounds {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

impl DateFilter {
    pub fn validate(&self) -> Result<(), ConciliationError> {
        self.bounds().map(|_| ())
    }

    /// Resolve to an inclusive range. `Ok(None)` means unbounded (no year set).
    pub fn bounds(&self) -> Result<Option<DateBounds>, ConciliationError> {
        let Some(year) = self.year else {
            if self.month.is_some() || self.day.is_some() {
                return Err(ConciliationError::ConfigValidation(
                    "filter: month/day require a year".into(),
                ));
            }
            return Ok(None);
        };

        let invalid = |what: String| ConciliationError::ConfigValidation(format!("filter: {what}"));

        let (first, last) = match (self.month, self.day) {
            (Some(month), Some(day)) => {
                let date = NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| invalid(format!("{year:04}-{month:02}-{day:02} is not a date")))?;
                (date, date)
            }
            (Some(month), None) => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| invalid(format!("month must be 1-12, got {month}")))?;
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|d| d.pred_opt())
                    .ok_or_else(|| invalid(format!("month {year:04}-{month:02} out of range")))?;
                (first, last)
            }
            (None, Some(_)) => return Err(invalid("day requires a month".into())),
            (None, None) => {
                let first = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| invalid(format!("year {year} out of range")))?;
                let last = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| invalid(format!("year {year} out of range")))?;
                (first, last)
            }
        };

        let end = last
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| invalid(format!("no end of day for {last}")))?;

        Ok(Some(DateBounds {
            start: first.and_time(NaiveTime::default()),
            end,
        }))
    }
}

/// Record filter: one procedure code plus optional calendar bounds.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub procedure_code: Option<String>,
    pub bounds: Option<DateBounds>,
}

impl RecordFilter {
    pub fn new(procedure_code: Option<&str>, dates: &DateFilter) -> Result<Self, ConciliationError> {
        Ok(Self {
            procedure_code: procedure_code.map(str::to_string),
            bounds: dates.bounds()?,
        })
    }

    fn admits(&self, code: &str, timestamp: Option<NaiveDateTime>) -> bool {
        if let Some(ref want) = self.procedure_code {
            if code != want {
                return false;
            }
        }
        match (self.bounds, timestamp) {
            (Some(bounds), Some(t)) => bounds.contains(t),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    pub fn encounters(&self, records: Vec<EncounterRecord>) -> Vec<EncounterRecord> {
        records
            .into_iter()
            .filter(|r| self.admits(&r.procedure_code, r.timestamp))
            .collect()
    }

    pub fn sales(&self, records: Vec<SaleRecord>) -> Vec<SaleRecord> {
        records
            .into_iter()
            .filter(|r| self.admits(&r.procedure_code, r.timestamp))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatientAge;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    fn filter(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> DateFilter {
        DateFilter { year, month, day }
    }

    #[test]
    fn unbounded_without_year() {
        assert_eq!(DateFilter::default().bounds().unwrap(), None);
    }

    #[test]
    fn year_bounds() {
        let b = filter(Some(2024), None, None).bounds().unwrap().unwrap();
        assert_eq!(b.start, dt(2024, 1, 1, 0, 0, 0));
        assert_eq!(b.end, dt(2024, 12, 31, 23, 59, 59));
    }

    #[test]
    fn month_bounds_handle_leap_february() {
        let b = filter(Some(2024), Some(2), None).bounds().unwrap().unwrap();
        assert_eq!(b.start, dt(2024, 2, 1, 0, 0, 0));
        assert_eq!(b.end, dt(2024, 2, 29, 23, 59, 59));

        let dec = filter(Some(2023), Some(12), None).bounds().unwrap().unwrap();
        assert_eq!(dec.end, dt(2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn day_bounds() {
        let b = filter(Some(2024), Some(3), Some(15)).bounds().unwrap().unwrap();
        assert_eq!(b.start, dt(2024, 3, 15, 0, 0, 0));
        assert_eq!(b.end, dt(2024, 3, 15, 23, 59, 59));
        assert!(b.contains(dt(2024, 3, 15, 12, 0, 0)));
        assert!(!b.contains(dt(2024, 3, 16, 0, 0, 0)));
    }

    #[test]
    fn end_bound_is_last_second_of_last_day() {
        let b = filter(Some(2024), Some(4), None).bounds().unwrap().unwrap();
        assert_eq!(b.end, dt(2024, 4, 30, 23, 59, 59));
        assert!(b.contains(dt(2024, 4, 30, 23, 59, 59)));
        assert!(!b.contains(dt(2024, 5, 1, 0, 0, 0)));

        // Out-of-range calendars are reported, never clamped to midnight.
        assert!(filter(Some(i32::MAX), None, None).bounds().is_err());
    }

    #[test]
    fn rejects_incomplete_or_invalid() {
        assert!(filter(None, Some(3), None).validate().is_err());
        assert!(filter(Some(2024), None, Some(3)).validate().is_err());
        assert!(filter(Some(2024), Some(13), None).validate().is_err());
        assert!(filter(Some(2023), Some(2), Some(29)).validate().is_err());
    }

    #[test]
    fn record_filter_drops_other_codes_and_invalid_dates() {
        let f = RecordFilter::new(Some("RES"), &filter(Some(2024), Some(3), None)).unwrap();
        let mk = |id: &str, code: &str, ts: Option<NaiveDateTime>| SaleRecord {
            id: id.into(),
            patient_id: "P#x".into(),
            timestamp: ts,
            procedure_code: code.into(),
            procedure_description: String::new(),
            amount_cents: 100,
            patient_age: PatientAge::Unknown,
        };
        let kept = f.sales(vec![
            mk("a", "RES", Some(dt(2024, 3, 10, 9, 0, 0))),
            mk("b", "EXO", Some(dt(2024, 3, 10, 9, 0, 0))),
            mk("c", "RES", Some(dt(2024, 4, 1, 0, 0, 0))),
            mk("d", "RES", None),
        ]);
        let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn unbounded_filter_keeps_invalid_dates() {
        let f = RecordFilter::new(None, &DateFilter::default()).unwrap();
        let kept = f.encounters(vec![EncounterRecord {
            id: "e".into(),
            patient_id: "P#x".into(),
            timestamp: None,
            procedure_code: "RES".into(),
            procedure_description: String::new(),
            reason: String::new(),
            note: String::new(),
            patient_age: PatientAge::Unknown,
        }]);
        assert_eq!(kept.len(), 1);
    }
}
