use std::collections::BTreeMap;

use crate::model::{EncounterRecord, SaleRecord, SalesMonthTotal, TreatmentMonthCount, YearMonth};

/// Group key: month first so the output reads chronologically, then code.
type MonthKey = (YearMonth, String, String);

/// Count encounters per (month, treatment code, description).
///
/// Encounters without a valid timestamp or without a procedure code are skipped.
pub fn monthly_treatment_counts(encounters: &[EncounterRecord]) -> Vec<TreatmentMonthCount> {
    let mut groups: BTreeMap<MonthKey, usize> = BTreeMap::new();

    for e in encounters {
        let Some(ts) = e.timestamp else { continue };
        if e.procedure_code.is_empty() {
            continue;
        }
        let key = (
            YearMonth::of(ts.date()),
            e.procedure_code.clone(),
            e.procedure_description.clone(),
        );
        *groups.entry(key).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((ym, code, description), count)| TreatmentMonthCount {
            year_month: ym.to_string(),
            year: ym.year,
            month: ym.month,
            treatment_code: code,
            treatment_description: description,
            count,
        })
        .collect()
}

/// Sum sale amounts per (month, treatment code, description). Totals saturate
/// at `i64::MAX` cents.
pub fn monthly_sales_totals(sales: &[SaleRecord]) -> Vec<SalesMonthTotal> {
    let mut groups: BTreeMap<MonthKey, (i64, usize)> = BTreeMap::new();

    for s in sales {
        let Some(ts) = s.timestamp else { continue };
        if s.procedure_code.is_empty() {
            continue;
        }
        let key = (
            YearMonth::of(ts.date()),
            s.procedure_code.clone(),
            s.procedure_description.clone(),
        );
        let entry = groups.entry(key).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(s.amount_cents.saturating_abs());
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((ym, code, description), (total_cents, record_count))| SalesMonthTotal {
            year_month: ym.to_string(),
            year: ym.year,
            month: ym.month,
            treatment_code: code,
            treatment_description: description,
            total_cents,
            record_count,
        })
        .collect()
}
