use crate::model::{ConciliationStats, ConciliationStatus, ConsolidatedRecord, DateRange};

/// Compute summary statistics over a consolidated record set.
///
/// Pure: calling it twice on the same slice yields the same stats.
pub fn compute_stats(records: &[ConsolidatedRecord]) -> ConciliationStats {
    let mut perfect_matches = 0;
    let mut likely_matches = 0;
    let mut attention_only = 0;
    let mut sale_only = 0;

    let mut total_sales_cents: i64 = 0;
    let mut sale_count = 0usize;
    let mut time_diff_sum: i64 = 0;
    let mut time_diff_count = 0usize;
    let mut age_sum: u64 = 0;
    let mut age_count = 0usize;
    let mut date_range: Option<DateRange> = None;

    for r in records {
        match r.status() {
            ConciliationStatus::PerfectMatch => perfect_matches += 1,
            ConciliationStatus::LikelyMatch => likely_matches += 1,
            ConciliationStatus::AttentionOnly => attention_only += 1,
            ConciliationStatus::SaleOnly => sale_only += 1,
        }

        if let Some(sale) = r.sides.sale() {
            total_sales_cents = total_sales_cents.saturating_add(sale.amount_cents);
            sale_count += 1;
        }

        if let Some(diff) = r.sides.time_difference_minutes() {
            time_diff_sum += diff;
            time_diff_count += 1;
        }

        if let Some(years) = r.patient_age.years() {
            age_sum += u64::from(years);
            age_count += 1;
        }

        if let Some(date) = r.date {
            date_range = Some(match date_range {
                Some(range) => DateRange {
                    start: range.start.min(date),
                    end: range.end.max(date),
                },
                None => DateRange { start: date, end: date },
            });
        }
    }

    if total_sales_cents == i64::MAX {
        log::warn!("sales total saturated at {} cents", i64::MAX);
    }

    let total_records = records.len();
    let conciliation_rate = if total_records > 0 {
        (perfect_matches + likely_matches) as f64 / total_records as f64 * 100.0
    } else {
        0.0
    };

    ConciliationStats {
        total_records,
        perfect_matches,
        likely_matches,
        attention_only,
        sale_only,
        conciliation_rate,
        total_sales_cents,
        avg_sale_cents: mean(total_sales_cents as f64, sale_count),
        avg_time_difference_minutes: mean(time_diff_sum as f64, time_diff_count),
        avg_patient_age: (age_count > 0).then(|| mean(age_sum as f64, age_count)),
        date_range,
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
