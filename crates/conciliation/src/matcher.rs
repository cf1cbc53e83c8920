use crate::model::{
    ConsolidatedRecord, EncounterRecord, EncounterSummary, RecordSides, SaleRecord, SaleSummary,
};
use crate::patient::anonymize_patient_id;
use crate::timeutil::{format_time, same_day, time_difference_minutes};

/// Pair encounters with sales of the same patient on the same calendar day.
///
/// Greedy and order-dependent: each encounter, in input order, takes the first
/// unconsumed eligible sale in input order. This does not minimize the total
/// time gap, so reordering the input can change which pairs are formed.
///
/// Every encounter yields exactly one record; every sale is consumed by at most
/// one encounter, and each leftover sale yields a sale-only record. The result
/// is sorted by date descending (stable; records without a valid date last).
pub fn consolidate(encounters: &[EncounterRecord], sales: &[SaleRecord]) -> Vec<ConsolidatedRecord> {
    // By position, so duplicate sale ids in an export stay distinct.
    let mut sale_used = vec![false; sales.len()];
    let mut records = Vec::with_capacity(encounters.len() + sales.len());

    for encounter in encounters {
        let candidate = sales.iter().enumerate().find(|(idx, sale)| {
            !sale_used[*idx]
                && !encounter.patient_id.is_empty()
                && sale.patient_id == encounter.patient_id
                && same_day(sale.timestamp, encounter.timestamp)
        });

        let sides = match candidate {
            Some((idx, sale)) => {
                sale_used[idx] = true;
                RecordSides::Matched {
                    encounter: encounter_summary(encounter),
                    sale: sale_summary(sale),
                    time_difference_minutes: time_difference_minutes(
                        encounter.timestamp,
                        sale.timestamp,
                    ),
                }
            }
            None => RecordSides::EncounterOnly(encounter_summary(encounter)),
        };

        let id = match candidate {
            Some((_, sale)) => format!("{}_{}", encounter.id, sale.id),
            None => encounter.id.clone(),
        };

        records.push(ConsolidatedRecord {
            id,
            patient_id: anonymize_patient_id(&encounter.patient_id),
            patient_age: encounter.patient_age,
            date: encounter.timestamp,
            sides,
        });
    }

    let matched = sale_used.iter().filter(|used| **used).count();

    for (idx, sale) in sales.iter().enumerate() {
        if sale_used[idx] {
            continue;
        }
        records.push(ConsolidatedRecord {
            id: sale.id.clone(),
            patient_id: anonymize_patient_id(&sale.patient_id),
            patient_age: sale.patient_age,
            date: sale.timestamp,
            sides: RecordSides::SaleOnly(sale_summary(sale)),
        });
    }

    // Newest first; `None` dates compare lowest and therefore land last.
    records.sort_by(|a, b| b.date.cmp(&a.date));

    log::debug!(
        "consolidated {} encounters and {} sales into {} records ({} matched pairs)",
        encounters.len(),
        sales.len(),
        records.len(),
        matched,
    );

    records
}

fn encounter_summary(e: &EncounterRecord) -> EncounterSummary {
    EncounterSummary {
        id: e.id.clone(),
        time: format_time(e.timestamp),
        procedure_code: e.procedure_code.clone(),
        procedure_description: e.procedure_description.clone(),
        reason: e.reason.clone(),
        note: e.note.clone(),
    }
}

fn sale_summary(s: &SaleRecord) -> SaleSummary {
    SaleSummary {
        id: s.id.clone(),
        time: format_time(s.timestamp),
        procedure_code: s.procedure_code.clone(),
        procedure_description: s.procedure_description.clone(),
        amount_cents: s.amount_cents,
    }
}
