use chrono::NaiveDate;

use crate::config::{ConciliationConfig, EncounterSource, PageConfig, SaleSource};
use crate::error::ConciliationError;
use crate::stats::compute_stats;
use crate::filter::RecordFilter;
use crate::matcher::consolidate;
use crate::model::{
    ConciliationInput, ConciliationMeta, ConsolidatedRecord, ConsolidatedResponse,
    EncounterRecord, PatientAge, Pagination, SaleRecord,
};
use crate::patient::{calculate_age, extract_patient_id};
use crate::timeutil::parse_timestamp;

/// Run a conciliation pass per config: filter, consolidate, compute stats over
/// every record, then cut the requested page.
pub fn run(
    config: &ConciliationConfig,
    input: ConciliationInput,
) -> Result<ConsolidatedResponse, ConciliationError> {
    run_page(config, input, config.page)
}

/// Same as [`run`] with an explicit page, overriding the config's `[page]`.
pub fn run_page(
    config: &ConciliationConfig,
    input: ConciliationInput,
    page: PageConfig,
) -> Result<ConsolidatedResponse, ConciliationError> {
    page.validate()?;

    let filter = RecordFilter::new(Some(&config.procedure_code), &config.filter)?;
    let encounters = filter.encounters(input.encounters);
    let sales = filter.sales(input.sales);

    log::info!(
        "{}: {} encounters and {} sales for procedure {}",
        config.name,
        encounters.len(),
        sales.len(),
        config.procedure_code,
    );

    let all = consolidate(&encounters, &sales);
    let stats = compute_stats(&all);
    let (records, pagination) = paginate(all, page);

    Ok(ConsolidatedResponse {
        meta: ConciliationMeta {
            config_name: config.name.clone(),
            procedure_code: config.procedure_code.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        stats,
        pagination,
        records,
    })
}

/// Slice one 1-based page out of the full record list.
pub fn paginate(
    records: Vec<ConsolidatedRecord>,
    page: PageConfig,
) -> (Vec<ConsolidatedRecord>, Pagination) {
    let total_records = records.len();
    let size = page.size.max(1);
    let current_page = page.number.max(1);
    let total_pages = total_records.div_ceil(size);

    let start = (current_page - 1).saturating_mul(size);
    let end = start.saturating_add(size).min(total_records);

    let slice = if start < total_records {
        records.into_iter().skip(start).take(end - start).collect()
    } else {
        Vec::new()
    };

    let pagination = Pagination {
        current_page,
        page_size: size,
        total_records,
        total_pages,
        has_more: end < total_records,
    };

    (slice, pagination)
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Header lookup shared by both loaders.
struct Headers {
    source: &'static str,
    names: Vec<String>,
}

impl Headers {
    fn read(source: &'static str, reader: &mut csv::Reader<&[u8]>) -> Result<Self, ConciliationError> {
        let names = reader
            .headers()
            .map_err(|e| ConciliationError::Io(format!("{source}: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { source, names })
    }

    fn required(&self, name: &str) -> Result<usize, ConciliationError> {
        self.optional(name).ok_or_else(|| ConciliationError::MissingColumn {
            source: self.source.into(),
            column: name.into(),
        })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|h| h == name)
    }
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim().to_string()
}

/// Load encounter rows from CSV text. Unparsable timestamps are kept as `None`.
pub fn load_encounters_csv(
    csv_data: &str,
    source: &EncounterSource,
    today: NaiveDate,
) -> Result<Vec<EncounterRecord>, ConciliationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let headers = Headers::read("encounters", &mut reader)?;
    let col = &source.columns;

    let id_idx = headers.required(&col.record_id)?;
    let patient_idx = if source.derive_patient_id {
        headers.optional(&col.patient_id)
    } else {
        Some(headers.required(&col.patient_id)?)
    };
    let ts_idx = headers.required(&col.timestamp)?;
    let code_idx = headers.required(&col.procedure_code)?;
    let desc_idx = headers.optional(&col.procedure_description);
    let reason_idx = headers.optional(&col.reason);
    let note_idx = headers.optional(&col.note);
    let age_idx = headers.optional(&col.patient_age);
    let birth_idx = headers.optional(&col.birthdate);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ConciliationError::Io(format!("encounters: {e}")))?;

        let id = field(&record, Some(id_idx));
        let mut patient_id = field(&record, patient_idx);
        if source.derive_patient_id && patient_id.is_empty() {
            patient_id = extract_patient_id(&id).to_string();
        }

        let raw_ts = field(&record, Some(ts_idx));
        let timestamp = parse_timestamp(&raw_ts);
        if timestamp.is_none() {
            log::warn!("encounters, record '{id}': unparsable timestamp '{raw_ts}'");
        }

        let patient_age = read_age("encounters", &id, &record, age_idx, birth_idx, today)?;

        rows.push(EncounterRecord {
            patient_id,
            timestamp,
            procedure_code: field(&record, Some(code_idx)),
            procedure_description: field(&record, desc_idx),
            reason: field(&record, reason_idx),
            note: field(&record, note_idx),
            patient_age,
            id,
        });
    }

    Ok(rows)
}

/// Load sale rows from CSV text. Amounts are stored as absolute cents.
pub fn load_sales_csv(
    csv_data: &str,
    source: &SaleSource,
    today: NaiveDate,
) -> Result<Vec<SaleRecord>, ConciliationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());
    let headers = Headers::read("sales", &mut reader)?;
    let col = &source.columns;

    let id_idx = headers.required(&col.record_id)?;
    let patient_idx = headers.required(&col.patient_id)?;
    let ts_idx = headers.required(&col.timestamp)?;
    let code_idx = headers.required(&col.procedure_code)?;
    let amount_idx = headers.required(&col.amount)?;
    let desc_idx = headers.optional(&col.procedure_description);
    let age_idx = headers.optional(&col.patient_age);
    let birth_idx = headers.optional(&col.birthdate);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ConciliationError::Io(format!("sales: {e}")))?;

        let id = field(&record, Some(id_idx));

        let raw_ts = field(&record, Some(ts_idx));
        let timestamp = parse_timestamp(&raw_ts);
        if timestamp.is_none() {
            log::warn!("sales, record '{id}': unparsable timestamp '{raw_ts}'");
        }

        let raw_amount = field(&record, Some(amount_idx));
        let amount_cents = parse_amount_cents(&raw_amount).ok_or_else(|| {
            ConciliationError::AmountParse {
                source: "sales".into(),
                record_id: id.clone(),
                value: raw_amount.clone(),
            }
        })?;

        let patient_age = read_age("sales", &id, &record, age_idx, birth_idx, today)?;

        rows.push(SaleRecord {
            patient_id: field(&record, Some(patient_idx)),
            timestamp,
            procedure_code: field(&record, Some(code_idx)),
            procedure_description: field(&record, desc_idx),
            amount_cents: amount_cents.abs(),
            patient_age,
            id,
        });
    }

    Ok(rows)
}

/// Age from the age column when filled, else from the birthdate column.
fn read_age(
    source: &str,
    record_id: &str,
    record: &csv::StringRecord,
    age_idx: Option<usize>,
    birth_idx: Option<usize>,
    today: NaiveDate,
) -> Result<PatientAge, ConciliationError> {
    let raw_age = field(record, age_idx);
    if !raw_age.is_empty() && !raw_age.eq_ignore_ascii_case("nd") {
        return raw_age
            .parse::<u32>()
            .map(PatientAge::Years)
            .map_err(|_| ConciliationError::AgeParse {
                source: source.into(),
                record_id: record_id.into(),
                value: raw_age,
            });
    }

    let raw_birth = field(record, birth_idx);
    let birthdate = parse_birthdate(&raw_birth);
    Ok(calculate_age(birthdate, today))
}

fn parse_birthdate(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|t| t.date()))
}

/// Parse a signed decimal amount ("1500", "-1,250.5", "$99.99") into cents.
/// At most two fraction digits are accepted.
pub fn parse_amount_cents(value: &str) -> Option<i64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    let cents = whole.checked_mul(100)?.checked_add(frac)?;
    Some(if negative { -cents } else { cents })
}
