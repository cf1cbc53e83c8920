use chrono::{Datelike, NaiveDate};

use crate::model::PatientAge;

/// Patient id embedded at the front of a health-story document id.
///
/// `"P#ixYYSxO6f1lM_HS#KUJtIu-LkvKZ"` → `"P#ixYYSxO6f1lM"`. Ids that do not
/// start with `P#` are returned unchanged.
pub fn extract_patient_id(health_story_id: &str) -> &str {
    if !health_story_id.starts_with("P#") || health_story_id.len() == 2 {
        return health_story_id;
    }
    match health_story_id.find('_') {
        Some(2) => health_story_id,
        Some(end) => &health_story_id[..end],
        None => health_story_id,
    }
}

/// Keep only the last four characters behind a `****` mask.
/// Ids of four characters or fewer pass through unchanged.
pub fn anonymize_patient_id(patient_id: &str) -> String {
    let count = patient_id.chars().count();
    if count <= 4 {
        return patient_id.to_string();
    }
    let last_four: String = patient_id.chars().skip(count - 4).collect();
    format!("****{last_four}")
}

/// Age in whole years on `today`. Unknown for a missing birthdate or one in the future.
pub fn calculate_age(birthdate: Option<NaiveDate>, today: NaiveDate) -> PatientAge {
    let Some(birth) = birthdate else {
        return PatientAge::Unknown;
    };

    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }

    if age >= 0 {
        PatientAge::Years(age as u32)
    } else {
        PatientAge::Unknown
    }
}
