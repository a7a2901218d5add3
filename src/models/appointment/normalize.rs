//! Canonicalization of appointment rows coming from the database, the import
//! pipeline and the legacy spreadsheet.
//!
//! Every text field is trimmed and uppercased, dates become `YYYY-MM-DD` and
//! outcomes are mapped to their stored spelling. Rows that cannot be
//! canonicalized are returned as a [`NormalizeError`] so the caller can
//! quarantine them instead of letting them fall through every date filter.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use super::types::{Appointment, NewAppointment, Outcome};
use crate::auth::validate;

/// Canonical spelling of the one expert whose name arrives misspelled from the PDF extraction.
pub const CORRECTED_EXPERT_NAME: &str = "AGNALDO LIMA PEREIRA JÚNIOR";

const DATE_KEYS: &[&str] = &["data_pericia", "data", "DATA", "Data"];
const EXPERT_KEYS: &[&str] = &["perito", "PERITO", "Perito"];
const SPECIALTY_KEYS: &[&str] = &["especialidade", "ESPECIALIDADE", "Especialidade"];
const EXAMINEE_KEYS: &[&str] = &["periciado", "PERICIADO", "Periciado"];
const OUTCOME_KEYS: &[&str] = &["observacao", "OBSERVACAO", "Observacao"];
const ID_KEYS: &[&str] = &["id", "rowId", "ID", "Id"];
const BATCH_KEYS: &[&str] = &["import_batch_id", "batchId"];

/// A row before canonicalization. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAppointment {
    pub id: i64,
    pub date: Option<String>,
    pub expert: Option<String>,
    pub specialty: Option<String>,
    pub examinee: Option<String>,
    pub outcome: Option<String>,
    pub batch_id: Option<String>,
}

impl RawAppointment {
    /// Read a JSON object whose field names may use any of the known casings.
    /// The first non-empty variant wins.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        RawAppointment {
            id: pick(map, ID_KEYS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            date: pick(map, DATE_KEYS),
            expert: pick(map, EXPERT_KEYS),
            specialty: pick(map, SPECIALTY_KEYS),
            examinee: pick(map, EXAMINEE_KEYS),
            outcome: pick(map, OUTCOME_KEYS),
            batch_id: pick(map, BATCH_KEYS),
        }
    }
}

fn pick(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    MissingDate,
    UnparseableDate(String),
    UnknownOutcome(String),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingDate => write!(f, "missing date"),
            NormalizeError::UnparseableDate(raw) => write!(f, "unparseable date '{raw}'"),
            NormalizeError::UnknownOutcome(raw) => write!(f, "unknown outcome '{raw}'"),
        }
    }
}

/// A row that failed canonicalization, kept aside for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub id: i64,
    pub raw_date: String,
    pub examinee: String,
    pub reason: String,
}

/// Canonicalize a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `DD/MM/YYYY` and `YYYY/MM/DD`; single-digit day and month are allowed.
pub fn normalize_date(raw: &str) -> Result<String, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::MissingDate);
    }
    let unparseable = || NormalizeError::UnparseableDate(trimmed.to_string());

    // Drop any time-of-day suffix.
    let day_part = trimmed
        .split(' ')
        .next()
        .and_then(|s| s.split('T').next())
        .unwrap_or(trimmed);

    let parts: Vec<&str> = if day_part.contains('/') {
        day_part.split('/').collect()
    } else {
        day_part.split('-').collect()
    };
    if parts.len() != 3 {
        return Err(unparseable());
    }

    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else if parts[2].len() == 4 && day_part.contains('/') {
        (parts[2], parts[1], parts[0])
    } else {
        return Err(unparseable());
    };

    let y: i32 = year.parse().map_err(|_| unparseable())?;
    let m: u32 = month.parse().map_err(|_| unparseable())?;
    let d: u32 = day.parse().map_err(|_| unparseable())?;

    NaiveDate::from_ymd_opt(y, m, d)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(unparseable)
}

/// Trim and uppercase a free-text field.
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Uppercase an expert name, correcting the known misspelling.
pub fn normalize_expert_name(raw: &str) -> String {
    let upper = normalize_text(raw);
    if upper.contains("STA AGNAL DO LIMA PEREIRA JUNIOR")
        || upper.contains("AGNAL DO LIMA")
        || upper.contains("STA AGNALDO")
        || upper == "AGNALDO LIMA"
    {
        return CORRECTED_EXPERT_NAME.to_string();
    }
    upper
}

/// Map outcome text to its stored spelling (empty for pending).
pub fn normalize_outcome(raw: &str) -> Result<String, NormalizeError> {
    Outcome::parse(raw)
        .map(|o| o.as_stored().to_string())
        .ok_or_else(|| NormalizeError::UnknownOutcome(raw.trim().to_string()))
}

/// Canonicalize one raw row.
pub fn normalize(raw: &RawAppointment) -> Result<Appointment, NormalizeError> {
    let date = normalize_date(raw.date.as_deref().unwrap_or(""))?;
    let outcome = normalize_outcome(raw.outcome.as_deref().unwrap_or(""))?;

    Ok(Appointment {
        id: raw.id,
        date,
        expert: normalize_expert_name(raw.expert.as_deref().unwrap_or("")),
        specialty: normalize_text(raw.specialty.as_deref().unwrap_or("")),
        examinee: normalize_text(raw.examinee.as_deref().unwrap_or("")),
        outcome,
        batch_id: raw.batch_id.clone().filter(|b| !b.is_empty()),
    })
}

/// Canonicalize a batch, splitting it into accepted rows and rejected ones.
pub fn partition(raws: &[RawAppointment]) -> (Vec<Appointment>, Vec<Rejected>) {
    let mut accepted = Vec::with_capacity(raws.len());
    let mut rejected = Vec::new();
    for raw in raws {
        match normalize(raw) {
            Ok(a) => accepted.push(a),
            Err(e) => rejected.push(Rejected {
                id: raw.id,
                raw_date: raw.date.clone().unwrap_or_default(),
                examinee: raw.examinee.clone().unwrap_or_default(),
                reason: e.to_string(),
            }),
        }
    }
    (accepted, rejected)
}

/// Validate and canonicalize a manually entered appointment. All fields are required.
pub fn prepare_new(form: &NewAppointment) -> Result<NewAppointment, Vec<String>> {
    let mut errors = vec![];
    errors.extend(validate::validate_required(&form.examinee, "Periciado", 200));
    errors.extend(validate::validate_required(&form.expert, "Perito", 200));
    errors.extend(validate::validate_required(&form.specialty, "Especialidade", 200));

    let date = match normalize_date(&form.date) {
        Ok(d) => Some(d),
        Err(e) => {
            errors.push(format!("Data: {e}"));
            None
        }
    };

    match date {
        Some(date) if errors.is_empty() => Ok(NewAppointment {
            date,
            examinee: normalize_text(&form.examinee),
            expert: normalize_expert_name(&form.expert),
            specialty: normalize_text(&form.specialty),
        }),
        _ => Err(errors),
    }
}
