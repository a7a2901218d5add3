use serde::{Deserialize, Serialize};

use super::duration;
use crate::auth::validate;
use crate::models::appointment::normalize::{normalize_date, normalize_expert_name, normalize_text};

/// One expert check-in at a court room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub data_pericia: String,
    pub perito: String,
    pub vara: String,
    pub sala: String,
    pub hora_chegada: Option<String>,
    pub hora_saida: Option<String>,
}

impl AttendanceRecord {
    pub fn duration(&self) -> Option<String> {
        duration::duration(self.hora_chegada.as_deref(), self.hora_saida.as_deref())
    }
}

/// Record plus its derived duration, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub duration: Option<String>,
}

impl From<AttendanceRecord> for AttendanceView {
    fn from(record: AttendanceRecord) -> Self {
        let duration = record.duration();
        AttendanceView { record, duration }
    }
}

/// Create/edit form as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceForm {
    #[serde(default)]
    pub data_pericia: String,
    #[serde(default)]
    pub perito: String,
    #[serde(default)]
    pub vara: String,
    #[serde(default)]
    pub sala: String,
    #[serde(default)]
    pub hora_chegada: Option<String>,
    #[serde(default)]
    pub hora_saida: Option<String>,
}

/// Validated, canonical attendance values ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceInput {
    pub data_pericia: String,
    pub perito: String,
    pub vara: String,
    pub sala: String,
    pub hora_chegada: Option<String>,
    pub hora_saida: Option<String>,
}

impl AttendanceForm {
    /// Date and expert are required; court and room are uppercased; blank times become `None`.
    pub fn validate(&self) -> Result<AttendanceInput, Vec<String>> {
        let mut errors = vec![];
        errors.extend(validate::validate_required(&self.perito, "Perito", 200));
        errors.extend(validate::validate_optional(&self.vara, "Vara", 100));
        errors.extend(validate::validate_optional(&self.sala, "Sala", 100));

        let date = normalize_date(&self.data_pericia)
            .map_err(|e| errors.push(format!("Data: {e}")))
            .ok();
        let arrival = clock_field(self.hora_chegada.as_deref(), "Hora de chegada", &mut errors);
        let departure = clock_field(self.hora_saida.as_deref(), "Hora de saída", &mut errors);

        match date {
            Some(data_pericia) if errors.is_empty() => Ok(AttendanceInput {
                data_pericia,
                perito: normalize_expert_name(&self.perito),
                vara: normalize_text(&self.vara),
                sala: normalize_text(&self.sala),
                hora_chegada: arrival,
                hora_saida: departure,
            }),
            _ => Err(errors),
        }
    }
}

fn clock_field(value: Option<&str>, label: &str, errors: &mut Vec<String>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match duration::parse_clock(value) {
        Some(minutes) => Some(format!("{:02}:{:02}", minutes / 60, minutes % 60)),
        None => {
            errors.push(format!("{label} deve estar no formato HH:MM"));
            None
        }
    }
}

/// Which clock a quick punch sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchField {
    #[serde(alias = "hora_chegada")]
    Arrival,
    #[serde(alias = "hora_saida")]
    Departure,
}

impl PunchField {
    pub fn column(&self) -> &'static str {
        match self {
            PunchField::Arrival => "hora_chegada",
            PunchField::Departure => "hora_saida",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PunchForm {
    pub field: PunchField,
}
