use serde::{Deserialize, Serialize};

pub const STATUS_ATTENDED: &str = "COMPARECEU";
pub const STATUS_ABSENT: &str = "NAO COMPARECEU";
pub const STATUS_DECEASED: &str = "FALECIMENTO";
/// Display label for an empty outcome.
pub const PENDING_LABEL: &str = "PENDENTE";

/// Result of an examination. Stored as free text; empty means pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Attended,
    Absent,
    Deceased,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Attended,
        Outcome::Absent,
        Outcome::Deceased,
        Outcome::Pending,
    ];

    /// Text as stored in the `observacao` column.
    pub fn as_stored(&self) -> &'static str {
        match self {
            Outcome::Pending => "",
            Outcome::Attended => STATUS_ATTENDED,
            Outcome::Absent => STATUS_ABSENT,
            Outcome::Deceased => STATUS_DECEASED,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pending => PENDING_LABEL,
            other => other.as_stored(),
        }
    }

    /// Parse outcome text, accepting the spellings seen in imported data.
    /// Returns `None` for text that is not a known outcome.
    pub fn parse(text: &str) -> Option<Outcome> {
        let upper = text.trim().to_uppercase();
        match upper.as_str() {
            "" | PENDING_LABEL | "PENDING" => Some(Outcome::Pending),
            STATUS_ATTENDED => Some(Outcome::Attended),
            STATUS_ABSENT | "NÃO COMPARECEU" | "AUSENTE" => Some(Outcome::Absent),
            STATUS_DECEASED | "OBITO" | "ÓBITO" => Some(Outcome::Deceased),
            _ => None,
        }
    }
}

/// Canonical appointment, as held in the in-memory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: i64,
    /// Always `YYYY-MM-DD`.
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "perito")]
    pub expert: String,
    #[serde(rename = "especialidade")]
    pub specialty: String,
    #[serde(rename = "periciado")]
    pub examinee: String,
    /// Stored outcome text; empty means pending.
    #[serde(rename = "observacao")]
    pub outcome: String,
    #[serde(rename = "import_batch_id", skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl Appointment {
    pub fn is_pending(&self) -> bool {
        self.outcome.trim().is_empty()
    }

    pub fn outcome_kind(&self) -> Option<Outcome> {
        Outcome::parse(&self.outcome)
    }

    /// Split the canonical date into (year, month, day).
    pub fn date_parts(&self) -> Option<(&str, &str, &str)> {
        let mut parts = self.date.split('-');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d), None) => Some((y, m, d)),
            _ => None,
        }
    }
}

/// Aggregate counts over a (filtered) list of appointments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Stats {
    pub fn from_appointments<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        let mut stats = Stats::default();
        for a in items {
            stats.total += 1;
            if !a.is_pending() {
                stats.completed += 1;
            }
        }
        stats.pending = stats.total - stats.completed;
        stats
    }
}

/// Manual entry form for a new appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "periciado")]
    pub examinee: String,
    #[serde(rename = "perito")]
    pub expert: String,
    #[serde(rename = "especialidade")]
    pub specialty: String,
}

/// Edit form: outcome and/or examinee-name correction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(default, rename = "observacao")]
    pub outcome: Option<String>,
    #[serde(default, rename = "periciado")]
    pub examinee: Option<String>,
}
