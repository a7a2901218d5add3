use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::normalize::{normalize_expert_name, normalize_text};
use super::types::{Appointment, PENDING_LABEL};

/// Dashboard filter criteria. Every field is optional; empty means "match all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    /// Case-insensitive substring of the examinee name.
    #[serde(default)]
    pub search: String,
    #[serde(default, alias = "perito")]
    pub expert: String,
    #[serde(default, alias = "especialidade")]
    pub specialty: String,
    /// `PENDENTE`/`PENDING` or a stored outcome such as `COMPARECEU`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub day: String,
}

/// True when a status selector means "no outcome recorded yet".
pub fn is_pending_selector(status: &str) -> bool {
    let upper = status.trim().to_uppercase();
    upper == PENDING_LABEL || upper == "PENDING"
}

/// Match an appointment against a status selector. Empty selector matches everything.
pub fn status_matches(appointment: &Appointment, status: &str) -> bool {
    let status = status.trim();
    if status.is_empty() {
        return true;
    }
    if is_pending_selector(status) {
        return appointment.is_pending();
    }
    appointment.outcome.trim().to_uppercase() == status.to_uppercase()
}

/// Left-pad one- or two-digit month/day selectors so "3" matches "03".
fn pad2(value: &str) -> String {
    let v = value.trim();
    if v.len() == 1 && v.chars().all(|c| c.is_ascii_digit()) {
        format!("0{v}")
    } else {
        v.to_string()
    }
}

impl AppointmentFilter {
    pub fn has_date_criteria(&self) -> bool {
        !self.year.trim().is_empty() || !self.month.trim().is_empty() || !self.day.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.expert.trim().is_empty()
            && self.specialty.trim().is_empty()
            && self.status.trim().is_empty()
            && !self.has_date_criteria()
    }

    pub fn matches(&self, a: &Appointment) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !a.examinee.to_lowercase().contains(&search) {
            return false;
        }

        if !self.expert.trim().is_empty() && a.expert != normalize_expert_name(&self.expert) {
            return false;
        }

        if !self.specialty.trim().is_empty() && a.specialty != normalize_text(&self.specialty) {
            return false;
        }

        if !status_matches(a, &self.status) {
            return false;
        }

        if !self.has_date_criteria() {
            return true;
        }
        let Some((y, m, d)) = a.date_parts() else {
            return false;
        };
        let year = self.year.trim();
        let month = pad2(&self.month);
        let day = pad2(&self.day);
        (year.is_empty() || y == year)
            && (month.is_empty() || m == month)
            && (day.is_empty() || d == day)
    }

    /// Return the matching subset, preserving input order.
    pub fn apply<'a>(&self, items: &'a [Appointment]) -> Vec<&'a Appointment> {
        items.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Sorted distinct non-empty experts, for the filter selector.
pub fn distinct_experts(items: &[Appointment]) -> Vec<String> {
    distinct(items.iter().map(|a| a.expert.as_str()))
}

/// Sorted distinct non-empty specialties, for the filter selector.
pub fn distinct_specialties(items: &[Appointment]) -> Vec<String> {
    distinct(items.iter().map(|a| a.specialty.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apt(date: &str, outcome: &str) -> Appointment {
        Appointment {
            id: 1,
            date: date.to_string(),
            expert: "DR X".to_string(),
            specialty: "CARDIOLOGIA".to_string(),
            examinee: "JOAO".to_string(),
            outcome: outcome.to_string(),
            batch_id: None,
        }
    }

    #[test]
    fn single_digit_month_selector_is_padded() {
        let filter = AppointmentFilter { month: "3".into(), ..Default::default() };
        assert!(filter.matches(&apt("2025-03-10", "")));
    }

    #[test]
    fn pending_selector_is_case_insensitive() {
        assert!(is_pending_selector("pendente"));
        assert!(is_pending_selector("Pending"));
        assert!(!is_pending_selector("COMPARECEU"));
    }

    #[test]
    fn status_match_is_exact_not_substring() {
        let filter = AppointmentFilter { status: "COMPARECEU".into(), ..Default::default() };
        assert!(filter.matches(&apt("2025-03-10", "COMPARECEU")));
        assert!(!filter.matches(&apt("2025-03-10", "NAO COMPARECEU")));
    }
}
