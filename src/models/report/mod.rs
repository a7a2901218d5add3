pub mod export;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::appointment::filter::is_pending_selector;
use crate::models::appointment::normalize::{normalize_date, normalize_expert_name};
use crate::models::appointment::{Appointment, Outcome};

pub use export::{file_name, format_date_br, to_csv};

/// Report parameters. `year`/`month` fill in a blank `start`/`end`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default, alias = "perito")]
    pub expert: String,
    /// `PENDING` or a known outcome.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub month: String,
}

/// Counts per outcome bucket. `total` is always the sum of the four buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub attended: usize,
    pub absent: usize,
    pub deceased: usize,
    pub pending: usize,
    pub total: usize,
}

impl StatusSummary {
    pub fn from_rows(rows: &[Appointment]) -> Self {
        let mut summary = StatusSummary::default();
        for row in rows {
            match row.outcome_kind() {
                Some(Outcome::Attended) => summary.attended += 1,
                Some(Outcome::Absent) => summary.absent += 1,
                Some(Outcome::Deceased) => summary.deceased += 1,
                Some(Outcome::Pending) => summary.pending += 1,
                None => {
                    log::warn!("Appointment {} has unknown outcome '{}'", row.id, row.outcome);
                    continue;
                }
            }
            summary.total += 1;
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub start: Option<String>,
    pub end: Option<String>,
    pub expert: Option<String>,
    pub rows: Vec<Appointment>,
    pub summary: StatusSummary,
}

/// Whole year, or first..last day of one month.
pub fn preset_range(year: i32, month: Option<u32>) -> Option<(NaiveDate, NaiveDate)> {
    match month {
        None => Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        )),
        Some(m) => {
            let first = NaiveDate::from_ymd_opt(year, m, 1)?;
            let next = if m == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, m + 1, 1)?
            };
            Some((first, next.pred_opt()?))
        }
    }
}

enum StatusSelector {
    Any,
    Is(Outcome),
}

struct Criteria {
    start: Option<String>,
    end: Option<String>,
    expert: Option<String>,
    status: StatusSelector,
    search: Option<String>,
}

fn non_blank(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

impl ReportQuery {
    /// Effective inclusive date span, canonicalized to `YYYY-MM-DD`.
    pub fn span(&self) -> Result<(Option<String>, Option<String>), Vec<String>> {
        let mut errors = Vec::new();
        let mut parse = |label: &str, value: &str| -> Option<String> {
            let value = non_blank(value)?;
            match normalize_date(value) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push(format!("{label} inválida: {value}"));
                    None
                }
            }
        };
        let mut start = parse("Data inicial", &self.start);
        let mut end = parse("Data final", &self.end);

        if let Some(year) = non_blank(&self.year) {
            let month = non_blank(&self.month);
            let range = match (year.parse::<i32>(), month.map(str::parse::<u32>)) {
                (Ok(y), None) => preset_range(y, None),
                (Ok(y), Some(Ok(m))) => preset_range(y, Some(m)),
                _ => None,
            };
            match range {
                Some((first, last)) => {
                    start.get_or_insert_with(|| first.format("%Y-%m-%d").to_string());
                    end.get_or_insert_with(|| last.format("%Y-%m-%d").to_string());
                }
                None => errors.push(format!("Período inválido: {year}/{}", month.unwrap_or(""))),
            }
        }

        if let (Some(s), Some(e)) = (&start, &end) {
            if s > e {
                errors.push("Data inicial posterior à data final".to_string());
            }
        }

        if errors.is_empty() { Ok((start, end)) } else { Err(errors) }
    }

    fn criteria(&self) -> Result<Criteria, Vec<String>> {
        let (start, end) = self.span()?;
        let status = match non_blank(&self.status) {
            None => StatusSelector::Any,
            Some(s) if is_pending_selector(s) => StatusSelector::Is(Outcome::Pending),
            Some(s) => match Outcome::parse(s) {
                Some(kind) => StatusSelector::Is(kind),
                None => return Err(vec![format!("Status desconhecido: {s}")]),
            },
        };
        Ok(Criteria {
            start,
            end,
            expert: non_blank(&self.expert).map(normalize_expert_name),
            status,
            search: non_blank(&self.search).map(str::to_lowercase),
        })
    }

    /// Select, sort and summarize the appointments this query covers.
    pub fn run(&self, items: &[Appointment]) -> Result<Report, Vec<String>> {
        let c = self.criteria()?;

        let mut rows: Vec<Appointment> = items
            .iter()
            .filter(|a| c.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        let summary = StatusSummary::from_rows(&rows);
        Ok(Report {
            start: c.start,
            end: c.end,
            expert: c.expert,
            rows,
            summary,
        })
    }
}

impl Criteria {
    fn matches(&self, a: &Appointment) -> bool {
        if a.date.is_empty() {
            return false;
        }
        if self.start.as_deref().is_some_and(|s| a.date.as_str() < s) {
            return false;
        }
        if self.end.as_deref().is_some_and(|e| a.date.as_str() > e) {
            return false;
        }
        if let StatusSelector::Is(kind) = self.status {
            if a.outcome_kind() != Some(kind) {
                return false;
            }
        }
        if self.expert.as_deref().is_some_and(|e| a.expert != e) {
            return false;
        }
        if let Some(q) = &self.search {
            let hit = [&a.examinee, &a.expert, &a.specialty]
                .iter()
                .any(|f| f.to_lowercase().contains(q));
            if !hit {
                return false;
            }
        }
        true
    }
}
