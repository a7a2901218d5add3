use super::Report;
use crate::models::appointment::PENDING_LABEL;

const BOM: &str = "\u{FEFF}";
const HEADER: &str = "Data,Periciado,Perito,Especialidade,Status";

/// `YYYY-MM-DD` → `DD/MM/YYYY`; anything else is returned unchanged.
pub fn format_date_br(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [y, m, d] => format!("{d}/{m}/{y}"),
        _ => date.to_string(),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn summary_row(label: &str, count: usize) -> String {
    format!("{label},{count},,,")
}

/// Spreadsheet-friendly CSV: BOM, one line per row, then the summary block.
pub fn to_csv(report: &Report) -> String {
    let mut lines = Vec::with_capacity(report.rows.len() + 8);
    lines.push(HEADER.to_string());

    for row in &report.rows {
        let status = if row.is_pending() {
            PENDING_LABEL
        } else {
            row.outcome.as_str()
        };
        lines.push(format!(
            "{},{},{},{},{}",
            format_date_br(&row.date),
            quote(&row.examinee),
            quote(&row.expert),
            quote(&row.specialty),
            status
        ));
    }

    let s = &report.summary;
    lines.push(",,,,".to_string());
    lines.push("RESUMO ESTATISTICO,,,,".to_string());
    lines.push(summary_row("Compareceu", s.attended));
    lines.push(summary_row("Nao Compareceu (Ausente)", s.absent));
    lines.push(summary_row("Falecimento", s.deceased));
    lines.push(summary_row("Pendente", s.pending));
    lines.push(summary_row("TOTAL GERAL", s.total));

    format!("{BOM}{}", lines.join("\n"))
}

/// `Relatorio_SIGPEF_{start}_a_{end}[_{EXPERT}].csv`, or `Completo` for an open span.
pub fn file_name(report: &Report) -> String {
    let period = match (&report.start, &report.end) {
        (Some(start), Some(end)) => format!("{start}_a_{end}"),
        _ => "Completo".to_string(),
    };
    let expert = report
        .expert
        .as_deref()
        .map(|e| format!("_{}", e.split_whitespace().collect::<Vec<_>>().join("_")))
        .unwrap_or_default();
    format!("Relatorio_SIGPEF_{period}{expert}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn br_dates() {
        assert_eq!(format_date_br("2025-03-10"), "10/03/2025");
        assert_eq!(format_date_br("garbage"), "garbage");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(quote(r#"JOSE "ZE""#), r#""JOSE ""ZE""""#);
    }
}
