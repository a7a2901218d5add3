//! Normalization of rows from the database, the import pipeline and the legacy sheet.

mod common;

use serde_json::json;
use sigpef::models::appointment::normalize::{
    CORRECTED_EXPERT_NAME, normalize_date, normalize_expert_name, normalize_outcome,
};
use sigpef::models::appointment::{NormalizeError, RawAppointment, normalize, partition};
use common::raw;

#[test]
fn every_supported_date_format_yields_the_same_day() {
    let inputs = [
        "2025-03-10",
        "2025-03-10 14:30:00",
        "2025-03-10T14:30:00",
        "10/03/2025",
        "2025/03/10",
        " 10/3/2025 ",
    ];
    for input in inputs {
        assert_eq!(normalize_date(input).unwrap(), "2025-03-10", "input {input:?}");
    }
}

#[test]
fn bad_dates_are_reported_not_passed_through() {
    assert_eq!(normalize_date(""), Err(NormalizeError::MissingDate));
    assert_eq!(normalize_date("   "), Err(NormalizeError::MissingDate));
    assert!(matches!(normalize_date("31/02/2025"), Err(NormalizeError::UnparseableDate(_))));
    assert!(matches!(normalize_date("amanhã"), Err(NormalizeError::UnparseableDate(_))));
    assert!(matches!(normalize_date("10-03-25"), Err(NormalizeError::UnparseableDate(_))));
}

#[test]
fn known_misspellings_of_the_expert_are_corrected() {
    for name in [
        "STA AGNAL DO LIMA PEREIRA JUNIOR",
        "sta agnal do lima pereira junior",
        "Dr. Agnal do Lima",
        "STA AGNALDO LIMA",
        " agnaldo lima ",
    ] {
        assert_eq!(normalize_expert_name(name), CORRECTED_EXPERT_NAME, "name {name:?}");
    }
    assert_eq!(normalize_expert_name("agnaldo lima filho"), "AGNALDO LIMA FILHO");
}

#[test]
fn outcome_aliases_map_to_stored_spelling() {
    assert_eq!(normalize_outcome("").unwrap(), "");
    assert_eq!(normalize_outcome("pendente").unwrap(), "");
    assert_eq!(normalize_outcome(" compareceu ").unwrap(), "COMPARECEU");
    assert_eq!(normalize_outcome("Ausente").unwrap(), "NAO COMPARECEU");
    assert_eq!(normalize_outcome("NÃO COMPARECEU").unwrap(), "NAO COMPARECEU");
    assert_eq!(normalize_outcome("óbito").unwrap(), "FALECIMENTO");
    assert!(matches!(normalize_outcome("remarcado"), Err(NormalizeError::UnknownOutcome(_))));
}

#[test]
fn normalize_uppercases_text_fields() {
    let a = normalize(&raw(9, "10/03/2025", "  joão da silva ", "compareceu")).unwrap();
    assert_eq!(a.date, "2025-03-10");
    assert_eq!(a.examinee, "JOÃO DA SILVA");
    assert_eq!(a.expert, "DR. CARLOS MENDES");
    assert_eq!(a.specialty, "ORTOPEDIA");
    assert_eq!(a.outcome, "COMPARECEU");
}

#[test]
fn partition_quarantines_rows_it_cannot_canonicalize() {
    let raws = vec![
        raw(1, "2025-03-10", "A", ""),
        raw(2, "", "B", ""),
        raw(3, "março", "C", ""),
        raw(4, "2025-03-11", "D", "adiado"),
        raw(5, "11/03/2025", "E", "ausente"),
    ];
    let (accepted, rejected) = partition(&raws);

    assert_eq!(accepted.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 5]);
    assert_eq!(rejected.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(rejected[1].raw_date, "março");
    assert_eq!(rejected[2].examinee, "D");
    assert!(rejected.iter().all(|r| !r.reason.is_empty()));
}

#[test]
fn pipeline_json_with_mixed_casing() {
    let row = json!({
        "rowId": 14,
        "DATA": "2025-05-20",
        "Perito": "sta agnaldo lima",
        "ESPECIALIDADE": "clinica geral",
        "periciado": "maria",
        "Observacao": "",
        "batchId": "b-1"
    });
    let raw = RawAppointment::from_json(row.as_object().unwrap());
    let a = normalize(&raw).unwrap();

    assert_eq!(a.id, 14);
    assert_eq!(a.expert, CORRECTED_EXPERT_NAME);
    assert_eq!(a.specialty, "CLINICA GERAL");
    assert_eq!(a.batch_id.as_deref(), Some("b-1"));
    assert!(a.is_pending());
}
