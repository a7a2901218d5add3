//! Attendance duration calculation.

use sigpef::models::attendance::duration::{duration, elapsed_minutes, format_minutes, parse_clock};
use sigpef::models::attendance::{AttendanceForm, AttendanceRecord, AttendanceView};

#[test]
fn same_day_span() {
    assert_eq!(duration(Some("08:00"), Some("17:30")).as_deref(), Some("9h 30m"));
}

#[test]
fn overnight_wraps_around() {
    assert_eq!(duration(Some("22:00"), Some("02:00")).as_deref(), Some("4h"));
    assert_eq!(elapsed_minutes("23:50", "00:05"), Some(15));
}

#[test]
fn zero_length() {
    assert_eq!(duration(Some("09:00"), Some("09:00")).as_deref(), Some("0m"));
}

#[test]
fn minutes_only() {
    assert_eq!(duration(Some("09:00"), Some("09:45")).as_deref(), Some("45m"));
}

#[test]
fn missing_or_garbage_input() {
    assert_eq!(duration(None, Some("10:00")), None);
    assert_eq!(duration(Some("08:00"), None), None);
    assert_eq!(duration(Some("oito"), Some("10:00")), None);
    assert_eq!(duration(Some("25:00"), Some("10:00")), None);
}

#[test]
fn postgres_time_and_short_hours_are_accepted() {
    assert_eq!(parse_clock("08:15:00"), Some(8 * 60 + 15));
    assert_eq!(parse_clock("8:05"), Some(8 * 60 + 5));
    assert_eq!(duration(Some("8:00:00"), Some("10:30:00")).as_deref(), Some("2h 30m"));
}

#[test]
fn formatting() {
    assert_eq!(format_minutes(0), "0m");
    assert_eq!(format_minutes(60), "1h");
    assert_eq!(format_minutes(61), "1h 1m");
}

#[test]
fn view_carries_computed_duration() {
    let record = AttendanceRecord {
        id: 101,
        data_pericia: "2025-03-10".into(),
        perito: "DRA. ANA MARIA".into(),
        vara: "2ª VARA".into(),
        sala: "SALA 02".into(),
        hora_chegada: Some("08:15".into()),
        hora_saida: Some("12:30".into()),
    };
    let view = AttendanceView::from(record);
    assert_eq!(view.duration.as_deref(), Some("4h 15m"));

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["perito"], "DRA. ANA MARIA");
    assert_eq!(json["duration"], "4h 15m");
}

#[test]
fn attendance_form_is_canonicalized() {
    let form = AttendanceForm {
        data_pericia: "10/03/2025".into(),
        perito: "dra. ana maria".into(),
        vara: "1ª vara cível".into(),
        sala: " sala 5 ".into(),
        hora_chegada: Some("8:00".into()),
        hora_saida: Some("  ".into()),
    };
    let input = form.validate().unwrap();
    assert_eq!(input.data_pericia, "2025-03-10");
    assert_eq!(input.perito, "DRA. ANA MARIA");
    assert_eq!(input.vara, "1ª VARA CÍVEL");
    assert_eq!(input.sala, "SALA 5");
    assert_eq!(input.hora_chegada.as_deref(), Some("08:00"));
    assert_eq!(input.hora_saida, None);
}

#[test]
fn attendance_form_requires_date_and_expert() {
    let errors = AttendanceForm::default().validate().unwrap_err();
    assert_eq!(errors.len(), 2);

    let form = AttendanceForm {
        data_pericia: "2025-03-10".into(),
        perito: "X".into(),
        hora_chegada: Some("8h".into()),
        ..Default::default()
    };
    assert_eq!(form.validate().unwrap_err().len(), 1);
}
