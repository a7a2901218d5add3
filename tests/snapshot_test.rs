//! Sequence-numbered appointment snapshot: stale refreshes never roll back newer state.

mod common;

use sigpef::models::appointment::AppointmentFilter;
use sigpef::snapshot::{AppointmentSet, AppointmentSnapshot, RefreshOutcome, Sequenced};
use common::{appt, batched, schedule};

fn set(items: Vec<sigpef::models::appointment::Appointment>) -> AppointmentSet {
    AppointmentSet { items, rejected: vec![] }
}

#[test]
fn refresh_started_before_a_mutation_is_discarded() {
    let snapshot = AppointmentSnapshot::new(5000);
    let ticket = snapshot.begin_refresh();

    // Local edit lands while the fetch is in flight.
    snapshot.insert(appt(10, "2025-03-12", "X", "Y", "NOVO", ""));

    // The fetch returns data read before the edit.
    let outcome = snapshot.complete_refresh(ticket, set(schedule()));
    assert_eq!(outcome, RefreshOutcome::Stale);
    assert_eq!(snapshot.all().len(), 1);
    assert!(snapshot.get(10).is_some());
}

#[test]
fn refresh_started_after_a_mutation_is_applied() {
    let snapshot = AppointmentSnapshot::new(5000);
    snapshot.insert(appt(10, "2025-03-12", "X", "Y", "NOVO", ""));

    let ticket = snapshot.begin_refresh();
    assert_eq!(snapshot.complete_refresh(ticket, set(schedule())), RefreshOutcome::Applied);
    assert_eq!(snapshot.all().len(), 6);
    assert!(snapshot.get(10).is_none());
    assert_eq!(snapshot.applied_seq(), ticket.seq());
}

#[test]
fn older_of_two_overlapping_refreshes_loses() {
    let mut seq = Sequenced::new(0u32);
    let first = seq.begin_refresh();
    let second = seq.begin_refresh();

    assert_eq!(seq.complete_refresh(second, 2), RefreshOutcome::Applied);
    assert_eq!(seq.complete_refresh(first, 1), RefreshOutcome::Stale);
    assert_eq!(*seq.value(), 2);
}

#[test]
fn mutations_are_applied_in_place() {
    let snapshot = AppointmentSnapshot::new(5000);
    let ticket = snapshot.begin_refresh();
    snapshot.complete_refresh(ticket, set(schedule()));

    assert!(snapshot.update(1, |a| a.outcome = "COMPARECEU".into()));
    assert_eq!(snapshot.get(1).unwrap().outcome, "COMPARECEU");
    assert!(!snapshot.update(99, |a| a.outcome = "X".into()));

    assert!(snapshot.remove(2));
    assert!(!snapshot.remove(2));
    assert_eq!(snapshot.all().len(), 5);
}

#[test]
fn batch_removal_only_touches_that_batch() {
    let snapshot = AppointmentSnapshot::new(5000);
    let ticket = snapshot.begin_refresh();
    snapshot.complete_refresh(
        ticket,
        set(vec![
            batched(appt(1, "2025-03-10", "A", "X", "P1", ""), "lote-a"),
            batched(appt(2, "2025-03-10", "A", "X", "P2", ""), "lote-a"),
            batched(appt(3, "2025-03-10", "A", "X", "P3", ""), "lote-b"),
            appt(4, "2025-03-10", "A", "X", "P4", ""),
        ]),
    );

    assert_eq!(snapshot.remove_batch("lote-a"), 2);
    assert_eq!(snapshot.remove_batch("lote-a"), 0);
    let left: Vec<i64> = snapshot.all().iter().map(|a| a.id).collect();
    assert_eq!(left, vec![3, 4]);
}

#[test]
fn filtered_view_reports_stats_selectors_and_quarantine() {
    let snapshot = AppointmentSnapshot::new(5000);
    let ticket = snapshot.begin_refresh();
    let (items, rejected) = sigpef::models::appointment::partition(&[
        common::raw(1, "2025-03-10", "A", ""),
        common::raw(2, "2025-03-10", "B", "compareceu"),
        common::raw(3, "??", "C", ""),
    ]);
    snapshot.complete_refresh(ticket, AppointmentSet { items, rejected });

    let view = snapshot.filtered(&AppointmentFilter {
        year: "2025".into(),
        month: "03".into(),
        ..Default::default()
    });
    assert_eq!(view.items.len(), 2);
    assert_eq!((view.stats.total, view.stats.completed, view.stats.pending), (2, 1, 1));
    assert_eq!(view.experts, vec!["DR. CARLOS MENDES"]);
    assert_eq!(view.quarantined, 1);
    assert_eq!(snapshot.quarantine()[0].id, 3);
}
