//! Appointment storage against a real Postgres (skipped without `TEST_DATABASE_URL`).

mod common;

use sigpef::errors::AppError;
use sigpef::models::appointment::normalize::prepare_new;
use sigpef::models::appointment::{self, NewAppointment, partition};
use sigpef::models::import_batch;
use common::{insert_raw, setup_test_db};

fn manual(date: &str, examinee: &str) -> NewAppointment {
    prepare_new(&NewAppointment {
        date: date.into(),
        examinee: examinee.into(),
        expert: "Dr. Carlos Mendes".into(),
        specialty: "Ortopedia".into(),
    })
    .unwrap()
}

#[tokio::test]
async fn same_examinee_and_day_in_another_format_is_a_conflict() {
    let Some(db) = setup_test_db().await else { return };
    let pool = &db.pool;

    insert_raw(pool, "10/03/2025", "  João Souza ", None).await.unwrap();

    let err = appointment::create(pool, &manual("2025-03-10", "JOÃO SOUZA")).await.unwrap_err();
    assert!(matches!(AppError::from_write(err, "duplicado"), AppError::Conflict(_)));

    let err = insert_raw(pool, "2025-03-10 08:30:00", "joão souza", None).await.unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));

    let rows = appointment::fetch_raw(pool, 100).await.unwrap();
    let (items, rejected) = partition(&rows);
    assert_eq!(items.len(), 1);
    assert!(rejected.is_empty());
    assert_eq!(items[0].date, "2025-03-10");
    assert_eq!(items[0].examinee, "JOÃO SOUZA");

    db.teardown().await;
}

#[tokio::test]
async fn stored_rows_are_canonical_and_invalid_dates_kept_as_written() {
    let Some(db) = setup_test_db().await else { return };
    let pool = &db.pool;

    insert_raw(pool, "2025/4/2", "Maria", None).await.unwrap();
    insert_raw(pool, "31/02/2025", "Pedro", None).await.unwrap();

    let stored: Vec<(String, String)> =
        sqlx::query_as("SELECT data_pericia, periciado FROM pericias ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap();
    assert_eq!(
        stored,
        vec![
            ("2025-04-02".to_string(), "MARIA".to_string()),
            ("31/02/2025".to_string(), "PEDRO".to_string()),
        ]
    );

    let (_, rejected) = partition(&appointment::fetch_raw(pool, 100).await.unwrap());
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].raw_date, "31/02/2025");

    db.teardown().await;
}

#[tokio::test]
async fn bounded_fetch_keeps_the_earliest_dates_whatever_their_format() {
    let Some(db) = setup_test_db().await else { return };
    let pool = &db.pool;

    insert_raw(pool, "2025-01-05", "A", None).await.unwrap();
    insert_raw(pool, "20/12/2025", "B", None).await.unwrap();
    insert_raw(pool, "03/01/2025", "C", None).await.unwrap();
    insert_raw(pool, "2025-06-30T00:00:00", "D", None).await.unwrap();

    let first_two = appointment::fetch_raw(pool, 2).await.unwrap();
    let dates: Vec<String> = first_two.into_iter().filter_map(|r| r.date).collect();
    assert_eq!(dates, vec!["2025-01-03", "2025-01-05"]);

    db.teardown().await;
}

#[tokio::test]
async fn rows_left_by_an_interrupted_import_can_be_undone() {
    let Some(db) = setup_test_db().await else { return };
    let pool = &db.pool;

    let uploader: i64 = sqlx::query_scalar(
        "INSERT INTO profiles (email, password, role, approved) \
         VALUES ('editor@jfpe.jus.br', 'x', 'editor', TRUE) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let batch_id = import_batch::generate_batch_id();
    import_batch::record(pool, &batch_id, "pauta.pdf", uploader).await.unwrap();
    insert_raw(pool, "10/03/2025", "Ana", Some(&batch_id)).await.unwrap();
    insert_raw(pool, "10/03/2025", "Bruno", Some(&batch_id)).await.unwrap();
    // The third row collides and the pipeline stops here.
    assert!(insert_raw(pool, "2025-03-10", "ANA", Some(&batch_id)).await.is_err());

    assert_eq!(appointment::count_batch(pool, &batch_id).await.unwrap(), 2);
    assert!(import_batch::find(pool, &batch_id).await.unwrap().is_some());
    assert_eq!(appointment::delete_batch(pool, &batch_id).await.unwrap(), 2);
    assert_eq!(appointment::count_batch(pool, &batch_id).await.unwrap(), 0);

    db.teardown().await;
}
