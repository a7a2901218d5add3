//! Change notifications from the table triggers (skipped without `TEST_DATABASE_URL`).

mod common;

use std::time::Duration;

use sigpef::realtime::{CHANNEL, ChangeNotice};
use sqlx::postgres::PgListener;
use common::setup_test_db;

#[tokio::test]
async fn multi_row_insert_publishes_one_notice() {
    let Some(db) = setup_test_db().await else { return };
    let pool = &db.pool;

    let mut listener = PgListener::connect_with(pool).await.unwrap();
    listener.listen(CHANNEL).await.unwrap();

    sqlx::query(
        "INSERT INTO pericias (data_pericia, periciado) \
         SELECT '2025-03-10', 'PERICIADO ' || n FROM generate_series(1, 5) AS n",
    )
    .execute(pool)
    .await
    .unwrap();

    let mut notices = vec![];
    while let Ok(next) = tokio::time::timeout(Duration::from_millis(500), listener.recv()).await {
        let notice: ChangeNotice = serde_json::from_str(next.unwrap().payload()).unwrap();
        if notice.table == "pericias" {
            notices.push(notice);
        }
    }
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].op, "INSERT");
    assert_eq!(notices[0].id, None);

    db.teardown().await;
}
