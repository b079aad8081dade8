// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

#![allow(dead_code)]

use palaver_db::Database;

/// First ack creates the row, later acks update it in place.
pub async fn test_upsert_creates_then_updates(db: &dyn Database) {
    assert!(db.get_read_state("u1", "c1").await.unwrap().is_none());

    let created = db.upsert_read_state("u1", "c1", "100").await.unwrap();
    assert_eq!(created.user_id, "u1");
    assert_eq!(created.channel_id, "c1");
    assert_eq!(created.last_message_id.as_deref(), Some("100"));

    let updated = db.upsert_read_state("u1", "c1", "200").await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.last_message_id.as_deref(), Some("200"));

    let fetched = db.get_read_state("u1", "c1").await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.last_message_id.as_deref(), Some("200"));
}

/// Acking the same message twice leaves the same stored value.
pub async fn test_upsert_idempotent(db: &dyn Database) {
    db.upsert_read_state("u1", "c1", "42").await.unwrap();
    let once = db.get_read_state("u1", "c1").await.unwrap().unwrap();
    db.upsert_read_state("u1", "c1", "42").await.unwrap();
    let twice = db.get_read_state("u1", "c1").await.unwrap().unwrap();

    assert_eq!(once.id, twice.id);
    assert_eq!(once.last_message_id, twice.last_message_id);
    assert_eq!(db.list_read_states("u1").await.unwrap().len(), 1);
}

/// No monotonic guard: an older message id overwrites a newer one.
pub async fn test_upsert_overwrites_without_comparison(db: &dyn Database) {
    db.upsert_read_state("u1", "c1", "10").await.unwrap();
    db.upsert_read_state("u1", "c1", "3").await.unwrap();
    let rs = db.get_read_state("u1", "c1").await.unwrap().unwrap();
    assert_eq!(rs.last_message_id.as_deref(), Some("3"));
}

/// Rows are keyed by (user, channel); other users and channels are untouched.
pub async fn test_read_states_are_per_user_and_channel(db: &dyn Database) {
    db.upsert_read_state("u1", "a", "5").await.unwrap();
    db.upsert_read_state("u1", "b", "9").await.unwrap();
    db.upsert_read_state("u2", "a", "7").await.unwrap();

    let u1 = db.list_read_states("u1").await.unwrap();
    assert_eq!(u1.len(), 2);
    assert_eq!(u1[0].channel_id, "a");
    assert_eq!(u1[0].last_message_id.as_deref(), Some("5"));
    assert_eq!(u1[1].channel_id, "b");
    assert_eq!(u1[1].last_message_id.as_deref(), Some("9"));

    let u2 = db.get_read_state("u2", "a").await.unwrap().unwrap();
    assert_eq!(u2.last_message_id.as_deref(), Some("7"));
    assert!(db.get_read_state("u2", "b").await.unwrap().is_none());
    assert!(db.list_read_states("u3").await.unwrap().is_empty());
}

/// Many concurrent upserts of the same key never create duplicate rows.
pub async fn test_concurrent_upserts_single_row(db: &dyn Database) {
    let futures = (0..16).map(|i| {
        let message_id = format!("{i}");
        async move { db.upsert_read_state("u1", "c1", &message_id).await }
    });
    for result in futures::future::join_all(futures).await {
        result.unwrap();
    }

    let states = db.list_read_states("u1").await.unwrap();
    assert_eq!(states.len(), 1);
    let last: u32 = states[0]
        .last_message_id
        .as_deref()
        .unwrap()
        .parse()
        .unwrap();
    assert!(last < 16);
}
