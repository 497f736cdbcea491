//! End-to-end table behavior against the in-memory store.

mod common;

use serde_json::json;

use common::{hash_password, schema, Login, TABLE_NAME};
use dynatable::storage::InMemoryStore;
use dynatable_core::{
    AttributeValue, DeleteOptions, GetOptions, KeyResolver, PutOptions, QueryOptions, RawItem,
    StartKey, StoreError, Table, TableError, UpdateOptions,
};

const USER: &str = "foobar-1";
const T0: i64 = 1_700_000_000;

async fn table() -> Table<InMemoryStore> {
    let store = InMemoryStore::new();
    store.create_table(TABLE_NAME, schema()).await.unwrap();
    Table::new(store, TABLE_NAME, schema())
}

fn login(date: i64) -> Login {
    Login {
        user_id: USER.to_string(),
        date,
        password: "hunter2".to_string(),
        status: "active".to_string(),
        ..Login::default()
    }
}

async fn seeded() -> Table<InMemoryStore> {
    let table = table().await;
    // Written out of order; queries return range key order.
    table.put_item(&login(T0 + 60), PutOptions::new()).await.unwrap();
    table.put_item(&login(T0), PutOptions::new()).await.unwrap();
    table
}

fn by_user() -> QueryOptions {
    QueryOptions::new()
        .key_condition("user_id = :u")
        .attribute_value(":u", AttributeValue::string(USER))
}

fn dates(items: &[Login]) -> Vec<i64> {
    items.iter().map(|login| login.date).collect()
}

#[tokio::test]
async fn test_get_missing_item_is_not_found() {
    let table = table().await;

    let err = table
        .get_item::<Login>(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.store_code(), None);
}

#[tokio::test]
async fn test_put_and_get_hashes_password() {
    let table = seeded().await;

    let found: Login = table
        .get_item(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap();
    assert_eq!(found.status, "active");
    assert_eq!(found.password, hash_password("hunter2"));
    assert!(found.role.is_empty());

    let raw: RawItem = table
        .get_item(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap();
    assert!(raw
        .0
        .values()
        .all(|value| value.as_s() != Some("hunter2")));
    assert!(!raw.0.contains_key("role"));
}

#[tokio::test]
async fn test_put_without_hash_key_is_rejected() {
    let table = table().await;
    let record = Login {
        user_id: String::new(),
        ..login(T0)
    };

    let err = table.put_item(&record, PutOptions::new()).await.unwrap_err();

    assert!(matches!(err, TableError::InvalidKey(_)));
    assert_eq!(table.store().item_count(TABLE_NAME).await.unwrap(), 0);
}

#[tokio::test]
async fn test_conditional_put_surfaces_store_code() {
    let table = seeded().await;

    let err = table
        .put_item(
            &login(T0),
            PutOptions::new().condition("attribute_not_exists(user_id)"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.store_code(), Some(StoreError::CONDITIONAL_CHECK_FAILED));
}

#[tokio::test]
async fn test_add_counter() {
    let table = seeded().await;

    for delta in [1, 1, -1] {
        table
            .update_item(
                USER,
                Some(AttributeValue::number(T0)),
                UpdateOptions::new()
                    .update("ADD login_count :n")
                    .attribute_value(":n", AttributeValue::number(delta)),
            )
            .await
            .unwrap();
    }

    let found: Login = table
        .get_item(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap();
    assert_eq!(found.login_count, 1);
}

#[tokio::test]
async fn test_set_role_round_trips_as_string_set() {
    let table = seeded().await;

    table
        .update_item(
            USER,
            Some(AttributeValue::number(T0)),
            UpdateOptions::new()
                .update("SET #r = :r")
                .attribute_name("#r", "role")
                .attribute_value(":r", AttributeValue::string_set(["user", "admin"]).unwrap()),
        )
        .await
        .unwrap();

    let mut found: Login = table
        .get_item(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap();
    found.role.sort();
    assert_eq!(found.role, ["admin", "user"]);
}

#[tokio::test]
async fn test_update_without_range_key_is_rejected() {
    let table = seeded().await;

    let err = table
        .update_item(USER, None, UpdateOptions::new().update("SET status = :s"))
        .await
        .unwrap_err();

    assert!(matches!(err, TableError::InvalidKey(_)));
}

#[tokio::test]
async fn test_query_returns_items_in_range_order() {
    let table = seeded().await;

    let page = table.query::<Login>(by_user()).await.unwrap();

    assert_eq!(dates(&page.items), [T0, T0 + 60]);
    assert!(!page.has_more());

    let page = table.query::<Login>(by_user().descending()).await.unwrap();
    assert_eq!(dates(&page.items), [T0 + 60, T0]);
}

#[tokio::test]
async fn test_query_resumes_from_any_start_key_shape() {
    let table = seeded().await;

    let start_keys = [
        StartKey::record(Login::key(USER, T0)),
        StartKey::attributes(
            schema()
                .key(USER.into(), Some(AttributeValue::number(T0)))
                .unwrap(),
        ),
        StartKey::fields([("user_id", json!(USER)), ("date", json!(T0))]),
        StartKey::raw(json!({
            "user_id": {"S": USER},
            "date": {"N": T0.to_string()}
        })),
        StartKey::raw(json!({"user_id": USER, "date": T0})),
    ];

    for start_key in start_keys {
        let kind = start_key.kind();
        let page = table
            .query::<Login>(by_user().exclusive_start_key(start_key))
            .await
            .unwrap();

        assert_eq!(dates(&page.items), [T0 + 60], "start key: {kind}");
        assert!(!page.has_more(), "start key: {kind}");
    }
}

#[tokio::test]
async fn test_query_pages_with_returned_cursor() {
    let table = seeded().await;

    let first = table.query::<Login>(by_user().limit(1)).await.unwrap();
    assert_eq!(dates(&first.items), [T0]);
    let cursor = first.last_evaluated_key.unwrap();
    assert_eq!(cursor, Login::key(USER, T0).primary_key());

    let second = table
        .query::<Login>(by_user().limit(1).exclusive_start_key(cursor))
        .await
        .unwrap();
    assert_eq!(dates(&second.items), [T0 + 60]);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_query_rejects_unrecognized_start_key() {
    let table = seeded().await;

    for start_key in [
        StartKey::raw(json!("THIS IS NOT A MAP")),
        StartKey::raw(json!(["foobar-1", T0])),
        StartKey::fields([("user_id", json!(USER))]),
    ] {
        let err = table
            .query::<Login>(by_user().exclusive_start_key(start_key))
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::Normalization(_)), "{err}");
    }
}

#[tokio::test]
async fn test_unchecked_start_key_reaches_store() {
    let table = seeded().await;

    let err = table
        .query::<Login>(
            by_user().exclusive_start_key(StartKey::unchecked(json!("THIS IS NOT A MAP"))),
        )
        .await
        .unwrap_err();

    assert_eq!(err.store_code(), Some(StoreError::SERIALIZATION));
}

#[tokio::test]
async fn test_query_projection_and_filter() {
    let table = seeded().await;
    table
        .update_item(
            USER,
            Some(AttributeValue::number(T0)),
            UpdateOptions::new()
                .update("SET #s = :s")
                .attribute_name("#s", "status")
                .attribute_value(":s", AttributeValue::string("locked")),
        )
        .await
        .unwrap();

    let page = table
        .query::<RawItem>(
            by_user()
                .filter("#s = :s")
                .projection("#s")
                .attribute_name("#s", "status")
                .attribute_value(":s", AttributeValue::string("locked")),
        )
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    let item = page.items[0].clone().into_inner();
    assert_eq!(item.len(), 1);
    assert_eq!(item["status"], AttributeValue::string("locked"));
}

#[tokio::test]
async fn test_conditional_delete() {
    let table = seeded().await;
    let delete = |status: &str| {
        DeleteOptions::new()
            .condition("#s = :s")
            .attribute_name("#s", "status")
            .attribute_value(":s", AttributeValue::string(status))
    };

    let err = table
        .delete_item(USER, Some(AttributeValue::number(T0)), delete("locked"))
        .await
        .unwrap_err();
    assert_eq!(err.store_code(), Some(StoreError::CONDITIONAL_CHECK_FAILED));

    table
        .delete_item(USER, Some(AttributeValue::number(T0)), delete("active"))
        .await
        .unwrap();
    let err = table
        .get_item::<Login>(USER, Some(AttributeValue::number(T0)), GetOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
