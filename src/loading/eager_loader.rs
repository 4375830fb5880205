//! Batched relation loading.
//!
//! Loading a relation for N parent rows costs one query, not N: the
//! loader collects the parents' key values, fetches all related rows
//! with a single `WHERE fk IN (...)`, groups them by foreign key and
//! attaches each group to its parent. Results are cached per loader
//! instance, keyed by the relation shape and the exact key set, so
//! repeating the same load within one loader's lifetime costs zero
//! queries.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::connection::{Connection, Row};
use crate::error::DbResult;
use crate::query::QueryBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LoadKind {
    Many,
    One,
}

/// Cache key: relation shape plus the canonicalized, sorted key set.
/// Two loads hit the same entry only when they would run the same query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    table: String,
    foreign_key: String,
    kind: LoadKind,
    keys: Vec<String>,
}

impl CacheKey {
    fn new(table: &str, foreign_key: &str, kind: LoadKind, keys: &[String]) -> Self {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        Self {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
            kind,
            keys,
        }
    }
}

/// Relation loader with a per-instance result cache.
#[derive(Debug, Default)]
pub struct EagerLoader {
    many: HashMap<CacheKey, HashMap<String, Vec<Row>>>,
    one: HashMap<CacheKey, HashMap<String, Row>>,
}

impl EagerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach related rows from `table` to each item in `items`.
    ///
    /// For every item, related rows are those whose `foreign_key` column
    /// equals the item's `local_key` column. The related data lands in
    /// the item under the `table` key: a single object when exactly one
    /// row matched, an array when several did, `Value::Null` when none.
    pub async fn eager_load(
        &mut self,
        conn: &dyn Connection,
        items: &mut [Row],
        foreign_key: &str,
        table: &str,
        local_key: &str,
    ) -> DbResult<()> {
        self.eager_load_with(conn, items, foreign_key, table, local_key, Ok)
            .await
    }

    /// Like [`eager_load`](Self::eager_load), with an extra filter
    /// applied to the batch query (additional WHERE clauses, ordering,
    /// a projection).
    pub async fn eager_load_with<F>(
        &mut self,
        conn: &dyn Connection,
        items: &mut [Row],
        foreign_key: &str,
        table: &str,
        local_key: &str,
        filter: F,
    ) -> DbResult<()>
    where
        F: FnOnce(QueryBuilder) -> DbResult<QueryBuilder>,
    {
        let keys = collect_keys(items, local_key);
        if keys.is_empty() {
            return Ok(());
        }

        let cache_key = CacheKey::new(table, foreign_key, LoadKind::Many, &keys);
        if !self.many.contains_key(&cache_key) {
            let rows = self
                .fetch_batch(conn, table, foreign_key, &keys, filter)
                .await?;
            let mut grouped: HashMap<String, Vec<Row>> = HashMap::new();
            for row in rows {
                if let Some(value) = row.get(foreign_key) {
                    grouped.entry(canonical(value)).or_default().push(row);
                }
            }
            self.many.insert(cache_key.clone(), grouped);
        }

        let grouped = &self.many[&cache_key];
        for item in items.iter_mut() {
            let attached = match item.get(local_key) {
                Some(key) if !key.is_null() => match grouped.get(&canonical(key)) {
                    Some(group) if group.len() == 1 => Value::Object(group[0].clone()),
                    Some(group) => {
                        Value::Array(group.iter().cloned().map(Value::Object).collect())
                    }
                    None => Value::Null,
                },
                _ => Value::Null,
            };
            item.insert(table.to_string(), attached);
        }
        Ok(())
    }

    /// Attach at most one related row per item. When several rows share
    /// a foreign key, the last one fetched wins. Items with no match get
    /// `Value::Null`.
    pub async fn eager_load_one(
        &mut self,
        conn: &dyn Connection,
        items: &mut [Row],
        foreign_key: &str,
        table: &str,
        local_key: &str,
    ) -> DbResult<()> {
        let keys = collect_keys(items, local_key);
        if keys.is_empty() {
            return Ok(());
        }

        let cache_key = CacheKey::new(table, foreign_key, LoadKind::One, &keys);
        if !self.one.contains_key(&cache_key) {
            let rows = self
                .fetch_batch(conn, table, foreign_key, &keys, Ok)
                .await?;
            let mut by_key: HashMap<String, Row> = HashMap::new();
            for row in rows {
                if let Some(value) = row.get(foreign_key) {
                    by_key.insert(canonical(value), row);
                }
            }
            self.one.insert(cache_key.clone(), by_key);
        }

        let by_key = &self.one[&cache_key];
        for item in items.iter_mut() {
            let attached = match item.get(local_key) {
                Some(key) if !key.is_null() => by_key
                    .get(&canonical(key))
                    .map(|row| Value::Object(row.clone()))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            };
            item.insert(table.to_string(), attached);
        }
        Ok(())
    }

    /// Drop all cached batches.
    pub fn clear_cache(&mut self) {
        self.many.clear();
        self.one.clear();
    }

    async fn fetch_batch<F>(
        &self,
        conn: &dyn Connection,
        table: &str,
        foreign_key: &str,
        keys: &[String],
        filter: F,
    ) -> DbResult<Vec<Row>>
    where
        F: FnOnce(QueryBuilder) -> DbResult<QueryBuilder>,
    {
        debug!(table, foreign_key, key_count = keys.len(), "eager load batch");
        let query = QueryBuilder::table(table)?.where_in(foreign_key, keys.to_vec())?;
        filter(query)?.get(conn).await
    }
}

/// Distinct non-null key values from `items`, in first-seen order.
fn collect_keys(items: &[Row], local_key: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for item in items {
        if let Some(value) = item.get(local_key) {
            if !value.is_null() {
                let key = canonical(value);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
    }
    keys
}

/// Canonical string form of a key value, so that a JSON `1` and a
/// driver-decoded `"1"` group together.
fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{row, FakeConnection};
    use serde_json::json;

    fn posts() -> Vec<Row> {
        vec![
            row(json!({"id": 1, "title": "a"})),
            row(json!({"id": 2, "title": "b"})),
            row(json!({"id": 3, "title": "c"})),
        ]
    }

    #[tokio::test]
    async fn test_eager_load_is_one_query() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![
            row(json!({"id": 10, "post_id": 1, "body": "first"})),
            row(json!({"id": 11, "post_id": 2, "body": "second"})),
            row(json!({"id": 12, "post_id": 2, "body": "third"})),
        ]);

        let mut items = posts();
        let mut loader = EagerLoader::new();
        loader
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();

        assert_eq!(conn.query_count(), 1);
        let (sql, bindings) = conn.last_statement().unwrap();
        assert_eq!(sql, "SELECT * FROM comments WHERE post_id IN (?,?,?)");
        assert_eq!(bindings, vec![json!("1"), json!("2"), json!("3")]);

        // One match -> object
        assert_eq!(items[0]["comments"]["body"], json!("first"));
        // Two matches -> array
        assert_eq!(items[1]["comments"].as_array().unwrap().len(), 2);
        // No match -> null
        assert!(items[2]["comments"].is_null());
    }

    #[tokio::test]
    async fn test_repeat_load_hits_cache() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![row(json!({"id": 10, "post_id": 1}))]);

        let mut loader = EagerLoader::new();
        let mut first = posts();
        loader
            .eager_load(&conn, &mut first, "post_id", "comments", "id")
            .await
            .unwrap();
        assert_eq!(conn.query_count(), 1);

        let mut second = posts();
        loader
            .eager_load(&conn, &mut second, "post_id", "comments", "id")
            .await
            .unwrap();
        // Same relation, same key set: served from cache
        assert_eq!(conn.query_count(), 1);
        assert_eq!(second[0]["comments"]["id"], json!(10));
    }

    #[tokio::test]
    async fn test_different_key_set_misses_cache() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![]);
        conn.push_rows(vec![]);

        let mut loader = EagerLoader::new();
        let mut some = posts();
        loader
            .eager_load(&conn, &mut some, "post_id", "comments", "id")
            .await
            .unwrap();

        let mut fewer = vec![row(json!({"id": 1}))];
        loader
            .eager_load(&conn, &mut fewer, "post_id", "comments", "id")
            .await
            .unwrap();
        assert_eq!(conn.query_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_requery() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![]);
        conn.push_rows(vec![]);

        let mut loader = EagerLoader::new();
        let mut items = posts();
        loader
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();
        loader.clear_cache();
        loader
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();
        assert_eq!(conn.query_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_items_runs_no_query() {
        let conn = FakeConnection::new();
        let mut items: Vec<Row> = Vec::new();
        EagerLoader::new()
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();
        assert_eq!(conn.query_count(), 0);
    }

    #[tokio::test]
    async fn test_null_keys_are_skipped() {
        let conn = FakeConnection::new();
        let mut items = vec![row(json!({"id": null})), row(json!({"id": null}))];

        EagerLoader::new()
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();

        assert_eq!(conn.query_count(), 0);
        assert!(items[0]["comments"].is_null());
    }

    #[tokio::test]
    async fn test_eager_load_one_last_write_wins() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![
            row(json!({"id": 20, "post_id": 1, "name": "early"})),
            row(json!({"id": 21, "post_id": 1, "name": "late"})),
        ]);

        let mut items = vec![row(json!({"id": 1})), row(json!({"id": 2}))];
        EagerLoader::new()
            .eager_load_one(&conn, &mut items, "post_id", "meta", "id")
            .await
            .unwrap();

        assert_eq!(items[0]["meta"]["name"], json!("late"));
        assert!(items[1]["meta"].is_null());
    }

    #[tokio::test]
    async fn test_eager_load_with_filter() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![]);

        let mut items = vec![row(json!({"id": 1}))];
        EagerLoader::new()
            .eager_load_with(&conn, &mut items, "post_id", "comments", "id", |q| {
                q.where_eq("status", "approved")
            })
            .await
            .unwrap();

        let (sql, bindings) = conn.last_statement().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM comments WHERE post_id IN (?) AND status = ?"
        );
        assert_eq!(bindings, vec![json!("1"), json!("approved")]);
    }

    #[tokio::test]
    async fn test_numeric_and_string_keys_group_together() {
        let conn = FakeConnection::new();
        // Driver decoded the foreign key as a string
        conn.push_rows(vec![row(json!({"id": 30, "post_id": "1"}))]);

        let mut items = vec![row(json!({"id": 1}))];
        EagerLoader::new()
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();

        assert_eq!(items[0]["comments"]["id"], json!(30));
    }

    #[tokio::test]
    async fn test_null_item_key_attaches_null_without_matching() {
        let conn = FakeConnection::new();
        conn.push_rows(vec![row(json!({"id": 40, "post_id": 1}))]);

        let mut items = vec![row(json!({"id": 1})), row(json!({"id": null}))];
        EagerLoader::new()
            .eager_load(&conn, &mut items, "post_id", "comments", "id")
            .await
            .unwrap();

        assert_eq!(items[0]["comments"]["id"], json!(40));
        assert!(items[1]["comments"].is_null());
    }
}
