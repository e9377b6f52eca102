//! Statement helpers shared by every generated mapper
//!
//! Generated mappers only carry per-table knowledge (column lists, key
//! accessors, joins); building and running the statements happens here,
//! generic over [`Entity`].

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::query::{BuiltQuery, Condition, Field, QueryBuilder, QueryKind};
use crate::traits::{Entity, ExecuteResult, Executor, FromRow, Row};
use crate::value::Value;

/// `SELECT <entity columns> FROM <table>`, ready for more clauses.
pub fn base_query<E: Entity>() -> QueryBuilder {
    let mut qb = QueryBuilder::new();
    qb.set_from(E::TABLE, None);
    for column in E::column_names() {
        let field = Field::new(*column);
        qb.add_field(if E::PRIMARY_KEYS.contains(column) {
            field.primary_key()
        } else {
            field
        });
    }
    qb
}

/// Qualified primary key predicates for `key_values`, in key order.
pub fn add_primary_key<E: Entity>(
    qb: &mut QueryBuilder,
    key_values: Vec<(&'static str, Value)>,
) -> Result<()> {
    if E::PRIMARY_KEYS.is_empty() {
        return Err(Error::InvalidQuery(format!(
            "table `{}` has no primary key",
            E::TABLE
        )));
    }
    for (column, value) in key_values {
        qb.add_where(Condition::eq(column, value).prefix(E::TABLE))?;
    }
    Ok(())
}

/// Run a SELECT and map every row.
pub async fn fetch_all<E, X>(executor: &X, qb: &QueryBuilder) -> Result<Vec<E>>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let query = qb.build(QueryKind::Select)?;
    executor
        .fetch_all(&query)
        .await?
        .iter()
        .map(E::from_row)
        .collect()
}

/// Map joined rows to `(entity, joined)` pairs for a to-one join.
///
/// Joined columns are read from `{alias}__{column}`; a joined side whose
/// columns are all NULL (an outer join without a match) becomes `None`.
pub fn split_joined<E, J>(rows: &[Row], alias: &str) -> Result<Vec<(E, Option<J>)>>
where
    E: Entity,
    J: FromRow,
{
    let prefix = format!("{}__", alias);
    rows.iter()
        .map(|row| {
            let entity = E::from_row(row)?;
            Ok((entity, joined_side(row, &prefix)?))
        })
        .collect()
}

/// Group joined rows by the entity's primary key for a to-many join.
///
/// Groups keep the order in which their entity first appears. Tables
/// without a primary key get one group per row.
pub fn group_joined<E, J>(rows: &[Row], alias: &str) -> Result<Vec<(E, Vec<J>)>>
where
    E: Entity,
    J: FromRow,
{
    let prefix = format!("{}__", alias);
    let mut groups: Vec<(E, Vec<J>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let entity = E::from_row(row)?;
        let joined = joined_side::<J>(row, &prefix)?;
        let slot = if E::PRIMARY_KEYS.is_empty() {
            None
        } else {
            let key = entity
                .primary_key_values()
                .iter()
                .map(|(_, value)| value.to_key_string())
                .collect::<Vec<_>>()
                .join(".");
            match index.get(&key) {
                Some(slot) => Some(*slot),
                None => {
                    index.insert(key, groups.len());
                    None
                }
            }
        };
        match slot {
            Some(slot) => groups[slot].1.extend(joined),
            None => groups.push((entity, joined.into_iter().collect())),
        }
    }
    Ok(groups)
}

fn joined_side<J: FromRow>(row: &Row, prefix: &str) -> Result<Option<J>> {
    let scoped = row.scoped(prefix);
    if scoped.iter().all(|(_, value)| value.is_null()) {
        return Ok(None);
    }
    J::from_row(&scoped).map(Some)
}

/// Run a SELECT and map the first row.
pub async fn fetch_one<E, X>(executor: &X, qb: &QueryBuilder) -> Result<Option<E>>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let query = qb.build(QueryKind::Select)?;
    executor
        .fetch_optional(&query)
        .await?
        .as_ref()
        .map(E::from_row)
        .transpose()
}

/// [`fetch_one`] through a cache: a hit skips the executor, a miss stores
/// the fetched row under `key`.
pub async fn fetch_one_cached<E, X>(
    executor: &X,
    cache: Option<&dyn Cache>,
    key: &str,
    qb: &QueryBuilder,
) -> Result<Option<E>>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let Some(cache) = cache else {
        return fetch_one(executor, qb).await;
    };
    if let Some(row) = cache.get(key) {
        debug!(key, "cache hit");
        return E::from_row(&row).map(Some);
    }
    let query = qb.build(QueryKind::Select)?;
    match executor.fetch_optional(&query).await? {
        Some(row) => {
            let entity = E::from_row(&row)?;
            debug!(key, "cache store");
            cache.set(key, row);
            Ok(Some(entity))
        }
        None => Ok(None),
    }
}

/// Rows keyed by the builder's list-index field.
pub async fn fetch_indexed<E, X>(executor: &X, qb: &QueryBuilder) -> Result<BTreeMap<String, E>>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let index = qb
        .list_index_field()
        .ok_or_else(|| Error::InvalidQuery("no list index field was set".to_string()))?;
    let query = qb.build(QueryKind::Select)?;
    let mut entities = BTreeMap::new();
    for row in executor.fetch_all(&query).await? {
        let key = row.get_value(index)?.to_key_string();
        entities.insert(key, E::from_row(&row)?);
    }
    Ok(entities)
}

/// Fetch raw rows, e.g. for joined selects.
pub async fn fetch_rows<X>(executor: &X, qb: &QueryBuilder) -> Result<Vec<Row>>
where
    X: Executor + ?Sized,
{
    let query = qb.build(QueryKind::Select)?;
    executor.fetch_all(&query).await
}

/// `SELECT COUNT(*)` over the builder's FROM, JOIN and WHERE.
pub async fn count<X>(executor: &X, qb: &QueryBuilder) -> Result<u64>
where
    X: Executor + ?Sized,
{
    let query = qb.build(QueryKind::Count)?;
    read_count(executor, &query).await
}

/// Entities of the builder's select plus the total the select would return
/// without its LIMIT. `SQL_CALC_FOUND_ROWS` is switched on for this call.
pub async fn fetch_all_with_found_rows<E, X>(
    executor: &X,
    qb: &QueryBuilder,
) -> Result<(Vec<E>, u64)>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let mut qb = qb.clone();
    qb.set_calc_found_rows(true);
    let query = qb.build(QueryKind::Select)?;
    let (rows, total) = executor.fetch_all_with_found_rows(&query).await?;
    let entities = rows.iter().map(E::from_row).collect::<Result<Vec<_>>>()?;
    Ok((entities, total))
}

async fn read_count<X>(executor: &X, query: &BuiltQuery) -> Result<u64>
where
    X: Executor + ?Sized,
{
    match executor.fetch_optional(query).await? {
        Some(row) => row.get::<u64>("count"),
        None => Ok(0),
    }
}

/// INSERT the entity, writing the generated id back when the table has an
/// auto-increment column.
pub async fn insert<E, X>(executor: &X, entity: &mut E) -> Result<ExecuteResult>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let mut qb = QueryBuilder::new();
    qb.set_from(E::TABLE, None);
    for (column, value) in entity.insert_values() {
        qb.add_set(column, value);
    }
    let result = executor.execute(&qb.build(QueryKind::Insert)?).await?;
    if let (Some(_), Some(id)) = (E::AUTO_INCREMENT, result.last_insert_id) {
        entity.set_auto_increment_id(id);
    }
    Ok(result)
}

/// INSERT ... ON DUPLICATE KEY UPDATE every non-key column.
pub async fn upsert<E, X>(executor: &X, entity: &mut E) -> Result<ExecuteResult>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let mut qb = QueryBuilder::new();
    qb.set_from(E::TABLE, None);
    for (column, value) in entity.insert_values() {
        qb.add_set(column, value);
    }
    let mut updates = entity.update_values();
    if updates.is_empty() {
        // key-only table: a no-op assignment keeps the statement valid
        updates = entity.primary_key_values();
    }
    for (column, value) in updates {
        qb.add_update(column, value);
    }
    let result = executor.execute(&qb.build(QueryKind::Insert)?).await?;
    if let (Some(_), Some(id)) = (E::AUTO_INCREMENT, result.last_insert_id) {
        if id > 0 {
            entity.set_auto_increment_id(id);
        }
    }
    Ok(result)
}

/// UPDATE every non-key column of the row identified by the entity's key.
pub async fn update<E, X>(executor: &X, entity: &E) -> Result<u64>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let mut qb = QueryBuilder::new();
    qb.set_from(E::TABLE, None);
    for (column, value) in entity.update_values() {
        qb.add_set(column, value);
    }
    for (column, value) in entity.primary_key_values() {
        qb.add_where(Condition::eq(column, value))?;
    }
    let result = executor.execute(&qb.build(QueryKind::Update)?).await?;
    Ok(result.rows_affected)
}

/// DELETE the row identified by the entity's key.
pub async fn delete<E, X>(executor: &X, entity: &E) -> Result<u64>
where
    E: Entity,
    X: Executor + ?Sized,
{
    let mut qb = QueryBuilder::new();
    qb.set_from(E::TABLE, None);
    for (column, value) in entity.primary_key_values() {
        qb.add_where(Condition::eq(column, value))?;
    }
    let result = executor.execute(&qb.build(QueryKind::Delete)?).await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::traits::{FOUND_ROWS_COLUMN, FOUND_ROWS_SQL};

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: i64,
        label: String,
    }

    impl FromRow for Tag {
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                id: row.get("id")?,
                label: row.get("label")?,
            })
        }

        fn column_names() -> &'static [&'static str] {
            &["id", "label"]
        }
    }

    impl Entity for Tag {
        const TABLE: &'static str = "tag";
        const PRIMARY_KEYS: &'static [&'static str] = &["id"];
        const AUTO_INCREMENT: Option<&'static str> = Some("id");

        fn values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::I64(self.id)),
                ("label", Value::String(self.label.clone())),
            ]
        }

        fn set_auto_increment_id(&mut self, id: u64) {
            self.id = id as i64;
        }
    }

    #[derive(Default)]
    struct Recorder {
        queries: Mutex<Vec<BuiltQuery>>,
        rows: Vec<Row>,
    }

    impl Recorder {
        fn sql(&self) -> Vec<String> {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .map(|q| q.sql.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Executor for Recorder {
        async fn execute(&self, query: &BuiltQuery) -> Result<ExecuteResult> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(ExecuteResult {
                rows_affected: 1,
                last_insert_id: Some(41),
            })
        }

        async fn fetch_all(&self, query: &BuiltQuery) -> Result<Vec<Row>> {
            self.queries.lock().unwrap().push(query.clone());
            if query.sql == FOUND_ROWS_SQL {
                return Ok(vec![Row::new().with(FOUND_ROWS_COLUMN, 17u64)]);
            }
            Ok(self.rows.clone())
        }
    }

    fn tag_row(id: i64, label: &str) -> Row {
        Row::new().with("id", id).with("label", label)
    }

    #[tokio::test]
    async fn test_fetch_all_with_found_rows() {
        let executor = Recorder {
            rows: vec![tag_row(1, "a"), tag_row(2, "b")],
            ..Default::default()
        };
        let mut qb = base_query::<Tag>();
        qb.set_limit(2, None);

        let (tags, total): (Vec<Tag>, u64) =
            fetch_all_with_found_rows(&executor, &qb).await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(total, 17);
        assert!(!qb.calc_found_rows());

        let sql = executor.sql();
        assert!(sql[0].starts_with("SELECT SQL_CALC_FOUND_ROWS "));
        assert!(sql[0].ends_with("LIMIT 2"));
        assert_eq!(sql[1], FOUND_ROWS_SQL);
    }

    #[tokio::test]
    async fn test_insert_writes_back_id() {
        let executor = Recorder::default();
        let mut tag = Tag {
            id: 0,
            label: "rust".into(),
        };
        insert(&executor, &mut tag).await.unwrap();

        assert_eq!(tag.id, 41);
        assert_eq!(executor.sql(), vec!["INSERT INTO `tag` SET `label` = :label"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_key() {
        let executor = Recorder::default();
        let tag = Tag {
            id: 3,
            label: "async".into(),
        };
        assert_eq!(update(&executor, &tag).await.unwrap(), 1);
        assert_eq!(delete(&executor, &tag).await.unwrap(), 1);
        assert_eq!(
            executor.sql(),
            vec![
                "UPDATE `tag` SET `label` = :label WHERE `id` = :id",
                "DELETE FROM `tag` WHERE `id` = :id",
            ]
        );
    }

    #[tokio::test]
    async fn test_upsert() {
        let executor = Recorder::default();
        let mut tag = Tag {
            id: 0,
            label: "db".into(),
        };
        upsert(&executor, &mut tag).await.unwrap();
        assert_eq!(
            executor.sql(),
            vec!["INSERT INTO `tag` SET `label` = :label ON DUPLICATE KEY UPDATE `label` = :update_label"]
        );
    }

    #[tokio::test]
    async fn test_fetch_by_key() {
        let executor = Recorder {
            rows: vec![tag_row(7, "orm")],
            ..Default::default()
        };
        let mut qb = base_query::<Tag>();
        add_primary_key::<Tag>(&mut qb, vec![("id", Value::I64(7))]).unwrap();

        let tag: Option<Tag> = fetch_one(&executor, &qb).await.unwrap();
        assert_eq!(tag.unwrap().label, "orm");
        assert_eq!(
            executor.sql(),
            vec!["SELECT `id`, `label` FROM `tag` WHERE `tag`.`id` = :tag_id"]
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_executor() {
        let executor = Recorder {
            rows: vec![tag_row(7, "orm")],
            ..Default::default()
        };
        let cache = MemoryCache::new();
        let qb = base_query::<Tag>();

        let first: Option<Tag> = fetch_one_cached(&executor, Some(&cache), "tag.7", &qb)
            .await
            .unwrap();
        let second: Option<Tag> = fetch_one_cached(&executor, Some(&cache), "tag.7", &qb)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(executor.sql().len(), 1);
    }

    #[tokio::test]
    async fn test_indexed_and_count() {
        let executor = Recorder {
            rows: vec![tag_row(1, "a"), tag_row(2, "b")],
            ..Default::default()
        };
        let mut qb = base_query::<Tag>();
        assert!(fetch_indexed::<Tag, _>(&executor, &qb).await.is_err());

        qb.set_list_index_field("label");
        let tags = fetch_indexed::<Tag, _>(&executor, &qb).await.unwrap();
        assert_eq!(tags["b"].id, 2);

        let counter = Recorder {
            rows: vec![Row::new().with("count", 12i64)],
            ..Default::default()
        };
        assert_eq!(count(&counter, &qb).await.unwrap(), 12);
        assert_eq!(counter.sql(), vec!["SELECT COUNT(*) AS `count` FROM `tag`"]);
    }

    #[test]
    fn test_split_and_group_joined() {
        let rows = vec![
            tag_row(1, "a").with("alias__id", 10i64).with("alias__label", "x"),
            tag_row(1, "a").with("alias__id", 11i64).with("alias__label", "y"),
            tag_row(2, "b")
                .with("alias__id", Value::Null)
                .with("alias__label", Value::Null),
        ];

        let pairs = split_joined::<Tag, Tag>(&rows, "alias").unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].1.as_ref().unwrap().label, "x");
        assert!(pairs[2].1.is_none());

        let groups = group_joined::<Tag, Tag>(&rows, "alias").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.id, 1);
        assert_eq!(
            groups[0].1.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![10, 11]
        );
        assert!(groups[1].1.is_empty());
    }
}
