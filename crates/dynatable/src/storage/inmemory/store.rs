//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynatable_core::attribute::wire;
use dynatable_core::store::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, QueryOutput, UpdateItemInput,
    UpdateItemOutput,
};
use dynatable_core::{
    AttributeMap, AttributeValue, ExclusiveStartKey, ExpressionAttributes, KeySchema,
    ReturnValues, Store, StoreError, StoreResult,
};

use super::expression::{
    numeric_cmp, parse_condition, parse_key_condition, parse_projection, parse_update,
};

/// A scalar key value with the store's ordering: numbers by value, strings
/// and binary bytewise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    S(String),
    N(String),
    B(Vec<u8>),
}

impl KeyPart {
    fn from_value(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => Some(KeyPart::S(s.clone())),
            AttributeValue::N(n) => Some(KeyPart::N(n.clone())),
            AttributeValue::B(b) => Some(KeyPart::B(b.clone())),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::S(_) => 0,
            KeyPart::N(_) => 1,
            KeyPart::B(_) => 2,
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::S(a), KeyPart::S(b)) => a.cmp(b),
            (KeyPart::N(a), KeyPart::N(b)) => numeric_cmp(a, b),
            (KeyPart::B(a), KeyPart::B(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type Partition = BTreeMap<Option<KeyPart>, AttributeMap>;

#[derive(Debug)]
struct MemTable {
    schema: KeySchema,
    partitions: HashMap<KeyPart, Partition>,
}

impl MemTable {
    fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            partitions: HashMap::new(),
        }
    }

    /// Splits a validated key map into its partition and sort positions.
    fn position(&self, key: &AttributeMap) -> StoreResult<(KeyPart, Option<KeyPart>)> {
        self.schema.validate_key(key).map_err(|e| {
            StoreError::new(
                StoreError::VALIDATION,
                format!("The provided key element does not match the schema: {e}"),
            )
        })?;

        let part = |name: &str| {
            key.get(name).and_then(KeyPart::from_value).ok_or_else(|| {
                StoreError::new(StoreError::VALIDATION, format!("Missing the key {name}"))
            })
        };

        let hash = part(&self.schema.hash_key().name)?;
        let range = match self.schema.range_key() {
            Some(range) => Some(part(&range.name)?),
            None => None,
        };
        Ok((hash, range))
    }

    fn get(&self, key: &AttributeMap) -> StoreResult<Option<&AttributeMap>> {
        let (hash, range) = self.position(key)?;
        Ok(self
            .partitions
            .get(&hash)
            .and_then(|partition| partition.get(&range)))
    }

    fn insert(&mut self, item: AttributeMap) -> StoreResult<()> {
        let (hash, range) = self.position(&item)?;
        self.partitions.entry(hash).or_default().insert(range, item);
        Ok(())
    }

    fn remove(&mut self, key: &AttributeMap) -> StoreResult<Option<AttributeMap>> {
        let (hash, range) = self.position(key)?;
        let Some(partition) = self.partitions.get_mut(&hash) else {
            return Ok(None);
        };
        let removed = partition.remove(&range);
        if partition.is_empty() {
            self.partitions.remove(&hash);
        }
        Ok(removed)
    }
}

/// A thread-safe in-memory store for tests and local development.
///
/// Uses a table map wrapped in `Arc<RwLock<_>>`; clones share data. Tables
/// must be created with [`create_table`](Self::create_table) before use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, MemTable>>>,
}

impl InMemoryStore {
    /// Creates a store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with the given key schema.
    pub async fn create_table(&self, name: impl Into<String>, schema: KeySchema) -> StoreResult<()> {
        let name = name.into();
        let mut tables = self.tables.write().await;
        if tables.contains_key(&name) {
            return Err(StoreError::new(
                "ResourceInUseException",
                format!("Table already exists: {name}"),
            ));
        }
        tracing::debug!(table = %name, "Created in-memory table");
        tables.insert(name, MemTable::new(schema));
        Ok(())
    }

    /// Number of items currently stored in a table.
    pub async fn item_count(&self, name: &str) -> StoreResult<usize> {
        let tables = self.tables.read().await;
        let table = table(&tables, name)?;
        Ok(table.partitions.values().map(BTreeMap::len).sum())
    }
}

fn table<'a>(tables: &'a HashMap<String, MemTable>, name: &str) -> StoreResult<&'a MemTable> {
    tables.get(name).ok_or_else(|| not_found(name))
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, MemTable>,
    name: &str,
) -> StoreResult<&'a mut MemTable> {
    tables.get_mut(name).ok_or_else(|| not_found(name))
}

fn not_found(name: &str) -> StoreError {
    StoreError::new(
        StoreError::RESOURCE_NOT_FOUND,
        format!("Requested resource not found: Table: {name} not found"),
    )
}

fn conditional_check_failed() -> StoreError {
    StoreError::new(
        StoreError::CONDITIONAL_CHECK_FAILED,
        "The conditional request failed",
    )
}

/// Fails unless `condition` holds against the current item.
fn check_condition(
    condition: Option<&str>,
    attributes: &ExpressionAttributes,
    current: Option<&AttributeMap>,
) -> StoreResult<()> {
    let Some(condition) = condition else {
        return Ok(());
    };
    let empty = AttributeMap::new();
    if parse_condition(condition, attributes)?.evaluate(current.unwrap_or(&empty)) {
        Ok(())
    } else {
        Err(conditional_check_failed())
    }
}

fn project(
    item: &AttributeMap,
    projection: Option<&str>,
    attributes: &ExpressionAttributes,
) -> StoreResult<AttributeMap> {
    let Some(projection) = projection else {
        return Ok(item.clone());
    };
    let paths = parse_projection(projection, attributes)?;
    Ok(paths
        .into_iter()
        .filter_map(|path| item.get(&path).cloned().map(|value| (path, value)))
        .collect())
}

fn returned_attributes(
    return_values: ReturnValues,
    before: Option<&AttributeMap>,
    after: &AttributeMap,
    touched: &[String],
) -> Option<AttributeMap> {
    let pick = |item: &AttributeMap| -> AttributeMap {
        touched
            .iter()
            .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    };

    let attributes = match return_values {
        ReturnValues::None => return None,
        ReturnValues::AllOld => before?.clone(),
        ReturnValues::UpdatedOld => pick(before?),
        ReturnValues::AllNew => after.clone(),
        ReturnValues::UpdatedNew => pick(after),
    };
    (!attributes.is_empty()).then_some(attributes)
}

/// Turns the query's start key into a key map, the way the service would
/// parse it off the wire.
fn start_key(start: ExclusiveStartKey) -> StoreResult<AttributeMap> {
    match start {
        ExclusiveStartKey::Key(key) => Ok(key),
        ExclusiveStartKey::Unchecked(value) if value.is_object() => wire::map_from_wire(&value)
            .map_err(|e| StoreError::new(StoreError::SERIALIZATION, e.to_string())),
        ExclusiveStartKey::Unchecked(value) => Err(StoreError::new(
            StoreError::SERIALIZATION,
            format!("Start of structure or map found where not expected: {value}"),
        )),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_item(&self, input: PutItemInput) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, &input.table_name)?;

        let current = table.get(&input.item)?;
        check_condition(
            input.condition_expression.as_deref(),
            &input.expression_attributes,
            current,
        )?;

        tracing::trace!(table = %input.table_name, "Put item");
        table.insert(input.item)
    }

    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<AttributeMap>> {
        let tables = self.tables.read().await;
        let table = table(&tables, &input.table_name)?;

        match table.get(&input.key)? {
            Some(item) => {
                tracing::trace!(table = %input.table_name, "Item found");
                project(
                    item,
                    input.projection_expression.as_deref(),
                    &input.expression_attributes,
                )
                .map(Some)
            }
            None => {
                tracing::trace!(table = %input.table_name, "Item not found");
                Ok(None)
            }
        }
    }

    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<UpdateItemOutput> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, &input.table_name)?;

        let key = table.schema.extract_key(&input.key).map_err(|e| {
            StoreError::new(
                StoreError::VALIDATION,
                format!("The provided key element does not match the schema: {e}"),
            )
        })?;
        let before = table.get(&key)?.cloned();
        check_condition(
            input.condition_expression.as_deref(),
            &input.expression_attributes,
            before.as_ref(),
        )?;

        let mut after = before.clone().unwrap_or_else(|| key.clone());
        let touched = match &input.update_expression {
            Some(update) => {
                parse_update(update, &input.expression_attributes)?.apply(&mut after, &table.schema)?
            }
            None => Vec::new(),
        };

        let attributes = returned_attributes(input.return_values, before.as_ref(), &after, &touched);
        tracing::trace!(
            table = %input.table_name,
            created = before.is_none(),
            updated = touched.len(),
            "Updated item"
        );
        table.insert(after)?;

        Ok(UpdateItemOutput { attributes })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let table = table_mut(&mut tables, &input.table_name)?;

        let current = table.get(&input.key)?;
        check_condition(
            input.condition_expression.as_deref(),
            &input.expression_attributes,
            current,
        )?;

        let removed = table.remove(&input.key)?;
        tracing::trace!(
            table = %input.table_name,
            existed = removed.is_some(),
            "Deleted item"
        );
        Ok(())
    }

    async fn query(&self, input: QueryInput) -> StoreResult<QueryOutput> {
        let tables = self.tables.read().await;
        let table = table(&tables, &input.table_name)?;

        if let Some(index) = &input.index_name {
            return Err(StoreError::new(
                StoreError::VALIDATION,
                format!("The table does not have the specified index: {index}"),
            ));
        }
        let key_condition = input.key_condition_expression.as_deref().ok_or_else(|| {
            StoreError::new(
                StoreError::VALIDATION,
                "Either the KeyConditions or KeyConditionExpression parameter must be specified",
            )
        })?;
        let key_condition =
            parse_key_condition(key_condition, &input.expression_attributes, &table.schema)?;
        let filter = input
            .filter_expression
            .as_deref()
            .map(|filter| parse_condition(filter, &input.expression_attributes))
            .transpose()?;
        if let Some(limit) = input.limit {
            if limit < 1 {
                return Err(StoreError::new(
                    StoreError::VALIDATION,
                    "Limit must be greater than or equal to 1",
                ));
            }
        }

        let hash = KeyPart::from_value(&key_condition.hash).ok_or_else(|| {
            StoreError::new(StoreError::VALIDATION, "Invalid hash key value")
        })?;

        let resume_after = match input.exclusive_start_key {
            Some(start) => {
                let start = start_key(start)?;
                let (start_hash, start_range) = table.position(&start).map_err(|_| {
                    StoreError::new(StoreError::VALIDATION, "The provided starting key is invalid")
                })?;
                if start_hash != hash {
                    return Err(StoreError::new(
                        StoreError::VALIDATION,
                        "The provided starting key is outside query boundaries based on provided conditions",
                    ));
                }
                Some(start_range)
            }
            None => None,
        };

        let empty = Partition::new();
        let partition = table.partitions.get(&hash).unwrap_or(&empty);
        let mut candidates: Box<dyn Iterator<Item = (&Option<KeyPart>, &AttributeMap)> + '_> =
            if input.scan_index_forward {
                Box::new(partition.iter())
            } else {
                Box::new(partition.iter().rev())
            };
        if let Some(after) = &resume_after {
            let forward = input.scan_index_forward;
            candidates = Box::new(candidates.skip_while(move |(range, _)| {
                if forward {
                    *range <= after
                } else {
                    *range >= after
                }
            }));
        }

        let limit = input.limit.map(|l| l as usize);
        let mut items = Vec::new();
        let mut evaluated = 0;
        let mut last_evaluated = None;
        let mut candidates = candidates
            .filter(|(_, item)| {
                key_condition
                    .range
                    .as_ref()
                    .is_none_or(|range| range.evaluate(item))
            })
            .peekable();

        while let Some((_, item)) = candidates.next() {
            evaluated += 1;
            if filter.as_ref().is_none_or(|f| f.evaluate(item)) {
                items.push(project(
                    item,
                    input.projection_expression.as_deref(),
                    &input.expression_attributes,
                )?);
            }
            if limit == Some(evaluated) {
                if candidates.peek().is_some() {
                    last_evaluated = Some(table.schema.extract_key(item).map_err(|e| {
                        StoreError::new(StoreError::VALIDATION, e.to_string())
                    })?);
                }
                break;
            }
        }

        tracing::trace!(
            table = %input.table_name,
            count = items.len(),
            scanned = evaluated,
            has_more = last_evaluated.is_some(),
            "Query"
        );

        Ok(QueryOutput {
            items,
            last_evaluated_key: last_evaluated,
        })
    }
}
