//! In-memory collection: records in id order plus declared field indices.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde_json::Value;

use desu_core::record::{Filter, Op, Predicate, Query, Record, RecordId, compare_values, field_of};

/// Index key ordered by [`compare_values`].
#[derive(Debug, Clone)]
struct IndexKey(Value);

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_values(&self.0, &other.0)
    }
}

/// Secondary index over one top-level field.
#[derive(Debug, Default)]
struct FieldIndex {
    entries: BTreeMap<IndexKey, BTreeSet<RecordId>>,
}

impl FieldIndex {
    fn add(&mut self, key: &Value, id: RecordId) {
        self.entries
            .entry(IndexKey(key.clone()))
            .or_default()
            .insert(id);
    }

    fn remove(&mut self, key: &Value, id: RecordId) {
        let key = IndexKey(key.clone());
        if let Some(ids) = self.entries.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Ids that may satisfy `filter`; `None` when the index cannot narrow it.
    fn candidates(&self, filter: &Filter) -> Option<BTreeSet<RecordId>> {
        let key = IndexKey(filter.value.clone());
        let range: (Bound<&IndexKey>, Bound<&IndexKey>) = match filter.op {
            Op::Eq => (Bound::Included(&key), Bound::Included(&key)),
            Op::Gt => (Bound::Excluded(&key), Bound::Unbounded),
            Op::Gte => (Bound::Included(&key), Bound::Unbounded),
            Op::Lt => (Bound::Unbounded, Bound::Excluded(&key)),
            Op::Lte => (Bound::Unbounded, Bound::Included(&key)),
            Op::Ne => return None,
        };
        Some(
            self.entries
                .range::<IndexKey, _>(range)
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
        )
    }
}

/// A named set of records with its id counter and indices.
#[derive(Debug)]
pub(crate) struct Collection {
    next_id: RecordId,
    records: BTreeMap<RecordId, Value>,
    indices: BTreeMap<String, FieldIndex>,
}

impl Collection {
    pub(crate) fn new(indices: &[String]) -> Self {
        Self {
            next_id: RecordId::FIRST,
            records: BTreeMap::new(),
            indices: indices
                .iter()
                .map(|field| (field.clone(), FieldIndex::default()))
                .collect(),
        }
    }

    /// Rebuild a collection from persisted records.
    ///
    /// The id counter is forced above every loaded id, whatever the persisted
    /// counter says.
    pub(crate) fn restore(
        next_id: RecordId,
        records: Vec<Record<Value>>,
        indices: &[String],
    ) -> Result<Self, String> {
        let mut collection = Self::new(indices);
        let mut last: Option<RecordId> = None;

        for record in records {
            if last.is_some_and(|prev| prev >= record.id) {
                return Err(format!("record ids out of order at {}", record.id));
            }
            last = Some(record.id);
            collection.put(record.id, record.data);
        }

        let floor = last.map(RecordId::next).unwrap_or(RecordId::FIRST);
        collection.next_id = next_id.max(floor);
        Ok(collection)
    }

    pub(crate) fn next_id(&self) -> RecordId {
        self.next_id
    }

    pub(crate) fn index_fields(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = (RecordId, &Value)> {
        self.records.iter().map(|(id, data)| (*id, data))
    }

    fn put(&mut self, id: RecordId, data: Value) {
        for (field, index) in &mut self.indices {
            index.add(field_of(&data, field), id);
        }
        self.records.insert(id, data);
    }

    pub(crate) fn insert(&mut self, data: Value) -> RecordId {
        let id = self.next_id;
        self.next_id = id.next();
        self.put(id, data);
        id
    }

    /// Matching ids in id order.
    fn matching(&self, predicate: &Predicate) -> Vec<RecordId> {
        let mut narrowed: Option<BTreeSet<RecordId>> = None;

        for filter in predicate.filters() {
            let Some(index) = self.indices.get(&filter.field) else {
                continue;
            };
            let Some(ids) = index.candidates(filter) else {
                continue;
            };
            narrowed = Some(match narrowed {
                Some(prev) => prev.intersection(&ids).copied().collect(),
                None => ids,
            });
        }

        let check = |id: &RecordId| {
            self.records
                .get(id)
                .is_some_and(|data| predicate.matches(data))
        };

        match narrowed {
            Some(ids) => ids.into_iter().filter(check).collect(),
            None => self.records.keys().copied().filter(check).collect(),
        }
    }

    pub(crate) fn find_one(&self, predicate: &Predicate) -> Option<Record<Value>> {
        self.matching(predicate)
            .first()
            .and_then(|id| self.records.get(id).map(|data| Record::new(*id, data.clone())))
    }

    pub(crate) fn query(&self, query: &Query) -> Vec<Record<Value>> {
        let mut hits: Vec<(RecordId, &Value)> = self
            .matching(&query.predicate)
            .into_iter()
            .filter_map(|id| self.records.get(&id).map(|data| (id, data)))
            .collect();

        if let Some(field) = &query.sort {
            // sort_by is stable: equal keys stay in id order.
            hits.sort_by(|a, b| compare_values(field_of(a.1, field), field_of(b.1, field)));
        }

        hits.into_iter()
            .skip(query.window.offset)
            .take(query.window.limit)
            .map(|(id, data)| Record::new(id, data.clone()))
            .collect()
    }

    pub(crate) fn delete_where(&mut self, predicate: &Predicate) -> usize {
        let doomed = self.matching(predicate);
        for id in &doomed {
            if let Some(data) = self.records.remove(id) {
                for (field, index) in &mut self.indices {
                    index.remove(field_of(&data, field), *id);
                }
            }
        }
        doomed.len()
    }
}
