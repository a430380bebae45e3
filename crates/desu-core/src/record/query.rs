//! Predicates, sorting, and pagination over stored records.
//!
//! Records are opaque JSON payloads; a predicate inspects top-level fields of
//! the payload. Comparisons use a single total order over JSON values (see
//! [`compare_values`]) so that filtering, sorting, and index range scans all
//! agree with each other.

use std::cmp::Ordering;

use serde_json::Value;

/// Default page size when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 100;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single comparison against one payload field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl Filter {
    fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Lte, value)
    }

    /// Whether `data` satisfies this filter. A missing field reads as `null`.
    pub fn matches(&self, data: &Value) -> bool {
        let actual = field_of(data, &self.field);
        let ord = compare_values(actual, &self.value);
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
            Op::Gt => ord == Ordering::Greater,
            Op::Gte => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Lte => ord != Ordering::Greater,
        }
    }
}

/// A conjunction of filters. The empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    filters: Vec<Filter>,
}

impl Predicate {
    /// The predicate that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a filter to the conjunction.
    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }
}

impl From<Filter> for Predicate {
    fn from(filter: Filter) -> Self {
        Predicate::all().and(filter)
    }
}

/// Offset/limit window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Number of matching records skipped.
    pub offset: usize,
    /// Maximum number of records returned.
    pub limit: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Window {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Build a window from optional parts, falling back to the defaults.
    pub fn from_parts(offset: Option<usize>, limit: Option<usize>) -> Self {
        let default = Self::default();
        Self {
            offset: offset.unwrap_or(default.offset),
            limit: limit.unwrap_or(default.limit),
        }
    }

    /// Everything from the start, without a limit.
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

/// A full query: filter, stable ascending sort, then window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicate: Predicate,
    /// Field to sort by; `None` keeps insertion (id) order.
    pub sort: Option<String>,
    pub window: Window,
}

impl Query {
    pub fn new(predicate: impl Into<Predicate>) -> Self {
        Self {
            predicate: predicate.into(),
            ..Self::default()
        }
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }
}

/// Look up a top-level field; anything absent reads as `null`.
pub fn field_of<'a>(data: &'a Value, field: &str) -> &'a Value {
    data.get(field).unwrap_or(&Value::Null)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values.
///
/// Values of different kinds order by kind: null < bool < number < string <
/// array < object. Numbers compare numerically (integers exactly), strings
/// lexicographically, arrays element-wise, objects by their sorted entries.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x.cmp(&y);
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x.cmp(&y);
            }
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut xs: Vec<_> = x.iter().collect();
            let mut ys: Vec<_> = y.iter().collect();
            xs.sort_by(|l, r| l.0.cmp(r.0));
            ys.sort_by(|l, r| l.0.cmp(r.0));
            for ((lk, lv), (rk, rv)) in xs.iter().zip(&ys) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
