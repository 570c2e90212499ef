//! Row queries and change filters

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Backend tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Orders,
    OrderItems,
    MenuItems,
    Restaurants,
    Venues,
    Events,
    UserRoles,
    RunnerSessions,
    /// Read through `user_roles` embeds only
    Profiles,
}

impl Table {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::MenuItems => "menu_items",
            Self::Restaurants => "restaurants",
            Self::Venues => "venues",
            Self::Events => "events",
            Self::UserRoles => "user_roles",
            Self::RunnerSessions => "runner_sessions",
            Self::Profiles => "profiles",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "orders" => Self::Orders,
            "order_items" => Self::OrderItems,
            "menu_items" => Self::MenuItems,
            "restaurants" => Self::Restaurants,
            "venues" => Self::Venues,
            "events" => Self::Events,
            "user_roles" => Self::UserRoles,
            "runner_sessions" => Self::RunnerSessions,
            "profiles" => Self::Profiles,
            _ => return None,
        })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    IsNull(String),
    In(String, Vec<Value>),
    Gte(String, Value),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::IsNull(c) | Self::In(c, _) | Self::Gte(c, _) => c,
        }
    }

    /// Right-hand side in `op.value` form
    pub fn to_param(&self) -> String {
        match self {
            Self::Eq(_, v) => format!("eq.{}", param_value(v)),
            Self::IsNull(_) => "is.null".to_string(),
            Self::In(_, vs) => {
                let list: Vec<String> = vs
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => list_element(s),
                        other => other.to_string(),
                    })
                    .collect();
                format!("in.({})", list.join(","))
            }
            Self::Gte(_, v) => format!("gte.{}", param_value(v)),
        }
    }

    /// Evaluate against a JSON row
    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Self::Eq(_, v) => values_equal(field, v),
            Self::IsNull(_) => field.is_null(),
            Self::In(_, vs) => vs.iter().any(|v| values_equal(field, v)),
            Self::Gte(_, v) => compare_values(field, v).is_some_and(|o| o.is_ge()),
        }
    }
}

fn param_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote an `in` list element that would otherwise split the list.
/// `eq` operands are taken verbatim and never quoted.
fn list_element(raw: &str) -> String {
    let reserved = raw.is_empty()
        || raw.trim() != raw
        || raw.contains([',', '.', ':', '(', ')', '"', '\\']);
    if !reserved {
        return raw.to_string();
    }
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Numbers numerically, timestamps chronologically, strings lexically
fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => Some(x.cmp(&y)),
                _ => Some(x.cmp(y)),
            }
        }
        _ => None,
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub ascending: bool,
}

/// Select/update query against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    /// Column list, possibly with embeds (`id, status, restaurants(name)`)
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::IsNull(column.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.into()));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(SortKey {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(SortKey {
            column: column.into(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Query-string pairs in row API syntax
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(select) = &self.select {
            params.push(("select".to_string(), select.replace(' ', "")));
        }
        for filter in &self.filters {
            params.push((filter.column().to_string(), filter.to_param()));
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| {
                    format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" })
                })
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Embedded relations named in the select list, e.g. `restaurants`
    pub fn embeds(&self) -> Vec<&str> {
        let Some(select) = &self.select else {
            return Vec::new();
        };
        select
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                part.find('(').map(|i| part[..i].trim())
            })
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Compare two rows by this query's sort keys. Nulls sort as the
    /// largest value: last ascending, first descending.
    pub fn compare_rows(&self, a: &Value, b: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        for key in &self.order {
            let va = a.get(&key.column).unwrap_or(&Value::Null);
            let vb = b.get(&key.column).unwrap_or(&Value::Null);
            let ord = match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => compare_values(va, vb).unwrap_or(Ordering::Equal),
            };
            let ord = if key.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

// ========== Change feed ==========

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Which changes a subscription receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub table: Table,
    /// `None` means every kind
    pub kind: Option<ChangeKind>,
    /// `column=eq.value` scope
    pub eq: Option<(String, String)>,
}

impl ChangeFilter {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            kind: None,
            eq: None,
        }
    }

    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.eq = Some((column.into(), value.into()));
        self
    }

    /// `event` value for the channel join (`*` for every kind)
    pub fn event_name(&self) -> &'static str {
        self.kind.map(|k| k.as_str()).unwrap_or("*")
    }

    /// `filter` value for the channel join
    pub fn filter_expr(&self) -> Option<String> {
        self.eq.as_ref().map(|(c, v)| format!("{}=eq.{}", c, v))
    }

    /// Topic suffix that identifies this subscription
    pub fn topic(&self) -> String {
        match &self.eq {
            Some((c, v)) => format!("{}:{}={}", self.table, c, v),
            None => self.table.to_string(),
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table.as_str() {
            return false;
        }
        if self.kind.is_some_and(|k| k != event.kind) {
            return false;
        }
        match &self.eq {
            Some((column, expected)) => {
                let row = if event.kind == ChangeKind::Delete {
                    &event.old_record
                } else {
                    &event.record
                };
                match row.get(column) {
                    Some(Value::String(s)) => s == expected,
                    Some(Value::Null) | None => false,
                    Some(other) => other.to_string() == *expected,
                }
            }
            None => true,
        }
    }
}

/// One row change
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    /// New row (empty object for deletes)
    pub record: Value,
    /// Previous row, when the backend sends it
    pub old_record: Value,
}

impl ChangeEvent {
    pub fn record_str(&self, column: &str) -> Option<&str> {
        self.record.get(column).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params() {
        let q = Query::table(Table::Orders)
            .select("id, status, restaurants(name)")
            .eq("venue_id", "v1")
            .in_list("status", ["pending", "confirmed"])
            .is_null("runner_id")
            .order_asc("created_at");
        let params = q.to_params();
        assert_eq!(params[0], ("select".into(), "id,status,restaurants(name)".into()));
        assert_eq!(params[1], ("venue_id".into(), "eq.v1".into()));
        assert_eq!(params[2], ("status".into(), "in.(pending,confirmed)".into()));
        assert_eq!(params[3], ("runner_id".into(), "is.null".into()));
        assert_eq!(params[4], ("order".into(), "created_at.asc".into()));
        assert_eq!(q.embeds(), ["restaurants"]);
    }

    #[test]
    fn test_filter_matching() {
        let row = json!({ "id": "o1", "status": "pending", "runner_id": null, "total": 12 });
        assert!(Filter::Eq("status".into(), json!("pending")).matches(&row));
        assert!(Filter::IsNull("runner_id".into()).matches(&row));
        assert!(Filter::IsNull("missing".into()).matches(&row));
        assert!(Filter::In("status".into(), vec![json!("claimed"), json!("pending")]).matches(&row));
        assert!(Filter::Eq("total".into(), json!(12.0)).matches(&row));
        assert!(!Filter::Eq("status".into(), json!("claimed")).matches(&row));
    }

    #[test]
    fn test_gte_timestamps() {
        let row = json!({ "ends_at": "2026-05-01T22:00:00+00:00" });
        assert!(Filter::Gte("ends_at".into(), json!("2026-05-01T21:59:59.500Z")).matches(&row));
        assert!(!Filter::Gte("ends_at".into(), json!("2026-05-01T22:00:01Z")).matches(&row));
    }

    #[test]
    fn test_compare_rows() {
        let q = Query::table(Table::MenuItems).order_asc("section").order_asc("name");
        let a = json!({ "section": "Drinks", "name": "Soda" });
        let b = json!({ "section": "Drinks", "name": "Beer" });
        let c = json!({ "section": null, "name": "Water" });
        assert!(q.compare_rows(&a, &b).is_gt());
        assert!(q.compare_rows(&c, &a).is_gt());
    }

    #[test]
    fn test_descending_puts_nulls_first() {
        let q = Query::table(Table::Orders).order_desc("delivered_at");
        let late = json!({ "delivered_at": "2026-05-01T21:00:00Z" });
        let early = json!({ "delivered_at": "2026-05-01T19:00:00Z" });
        let open = json!({ "delivered_at": null });

        let mut rows = vec![early.clone(), open.clone(), late.clone()];
        rows.sort_by(|a, b| q.compare_rows(a, b));
        assert_eq!(rows, [open, late, early]);
    }

    #[test]
    fn test_in_list_quotes_reserved_values() {
        let q = Query::table(Table::Restaurants)
            .in_list("name", ["Dog House", "Smith, Jr. (Grill)", "Say \"hi\"", "C:\\bar"])
            .eq("name", "Smith, Jr.");
        let params = q.to_params();
        assert_eq!(
            params[0].1,
            r#"in.(Dog House,"Smith, Jr. (Grill)","Say \"hi\"","C:\\bar")"#
        );
        assert_eq!(params[1].1, "eq.Smith, Jr.");
        assert_eq!(Filter::In("total".into(), vec![json!(12.5)]).to_param(), "in.(12.5)");
    }

    #[test]
    fn test_change_filter() {
        let filter = ChangeFilter::table(Table::Orders)
            .kind(ChangeKind::Update)
            .eq("id", "o1");
        assert_eq!(filter.event_name(), "UPDATE");
        assert_eq!(filter.filter_expr().as_deref(), Some("id=eq.o1"));

        let hit = ChangeEvent {
            kind: ChangeKind::Update,
            table: "orders".into(),
            record: json!({ "id": "o1", "status": "claimed" }),
            old_record: json!({}),
        };
        assert!(filter.matches(&hit));

        let other = ChangeEvent {
            record: json!({ "id": "o2" }),
            ..hit.clone()
        };
        assert!(!filter.matches(&other));

        let insert = ChangeEvent {
            kind: ChangeKind::Insert,
            ..hit
        };
        assert!(!filter.matches(&insert));
        assert!(ChangeFilter::table(Table::Orders).matches(&insert));
    }
}
