// services/memory.rs
use crate::services::backend::{Query, RowStore};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

/// Stockage en mémoire avec la même sémantique que le backend hébergé.
/// Utilisé par les tests des services et des routes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simule une panne du backend : tous les appels échouent
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    /// Nombre de lignes d'une table
    pub async fn count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Backend {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query.filters.iter().all(|(column, expected)| match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == *expected,
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| matches(row, query)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, ascending)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(column), b.get(column));
                if *ascending { ordering } else { ordering.reverse() }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let existing = tables.entry(table.to_string()).or_default();

        for row in &rows {
            let id = row.get("id");
            if id.is_some() && existing.iter().any(|r| r.get("id") == id) {
                return Err(AppError::Backend {
                    status: 409,
                    message: format!("duplicate key in {}", table),
                });
            }
        }
        existing.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn upsert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let existing = tables.entry(table.to_string()).or_default();

        for row in &rows {
            match existing.iter_mut().find(|r| r.get("id") == row.get("id")) {
                Some(slot) => *slot = row.clone(),
                None => existing.push(row.clone()),
            }
        }
        Ok(rows)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        self.check_available()?;
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(AppError::Validation("update patch must be an object".to_string())),
        };

        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|row| matches(row, query)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }
}
