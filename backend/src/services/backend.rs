// services/backend.rs
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Requête de lecture/filtrage sur une table du backend hébergé
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Filtre d'égalité `colonne = valeur`
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Paramètres au format PostgREST (`col=eq.val&order=col.asc`)
    pub fn to_query_string(&self, with_select: bool) -> String {
        let mut params = Vec::new();
        if with_select {
            params.push("select=*".to_string());
        }
        for (column, value) in &self.filters {
            params.push(format!(
                "{}=eq.{}",
                urlencoding::encode(column),
                urlencoding::encode(value)
            ));
        }
        if let Some((column, ascending)) = &self.order {
            let direction = if *ascending { "asc" } else { "desc" };
            params.push(format!("order={}.{}", urlencoding::encode(column), direction));
        }
        if let Some(limit) = self.limit {
            params.push(format!("limit={}", limit));
        }
        params.join("&")
    }
}

/// Accès générique par lignes au stockage relationnel hébergé
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Lire les lignes correspondant à la requête
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Insérer des lignes ; un identifiant déjà présent est un conflit
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Insérer ou remplacer des lignes par identifiant
    async fn upsert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Fusionner `patch` dans toutes les lignes filtrées
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>>;
}

/// Lire et désérialiser toutes les lignes
pub async fn fetch_all<T: DeserializeOwned>(store: &dyn RowStore, query: &Query) -> Result<Vec<T>> {
    store
        .select(query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| AppError::ParseError(e.to_string())))
        .collect()
}

/// Lire au plus une ligne
pub async fn fetch_optional<T: DeserializeOwned>(
    store: &dyn RowStore,
    query: &Query,
) -> Result<Option<T>> {
    let query = query.clone().limit(1);
    Ok(fetch_all(store, &query).await?.into_iter().next())
}

/// Insérer une ligne typée et renvoyer la représentation stockée
pub async fn insert_one<T: Serialize + DeserializeOwned>(
    store: &dyn RowStore,
    table: &str,
    row: &T,
) -> Result<T> {
    let rows = store.insert(table, vec![serde_json::to_value(row)?]).await?;
    first_row(rows, table)
}

/// Mettre à jour une ligne par identifiant et renvoyer la version stockée
pub async fn update_by_id<T: DeserializeOwned>(
    store: &dyn RowStore,
    table: &str,
    id: impl fmt::Display,
    patch: Value,
) -> Result<T> {
    let query = Query::table(table).eq("id", id);
    let rows = store.update(&query, patch).await?;
    first_row(rows, table)
}

/// Upsert d'une collection typée
pub async fn upsert_all<T: Serialize>(store: &dyn RowStore, table: &str, rows: &[T]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(store.upsert(table, values).await?.len())
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> Result<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("row in {}", table)))?;
    serde_json::from_value(row).map_err(|e| AppError::ParseError(e.to_string()))
}

/// Client REST pour le backend hébergé (PostgREST).
///
/// `apikey` porte toujours la clé publique ; le jeton `Bearer` détermine le rôle
/// appliqué par les politiques de lignes. Le serveur écrit avec la clé de service
/// et contrôle lui-même l'appartenance des lignes (profil, consultations).
#[derive(Clone)]
pub struct BackendClient {
    http_client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl BackendClient {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client: Arc::new(http_client),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: api_key.to_string(),
        })
    }

    /// Utilise la clé `service_role` comme jeton `Bearer`
    pub fn with_service_role(mut self, service_role_key: &str) -> Self {
        self.bearer = service_role_key.to_string();
        self
    }

    fn request(&self, method: Method, table: &str, query_string: &str) -> RequestBuilder {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(query_string);
        }

        self.http_client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    async fn rows(response: Response) -> Result<Vec<Value>> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Vec<Value>>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Backend {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

/// Extrait le champ `message` d'une erreur PostgREST, sinon le corps brut
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl RowStore for BackendClient {
    #[instrument(skip(self), fields(table = %query.table))]
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let response = self
            .request(Method::GET, &query.table, &query.to_query_string(true))
            .send()
            .await?;
        let rows = Self::rows(response).await?;
        debug!(count = rows.len(), "Lignes lues");
        Ok(rows)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .request(Method::POST, table, "")
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .request(Method::POST, table, "")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    #[instrument(skip(self, patch), fields(table = %query.table))]
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let response = self
            .request(Method::PATCH, &query.table, &query.to_query_string(false))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_query_string() {
        let query = Query::table("profiles")
            .eq("id", "a b")
            .order("created_at", false)
            .limit(3);
        assert_eq!(
            query.to_query_string(true),
            "select=*&id=eq.a%20b&order=created_at.desc&limit=3"
        );
        assert_eq!(Query::table("courses").to_query_string(false), "");
    }

    #[tokio::test]
    async fn test_select_sends_filters_and_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/courses"))
            .and(query_param("select", "*"))
            .and(query_param("id", "eq.btech"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "btech"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), "anon-key", 5).unwrap();
        let rows = client.select(&Query::table("courses").eq("id", "btech")).await.unwrap();
        assert_eq!(rows, vec![json!({"id": "btech"})]);
    }

    #[tokio::test]
    async fn test_update_patches_filtered_rows() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("id", "eq.42"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!({"age": 17})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "42", "age": 17}])))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), "anon-key", 5).unwrap();
        let rows = client
            .update(&Query::table("profiles").eq("id", 42), json!({"age": 17}))
            .await
            .unwrap();
        assert_eq!(rows[0]["age"], 17);
    }

    #[tokio::test]
    async fn test_service_role_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "42", "age": 17}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), "anon-key", 5)
            .unwrap()
            .with_service_role("service-key");
        let rows = client
            .update(&Query::table("profiles").eq("id", 42), json!({"age": 17}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"message": "duplicate key value violates unique constraint"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), "anon-key", 5).unwrap();
        let err = client.insert("profiles", vec![json!({"id": 1})]).await.unwrap_err();
        match err {
            AppError::Backend { status, message } => {
                assert_eq!(status, 409);
                assert!(message.contains("duplicate key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upsert_uses_merge_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/courses"))
            .and(header_exists("Prefer"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "a"}, {"id": "b"}])))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri(), "anon-key", 5).unwrap();
        let count = upsert_all(&client, "courses", &[json!({"id": "a"}), json!({"id": "b"})])
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
