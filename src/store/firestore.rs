use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};

use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::query::Query;
use crate::store::{DocumentStore, Fields, RawDocument};

/// `DocumentStore` backed by the Firestore REST API
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    id_token: RwLock<Option<String>>,
}

impl FirestoreStore {
    /// Create a store from backend configuration
    pub fn new(config: &BackendConfig, api_key: Option<String>) -> Result<Self, StoreError> {
        let project_id = config
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Config("backend.project_id is not set".to_string()))?;

        let client = Client::builder()
            .user_agent(concat!("recipe-saver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(FirestoreStore {
            client,
            documents_url: documents_url(&config.firestore_url, project_id, &config.database),
            api_key,
            id_token: RwLock::new(None),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: &str, project_id: &str) -> Self {
        FirestoreStore {
            client: Client::new(),
            documents_url: documents_url(base_url, project_id, "(default)"),
            api_key: None,
            id_token: RwLock::new(None),
        }
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    /// Attach the API key and bearer token, if any
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        let token = self
            .id_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, target: &str) -> Result<Response, StoreError> {
        let response = self.prepare(request).send().await?;
        check_status(response, target).await
    }
}

fn documents_url(base_url: &str, project_id: &str, database: &str) -> String {
    format!(
        "{}/v1/projects/{}/databases/{}/documents",
        base_url.trim_end_matches('/'),
        project_id,
        database
    )
}

async fn check_status(response: Response, target: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(target.to_string()));
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend_name(&self) -> &str {
        "firestore"
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>, StoreError> {
        let body = structured_query(query);
        debug!("{}", body);

        let response = self
            .send(
                self.client
                    .post(format!("{}:runQuery", self.documents_url))
                    .json(&body),
                query.collection(),
            )
            .await?;

        let results: Vec<Value> = response.json().await?;
        let documents = results
            .iter()
            .filter_map(|result| result.get("document"))
            .filter_map(|document| match decode_document(document) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!("Skipping query result in {}: {}", query.collection(), e);
                    None
                }
            })
            .collect();
        Ok(documents)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let response = self
            .send(
                self.client
                    .post(format!("{}/{}", self.documents_url, collection))
                    .json(&json!({ "fields": encode_fields(&fields) })),
                collection,
            )
            .await?;

        let document: Value = response.json().await?;
        let id = document_id(&document)?;
        info!("Created {}/{}", collection, id);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let target = format!("{}/{}", collection, id);
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        self.send(
            self.client
                .patch(self.document_url(collection, id))
                .query(&params)
                .json(&json!({ "fields": encode_fields(&fields) })),
            &target,
        )
        .await?;
        info!("Updated {}", target);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let target = format!("{}/{}", collection, id);
        self.send(
            self.client
                .delete(self.document_url(collection, id))
                .query(&[("currentDocument.exists", "true")]),
            &target,
        )
        .await?;
        info!("Deleted {}", target);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<RawDocument, StoreError> {
        let target = format!("{}/{}", collection, id);
        let response = self
            .send(self.client.get(self.document_url(collection, id)), &target)
            .await?;
        let document: Value = response.json().await?;
        decode_document(&document)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let target = format!("{}/{}", collection, id);
        self.send(
            self.client
                .patch(self.document_url(collection, id))
                .json(&json!({ "fields": encode_fields(&fields) })),
            &target,
        )
        .await?;
        Ok(())
    }

    fn authorize(&self, id_token: Option<String>) {
        *self
            .id_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = id_token;
    }
}

/// Build the `runQuery` request body
fn structured_query(query: &Query) -> Value {
    let mut filters: Vec<Value> = query
        .filters()
        .iter()
        .map(|filter| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": "EQUAL",
                    "value": encode_value(&filter.value.to_json()),
                }
            })
        })
        .collect();

    let mut structured = json!({
        "from": [{ "collectionId": query.collection() }],
    });
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.remove(0),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            })
        }
    }

    json!({ "structuredQuery": structured })
}

fn document_id(document: &Value) -> Result<String, StoreError> {
    document["name"]
        .as_str()
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Decode("document has no name".to_string()))
}

fn decode_document(document: &Value) -> Result<RawDocument, StoreError> {
    let id = document_id(document)?;
    let fields = match document.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields),
        _ => Fields::new(),
    };
    Ok(RawDocument { id, fields })
}

fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

/// Convert a typed Firestore value to plain JSON.
///
/// Kinds without a JSON counterpart are passed through untouched and left to
/// the entity mapper to reject.
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return value.clone();
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "booleanValue" | "doubleValue" => inner.clone(),
        "nullValue" => Value::Null,
        "integerValue" => inner
            .as_str()
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)),
            _ => Value::Object(Map::new()),
        },
        "arrayValue" => match inner.get("values") {
            Some(Value::Array(values)) => Value::Array(values.iter().map(decode_value).collect()),
            _ => Value::Array(Vec::new()),
        },
        _ => value.clone(),
    }
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::ModerationState;
    use crate::query::QueryBuilder;
    use crate::model::SearchCriteria;
    use mockito::{Matcher, Server};

    const DOCUMENTS: &str = "/v1/projects/demo/databases/(default)/documents";

    #[test]
    fn test_single_filter_query_has_no_composite() {
        let query = QueryBuilder::new("Recipes")
            .moderation(ModerationState::Pending)
            .build();
        let body = structured_query(&query);
        assert_eq!(
            body["structuredQuery"]["where"]["fieldFilter"]["value"],
            json!({ "booleanValue": false })
        );
        assert_eq!(
            body["structuredQuery"]["from"][0]["collectionId"],
            json!("Recipes")
        );
    }

    #[test]
    fn test_multiple_filters_are_anded() {
        let query = QueryBuilder::new("Recipes")
            .moderation(ModerationState::Approved)
            .criteria(&SearchCriteria::new().name("Cranberry Salsa"))
            .build();
        let body = structured_query(&query);
        let composite = &body["structuredQuery"]["where"]["compositeFilter"];
        assert_eq!(composite["op"], json!("AND"));
        assert_eq!(composite["filters"].as_array().unwrap().len(), 2);
        assert_eq!(
            composite["filters"][1]["fieldFilter"]["value"],
            json!({ "stringValue": "Cranberry Salsa" })
        );
    }

    #[test]
    fn test_empty_query_has_no_where() {
        let body = structured_query(&QueryBuilder::new("Recipes").build());
        assert!(body["structuredQuery"].get("where").is_none());
    }

    #[test]
    fn test_value_decoding() {
        assert_eq!(decode_value(&json!({"stringValue": "Soup"})), json!("Soup"));
        assert_eq!(decode_value(&json!({"booleanValue": true})), json!(true));
        assert_eq!(decode_value(&json!({"integerValue": "42"})), json!(42));
        assert_eq!(decode_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            decode_value(&json!({"arrayValue": {"values": [{"stringValue": "a"}]}})),
            json!(["a"])
        );
        assert_eq!(
            decode_value(&json!({"mapValue": {"fields": {"k": {"doubleValue": 1.5}}}})),
            json!({"k": 1.5})
        );
    }

    #[test]
    fn test_value_encoding_round_trips() {
        let fields = json!({
            "name": "Cranberry Salsa",
            "approved": false,
            "servings": 4,
            "tags": ["vegan"]
        });
        let encoded = encode_fields(fields.as_object().unwrap());
        assert_eq!(encoded["servings"], json!({"integerValue": "4"}));
        let decoded = decode_fields(encoded.as_object().unwrap());
        assert_eq!(Value::Object(decoded), fields);
    }

    #[tokio::test]
    async fn test_run_query_decodes_documents() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", format!("{}:runQuery", DOCUMENTS).as_str())
            .match_body(Matcher::PartialJson(json!({
                "structuredQuery": { "from": [{ "collectionId": "Recipes" }] }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "document": {
                            "name": "projects/demo/databases/(default)/documents/Recipes/abc123",
                            "fields": {
                                "name": {"stringValue": "Cranberry Salsa"},
                                "approved": {"booleanValue": true}
                            }
                        },
                        "readTime": "2024-11-27T10:00:00Z"
                    }
                ]"#,
            )
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let query = QueryBuilder::new("Recipes")
            .moderation(ModerationState::Approved)
            .build();
        let documents = store.run_query(&query).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "abc123");
        assert_eq!(documents[0].fields["name"], json!("Cranberry Salsa"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_result_set() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", format!("{}:runQuery", DOCUMENTS).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"readTime": "2024-11-27T10:00:00Z"}]"#)
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let documents = store
            .run_query(&QueryBuilder::new("Recipes").build())
            .await
            .unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_nameless_result_is_skipped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", format!("{}:runQuery", DOCUMENTS).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "document": {
                            "fields": { "name": {"stringValue": "Orphan"} }
                        }
                    },
                    {
                        "document": {
                            "name": "projects/demo/databases/(default)/documents/Recipes/kept1",
                            "fields": { "name": {"stringValue": "Lemonade"} }
                        }
                    }
                ]"#,
            )
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let documents = store
            .run_query(&QueryBuilder::new("Recipes").build())
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "kept1");
    }

    #[tokio::test]
    async fn test_create_returns_assigned_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", format!("{}/Recipes", DOCUMENTS).as_str())
            .match_body(Matcher::PartialJson(json!({
                "fields": { "approved": { "booleanValue": false } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "projects/demo/databases/(default)/documents/Recipes/newId42"}"#)
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let fields = json!({"name": "Cranberry Salsa", "approved": false});
        let id = store
            .create("Recipes", fields.as_object().cloned().unwrap())
            .await
            .unwrap();

        assert_eq!(id, "newId42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_of_missing_document_is_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "PATCH",
                Matcher::Regex(r"/documents/Recipes/ghost(\?.*)?$".to_string()),
            )
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("updateMask.fieldPaths".into(), "approved".into()),
                Matcher::UrlEncoded("currentDocument.exists".into(), "true".into()),
            ]))
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 404, "message": "No document to update", "status": "NOT_FOUND"}}"#)
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let fields = json!({"approved": true});
        let result = store
            .update("Recipes", "ghost", fields.as_object().cloned().unwrap())
            .await;

        assert!(matches!(result, Err(StoreError::NotFound(target)) if target == "Recipes/ghost"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_message_is_passed_through() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock(
                "DELETE",
                Matcher::Regex(r"/documents/Recipes/abc123(\?.*)?$".to_string()),
            )
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}"#)
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        let result = store.delete("Recipes", "abc123").await;

        match result {
            Err(StoreError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authorized_requests_carry_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"/documents/users/uid-1(\?.*)?$".to_string()),
            )
            .match_header("authorization", "Bearer token-abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "projects/demo/databases/(default)/documents/users/uid-1", "fields": {"username": {"stringValue": "faruk"}}}"#)
            .create_async()
            .await;

        let store = FirestoreStore::with_base_url(&server.url(), "demo");
        store.authorize(Some("token-abc".to_string()));
        let document = store.get("users", "uid-1").await.unwrap();

        assert_eq!(document.fields["username"], json!("faruk"));
        mock.assert_async().await;
    }

    #[test]
    fn test_new_requires_project_id() {
        let result = FirestoreStore::new(&BackendConfig::default(), None);
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
