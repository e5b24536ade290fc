#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use bytes::Bytes;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use movies::application::{
    auth::{Claims, JwtVerifier},
    query::StructuredQuery,
    search::{SearchError, SearchGateway},
};
use movies::cache::{CacheConfig, CacheError, CacheKey, CacheStore, MemoryCacheStore};
use movies::domain::{entities::RawRecord, types::EntityKind};
use movies::infra::http::HttpState;

pub const SECRET: &[u8] = b"integration-flush-secret";
pub const TTL: Duration = Duration::from_secs(300);

/// In-memory search backend that evaluates the subset of the query DSL the
/// catalog emits: `from`/`size`, `multi_match`, nested id terms and one sort key.
#[derive(Default)]
pub struct FakeGateway {
    docs: Mutex<HashMap<EntityKind, Vec<Value>>>,
    lookups: AtomicUsize,
    searches: AtomicUsize,
    failing: AtomicBool,
}

impl FakeGateway {
    pub fn insert(&self, kind: EntityKind, doc: Value) {
        let mut docs = self.docs.lock().expect("docs lock");
        docs.entry(kind).or_default().push(doc);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.lookups() + self.searches()
    }

    fn check_available(&self) -> Result<(), SearchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SearchError::transport("connection refused"));
        }
        Ok(())
    }

    fn documents(&self, kind: EntityKind) -> Vec<Value> {
        let docs = self.docs.lock().expect("docs lock");
        docs.get(&kind).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl SearchGateway for FakeGateway {
    async fn get_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<RawRecord>, SearchError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        self.documents(kind)
            .into_iter()
            .find(|doc| doc["id"] == id)
            .map(|doc| RawRecord::decode(kind, doc).map_err(|err| SearchError::decode(kind, err)))
            .transpose()
    }

    async fn search(
        &self,
        kind: EntityKind,
        query: &StructuredQuery,
    ) -> Result<Option<Vec<RawRecord>>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let body = query.body();
        let mut hits: Vec<Value> = self
            .documents(kind)
            .into_iter()
            .filter(|doc| matches_query(doc, &body["query"]))
            .collect();

        if let Some((field, descending)) = sort_key(&body["sort"]) {
            hits.sort_by(|a, b| {
                let (a, b) = (a[&field].as_f64().unwrap_or(0.0), b[&field].as_f64().unwrap_or(0.0));
                let ordering = a.total_cmp(&b);
                if descending { ordering.reverse() } else { ordering }
            });
        }

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let page: Vec<RawRecord> = hits
            .into_iter()
            .skip(from)
            .take(size)
            .map(|doc| RawRecord::decode(kind, doc).map_err(|err| SearchError::decode(kind, err)))
            .collect::<Result<_, _>>()?;

        Ok((!page.is_empty()).then_some(page))
    }

    async fn ping(&self) -> Result<(), SearchError> {
        self.check_available()
    }
}

fn matches_query(doc: &Value, query: &Value) -> bool {
    let bool_query = &query["bool"];
    let must = bool_query["must"].as_array().cloned().unwrap_or_default();
    let filter = bool_query["filter"].as_array().cloned().unwrap_or_default();
    must.iter().chain(filter.iter()).all(|clause| matches_clause(doc, clause))
}

fn matches_clause(doc: &Value, clause: &Value) -> bool {
    if clause.get("match_all").is_some() {
        return true;
    }
    if let Some(multi) = clause.get("multi_match") {
        let needle = multi["query"].as_str().unwrap_or_default().to_lowercase();
        let fields = multi["fields"].as_array().cloned().unwrap_or_default();
        return fields.iter().filter_map(Value::as_str).any(|field| {
            let name = field.split('^').next().unwrap_or(field);
            doc[name]
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
        });
    }
    if let Some(nested) = clause.get("nested") {
        let path = nested["path"].as_str().unwrap_or_default();
        let term_key = format!("{path}.id");
        let wanted = &nested["query"]["term"][&term_key];
        return doc[path]
            .as_array()
            .is_some_and(|items| items.iter().any(|item| &item["id"] == wanted));
    }
    if let Some(inner) = clause.get("bool") {
        let should = inner["should"].as_array().cloned().unwrap_or_default();
        return should.iter().any(|clause| matches_clause(doc, clause));
    }
    false
}

fn sort_key(sort: &Value) -> Option<(String, bool)> {
    let clause = sort.as_array()?.first()?.as_object()?;
    let (field, spec) = clause.iter().next()?;
    Some((field.clone(), spec["order"] == "desc"))
}

/// Cache store that refuses every operation.
pub struct UnavailableStore;

#[async_trait]
impl CacheStore for UnavailableStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &CacheKey, _payload: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

pub struct Harness {
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<MemoryCacheStore>,
    pub state: HttpState,
}

pub fn harness() -> Harness {
    let gateway = Arc::new(FakeGateway::default());
    let store = Arc::new(MemoryCacheStore::new(&CacheConfig::default()));
    let state = HttpState::new(
        gateway.clone(),
        store.clone(),
        Arc::new(JwtVerifier::new(SECRET, 0)),
        TTL,
    );
    Harness {
        gateway,
        store,
        state,
    }
}

pub fn film(id: &str, title: &str, rating: f64, genres: &[&str]) -> Value {
    let genre: Vec<Value> = genres
        .iter()
        .map(|id| json!({"id": id, "name": format!("genre-{id}")}))
        .collect();
    json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "imdb_rating": rating,
        "genre": genre,
        "actors": [],
        "writers": [],
        "director": [],
    })
}

pub fn film_with_actor(id: &str, title: &str, rating: f64, actor: &str) -> Value {
    let mut doc = film(id, title, rating, &[]);
    doc["actors"] = json!([{"id": actor, "name": "Actor"}]);
    doc
}

pub fn genre(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "description": format!("{name} films")})
}

pub fn person(id: &str, full_name: &str, film_ids: &[&str]) -> Value {
    json!({
        "id": id,
        "full_name": full_name,
        "roles": ["actor"],
        "film_ids": film_ids,
    })
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}

/// Token expiring `offset` seconds from now, signed with `secret`.
pub fn token(secret: &[u8], offset: i64) -> String {
    let claims = Claims {
        sub: Some("ops".to_string()),
        exp: (now() + offset) as u64,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .expect("encode token")
}
