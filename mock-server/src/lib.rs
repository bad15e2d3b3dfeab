use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const DEFAULT_API_KEY: &str = "test-api-key";

const LANGUAGES: [&str; 3] = ["en", "ru", "ua"];
const SUBSCRIBE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, Serialize)]
pub struct MailList {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_subscribe_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_subscribe_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StoredContact {
    pub email: String,
    pub added_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub lists: Vec<(i64, DateTime<Utc>)>,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct Store {
    api_key: String,
    next_list_id: i64,
    pub lists: BTreeMap<i64, MailList>,
    pub contacts: BTreeMap<String, StoredContact>,
}

impl Store {
    fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            next_list_id: 1,
            lists: BTreeMap::new(),
            contacts: BTreeMap::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// API failure rendered as `{"error": message, "code": code}` with HTTP 200,
/// the way the real service reports it.
#[derive(Debug)]
struct Failure {
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

type Outcome = Result<Value, Failure>;

struct Params(Vec<(String, String)>);

impl Params {
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("1")
    }

    fn required(&self, name: &str) -> Result<&str, Failure> {
        match self.get(name) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(Failure::new("invalid_arg", format!("parameter {name} is required"))),
        }
    }

    fn list_id(&self) -> Result<i64, Failure> {
        self.required("list_id")?
            .parse()
            .map_err(|_| Failure::new("invalid_arg", "list_id must be an integer"))
    }

    /// Rows of `data[i][field]` keyed by row index, fields in wire order.
    fn rows(&self) -> BTreeMap<usize, Vec<(String, String)>> {
        let mut rows: BTreeMap<usize, Vec<(String, String)>> = BTreeMap::new();
        for (key, value) in &self.0 {
            let Some(rest) = key.strip_prefix("data[") else {
                continue;
            };
            let Some((index, rest)) = rest.split_once("][") else {
                continue;
            };
            let (Ok(index), Some(field)) = (index.parse::<usize>(), rest.strip_suffix(']')) else {
                continue;
            };
            rows.entry(index)
                .or_default()
                .push((field.to_string(), value.clone()));
        }
        rows
    }
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(api_key)));
    Router::new()
        .route("/{lang}/api/{method}", post(dispatch))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock UniSender API listening");
    }
    axum::serve(listener, app()).await
}

async fn dispatch(
    State(db): State<Db>,
    Path((lang, method)): Path<(String, String)>,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    if !LANGUAGES.contains(&lang.as_str()) {
        return (StatusCode::NOT_FOUND, format!("unknown language {lang}")).into_response();
    }
    let params = Params(params);
    debug!(%method, %lang, params = params.0.len(), "mock API call");

    let mut store = db.write().await;
    let outcome = if params.get("api_key") != Some(store.api_key.as_str()) {
        Err(Failure::new("invalid_api_key", "AK100: Invalid api key"))
    } else if params.get("format") != Some("json") {
        Err(Failure::new("invalid_arg", "format must be json"))
    } else {
        match method.as_str() {
            "getLists" => Ok(get_lists(&store)),
            "createList" => create_list(&mut store, &params),
            "updateList" => update_list(&mut store, &params),
            "deleteList" => delete_list(&mut store, &params),
            "importContacts" => import_contacts(&mut store, &params),
            "getContact" => get_contact(&store, &params),
            other => Err(Failure::new("unknown_method", format!("unknown method {other}"))),
        }
    };

    let body = match outcome {
        Ok(result) => json!({ "result": result }),
        Err(failure) => json!({ "error": failure.message, "code": failure.code }),
    };
    Json(body).into_response()
}

fn get_lists(store: &Store) -> Value {
    json!(store.lists.values().collect::<Vec<_>>())
}

fn create_list(store: &mut Store, params: &Params) -> Outcome {
    let title = params.required("title")?;
    if store.lists.values().any(|l| l.title == title) {
        return Err(Failure::new("invalid_arg", format!("list {title} already exists")));
    }
    let id = store.next_list_id;
    store.next_list_id += 1;
    store.lists.insert(
        id,
        MailList {
            id,
            title: title.to_string(),
            before_subscribe_url: params.get("before_subscribe_url").map(str::to_string),
            after_subscribe_url: params.get("after_subscribe_url").map(str::to_string),
        },
    );
    Ok(json!({ "id": id }))
}

fn update_list(store: &mut Store, params: &Params) -> Outcome {
    let id = params.list_id()?;
    let title = params.required("title")?.to_string();
    let list = store
        .lists
        .get_mut(&id)
        .ok_or_else(|| Failure::new("not_found", format!("list {id} not found")))?;
    list.title = title;
    if let Some(url) = params.get("before_subscribe_url") {
        list.before_subscribe_url = Some(url.to_string());
    }
    if let Some(url) = params.get("after_subscribe_url") {
        list.after_subscribe_url = Some(url.to_string());
    }
    Ok(json!({}))
}

fn delete_list(store: &mut Store, params: &Params) -> Outcome {
    let id = params.list_id()?;
    store
        .lists
        .remove(&id)
        .ok_or_else(|| Failure::new("not_found", format!("list {id} not found")))?;
    for contact in store.contacts.values_mut() {
        contact.lists.retain(|(list_id, _)| *list_id != id);
    }
    Ok(json!({}))
}

#[derive(Debug, Default, Serialize)]
struct ImportReport {
    total: u64,
    inserted: u64,
    updated: u64,
    deleted: u64,
    new_emails: u64,
    invalid: u64,
    log: Vec<Value>,
}

fn import_contacts(store: &mut Store, params: &Params) -> Outcome {
    let field_names: Option<Vec<&str>> = params.get("field_names").map(|v| v.split(',').collect());
    let overwrite_tags = params.flag("overwrite_tags");
    let overwrite_lists = params.flag("overwrite_lists");
    let mut report = ImportReport::default();

    for (index, fields) in params.rows() {
        report.total += 1;
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .filter(|(name, _)| {
                field_names
                    .as_ref()
                    .map_or(true, |names| names.contains(&name.as_str()))
            })
            .collect();

        let email = fields.get("email").cloned().unwrap_or_default();
        if !email.contains('@') {
            report.invalid += 1;
            report.log.push(json!({
                "index": index,
                "code": "invalid_email",
                "message": format!("invalid email {email:?}"),
            }));
            continue;
        }

        if fields.get("delete").map(String::as_str) == Some("1") {
            if store.contacts.remove(&email).is_some() {
                report.deleted += 1;
            }
            continue;
        }

        let memberships = match parse_memberships(&fields, &store.lists) {
            Ok(memberships) => memberships,
            Err(message) => {
                report.invalid += 1;
                report.log.push(json!({ "index": index, "code": "invalid_arg", "message": message }));
                continue;
            }
        };
        let tags: Vec<String> = fields
            .get("tags")
            .map(|t| t.split(',').map(str::to_string).collect())
            .unwrap_or_default();
        let custom: BTreeMap<String, String> = fields
            .iter()
            .filter(|(name, _)| {
                !matches!(
                    name.as_str(),
                    "email" | "email_list_ids" | "email_subscribe_times" | "tags" | "delete"
                )
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        match store.contacts.get_mut(&email) {
            Some(contact) => {
                report.updated += 1;
                if overwrite_tags {
                    contact.tags = tags;
                } else {
                    contact.tags.extend(tags);
                }
                if overwrite_lists {
                    contact.lists = memberships;
                } else {
                    for (id, at) in memberships {
                        if !contact.lists.iter().any(|(existing, _)| *existing == id) {
                            contact.lists.push((id, at));
                        }
                    }
                }
                contact.fields.extend(custom);
            }
            None => {
                report.inserted += 1;
                report.new_emails += 1;
                store.contacts.insert(
                    email.clone(),
                    StoredContact {
                        email,
                        added_at: Utc::now(),
                        tags,
                        lists: memberships,
                        fields: custom,
                    },
                );
            }
        }
    }

    Ok(json!(report))
}

fn parse_memberships(
    fields: &BTreeMap<String, String>,
    lists: &BTreeMap<i64, MailList>,
) -> Result<Vec<(i64, DateTime<Utc>)>, String> {
    let Some(ids) = fields.get("email_list_ids") else {
        return Ok(Vec::new());
    };
    let times: Vec<&str> = fields
        .get("email_subscribe_times")
        .map(|t| t.split(',').collect())
        .unwrap_or_default();

    let mut memberships = Vec::new();
    for (position, raw) in ids.split(',').enumerate() {
        let id: i64 = raw
            .parse()
            .map_err(|_| format!("list id {raw:?} is not an integer"))?;
        if !lists.contains_key(&id) {
            return Err(format!("list {id} not found"));
        }
        let at = match times.get(position) {
            Some(t) => NaiveDateTime::parse_from_str(t, SUBSCRIBE_TIME_FORMAT)
                .map_err(|_| format!("bad subscribe time {t:?}"))?
                .and_utc(),
            None => Utc::now(),
        };
        memberships.push((id, at));
    }
    Ok(memberships)
}

fn get_contact(store: &Store, params: &Params) -> Outcome {
    let email = params.required("email")?;
    let contact = store
        .contacts
        .get(email)
        .ok_or_else(|| Failure::new("not_found", format!("contact {email} not found")))?;

    let mut person = json!({
        "email": contact.email,
        "added_at": contact.added_at,
        "status": "active",
        "availability": "available",
    });
    if params.flag("include_lists") {
        let lists: Vec<Value> = contact
            .lists
            .iter()
            .filter_map(|(id, at)| {
                store
                    .lists
                    .get(id)
                    .map(|l| json!({ "id": l.id, "title": l.title, "added_at": at }))
            })
            .collect();
        person["lists"] = json!(lists);
    }
    if params.flag("include_fields") {
        person["fields"] = json!(contact.fields);
    }
    if params.flag("include_details") {
        person["rating"] = json!(0.0);
    }
    Ok(json!({ "email": person }))
}
