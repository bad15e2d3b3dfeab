//! Result types returned by the endpoint builders.
//!
//! # Design
//! These are plain records decoded fresh per call. Every field is
//! defaultable so a payload that omits optional parts (lists, fields,
//! delivery timestamps) still decodes. The mock-server defines its own
//! copies; integration tests catch drift between the two.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mailing list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct List {
    pub id: i64,
    pub title: String,
}

/// A contact's membership in a mailing list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonList {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// Delivery and engagement state of a contact's email address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonEmail {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    pub status: String,
    pub availability: String,
    #[serde(rename = "last_send_datetime", skip_serializing_if = "Option::is_none")]
    pub last_send: Option<DateTime<Utc>>,
    #[serde(rename = "last_delivery_datetime", skip_serializing_if = "Option::is_none")]
    pub last_delivery: Option<DateTime<Utc>>,
    #[serde(rename = "last_read_datetime", skip_serializing_if = "Option::is_none")]
    pub last_read: Option<DateTime<Utc>>,
    #[serde(rename = "last_click_datetime", skip_serializing_if = "Option::is_none")]
    pub last_click: Option<DateTime<Utc>>,
    pub rating: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<PersonList>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// A contact as returned by `getContact`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub email: PersonEmail,
}

/// Result of `createList`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateListResponse {
    pub id: i64,
}

/// Per-row message in an import report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportContactsLogMessage {
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Result of `importContacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportContactsResponse {
    pub total: u64,
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub new_emails: u64,
    pub invalid: u64,
    pub log: Vec<ImportContactsLogMessage>,
}
