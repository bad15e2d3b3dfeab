//! Contact endpoints: `getContact` and `importContacts`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::params::{ParamValue, Record};
use crate::request::Request;
use crate::types::{ImportContactsResponse, Person};

const SUBSCRIBE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BUILTIN_COLUMNS: [&str; 4] = ["email", "email_list_ids", "email_subscribe_times", "tags"];

/// Fetches a single contact by email address.
///
/// See <https://www.unisender.com/en/support/api/contacts/getcontact/>
#[derive(Debug)]
pub struct GetContactRequest {
    request: Request,
}

impl GetContactRequest {
    pub(crate) fn new(mut request: Request, email: &str) -> Self {
        request.add("email", email);
        Self { request }
    }

    /// Include the contact's list memberships.
    pub fn include_lists(mut self) -> Self {
        self.request.add("include_lists", "1");
        self
    }

    /// Include additional field values.
    pub fn include_fields(mut self) -> Self {
        self.request.add("include_fields", "1");
        self
    }

    /// Include delivery and engagement details.
    pub fn include_details(mut self) -> Self {
        self.request.add("include_details", "1");
        self
    }

    pub fn execute(self) -> Result<Person> {
        self.request.execute("getContact")
    }
}

/// One contact row of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    email: String,
    lists: Vec<(i64, DateTime<Utc>)>,
    tags: Vec<String>,
    fields: IndexMap<String, String>,
}

impl Contact {
    fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Subscribe the contact to a list. The subscription time is supplied by
    /// the caller and sent as UTC.
    pub fn add_list_id(&mut self, list_id: i64, subscribed_at: DateTime<Utc>) -> &mut Self {
        self.lists.push((list_id, subscribed_at));
        self
    }

    pub fn add_tag(&mut self, tag: &str) -> &mut Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Set an additional field. The built-in columns (`email`,
    /// `email_list_ids`, `email_subscribe_times`, `tags`) have their own
    /// setters and are rejected here.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        if BUILTIN_COLUMNS.contains(&name) {
            return Err(Error::configuration(format!(
                "{name:?} is a built-in contact column, not a custom field"
            )));
        }
        self.fields.insert(name.to_string(), value.to_string());
        Ok(self)
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.set("email", self.email.as_str());
        record.set(
            "email_list_ids",
            ParamValue::List(self.lists.iter().map(|(id, _)| id.to_string()).collect()),
        );
        record.set(
            "email_subscribe_times",
            ParamValue::List(
                self.lists
                    .iter()
                    .map(|(_, at)| at.format(SUBSCRIBE_TIME_FORMAT).to_string())
                    .collect(),
            ),
        );
        record.set("tags", ParamValue::List(self.tags.clone()));
        for (name, value) in &self.fields {
            record.set(name.as_str(), value.as_str());
        }
        record
    }
}

/// Ordered set of contacts for `importContacts`, unique by email address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    contacts: Vec<Contact>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact row for `address`, appended if it is not in the collection yet.
    pub fn email(&mut self, address: &str) -> &mut Contact {
        let index = match self.contacts.iter().position(|c| c.email == address) {
            Some(index) => index,
            None => {
                self.contacts.push(Contact::new(address));
                self.contacts.len() - 1
            }
        };
        &mut self.contacts[index]
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn records(&self) -> Vec<Record> {
        self.contacts.iter().map(Contact::to_record).collect()
    }
}

/// Bulk import of contacts, sent as `data[i][field]` rows.
///
/// See <https://www.unisender.com/en/support/api/contacts/importcontacts/>
#[derive(Debug)]
pub struct ImportContactsRequest {
    request: Request,
}

impl ImportContactsRequest {
    pub(crate) fn new(mut request: Request, collection: Collection) -> Self {
        request.add_records("data", collection.records());
        Self { request }
    }

    /// Columns the import covers. Omitted from the call when empty.
    pub fn field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.add_list("field_names", names);
        self
    }

    /// Replace existing tags instead of adding to them.
    pub fn overwrite_tags(mut self) -> Self {
        self.request.add("overwrite_tags", "1");
        self
    }

    /// Replace existing list memberships instead of adding to them.
    pub fn overwrite_lists(mut self) -> Self {
        self.request.add("overwrite_lists", "1");
        self
    }

    pub fn execute(self) -> Result<ImportContactsResponse> {
        self.request.execute("importContacts")
    }
}
