//! Blocking client for the UniSender email-marketing API.
//!
//! # Overview
//! Endpoint builders (`get_contact`, `import_contacts`, `get_lists`, ...)
//! collect parameters on a `Request`, which form-encodes them, POSTs to
//! `<base>/<lang>/api/<method>` through an injected `Transport`, and decodes
//! the JSON envelope into a typed result or an `Error`.
//!
//! # Design
//! - `UniSender` keeps API key, language, base URL and transport under a
//!   reader/writer lock; each call starts from a consistent snapshot.
//! - Parameters are scalars, comma-joined lists or record collections
//!   flattened to `name[i][field]`, always in insertion order.
//! - One `execute` is one transport call. No retries, caching or pooling.
//!
//! ```no_run
//! use unisender_core::{Collection, UniSender};
//!
//! # fn main() -> unisender_core::Result<()> {
//! let client = UniSender::new("api-key")?;
//! let lists = client.get_lists().execute()?;
//!
//! let mut contacts = Collection::new();
//! contacts.email("a@example.com").add_list_id(lists[0].id, chrono::Utc::now());
//! let report = client
//!     .import_contacts(contacts)
//!     .field_names(["email", "email_list_ids", "email_subscribe_times"])
//!     .execute()?;
//! println!("inserted {}", report.inserted);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod contacts;
pub mod envelope;
pub mod error;
pub mod http;
pub mod lists;
pub mod params;
pub mod request;
pub mod types;

pub use client::{Language, UniSender, UniSenderBuilder, DEFAULT_BASE_URL};
pub use contacts::{Collection, Contact, GetContactRequest, ImportContactsRequest};
pub use error::{BoxError, Error, Result};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use lists::{CreateListRequest, DeleteListRequest, GetListsRequest, UpdateListRequest};
pub use params::{ParamValue, Record, LIST_DELIMITER};
pub use request::Request;
pub use types::{
    CreateListResponse, ImportContactsLogMessage, ImportContactsResponse, List, Person,
    PersonEmail, PersonList,
};
