//! Client configuration shared by every endpoint call.
//!
//! # Design
//! `UniSender` holds the API key, response language, base URL and transport
//! behind one `RwLock`. Starting a call takes the shared lock just long
//! enough to copy all four into a fresh `Request`, so an in-flight call
//! always sees one consistent snapshot. The setters take the exclusive lock.
//! The lock is never held across network I/O.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::contacts::{Collection, GetContactRequest, ImportContactsRequest};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::lists::{CreateListRequest, DeleteListRequest, GetListsRequest, UpdateListRequest};
use crate::request::Request;

pub const DEFAULT_BASE_URL: &str = "https://api.unisender.com";

/// Language the API answers in; also the first path segment of every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    En,
    Ru,
    Ua,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Ua => "ua",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ru" => Ok(Language::Ru),
            "ua" => Ok(Language::Ua),
            other => Err(Error::configuration(format!("unsupported language {other:?}"))),
        }
    }
}

struct Config {
    api_key: String,
    language: Language,
    base_url: String,
    transport: Arc<dyn Transport>,
}

/// Entry point to the API. Cheap to share across threads behind an `Arc`.
pub struct UniSender {
    config: RwLock<Config>,
}

impl UniSender {
    /// Client with the default `ureq` transport, English responses and the
    /// public API endpoint.
    #[cfg(feature = "ureq")]
    pub fn new(api_key: &str) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: &str) -> UniSenderBuilder {
        UniSenderBuilder {
            api_key: api_key.to_string(),
            language: Language::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: None,
        }
    }

    pub fn set_language(&self, language: Language) {
        self.write().language = language;
        debug!(%language, "response language changed");
    }

    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        self.write().transport = transport;
        debug!("transport replaced");
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<()> {
        validate_api_key(api_key)?;
        self.write().api_key = api_key.to_string();
        debug!("api key replaced");
        Ok(())
    }

    /// Replace API key and language together, so no call can start with
    /// one from the old configuration and the other from the new one.
    pub fn reconfigure(&self, api_key: &str, language: Language) -> Result<()> {
        validate_api_key(api_key)?;
        let mut config = self.write();
        config.api_key = api_key.to_string();
        config.language = language;
        drop(config);
        debug!(%language, "api key and language replaced");
        Ok(())
    }

    pub fn language(&self) -> Language {
        self.read().language
    }

    pub fn base_url(&self) -> String {
        self.read().base_url.clone()
    }

    /// Start a raw call with `api_key` and `format` already set. Endpoint
    /// builders use this; it is public for methods that have no builder.
    pub fn request(&self) -> Request {
        let config = self.read();
        let mut request = Request::new(
            Arc::clone(&config.transport),
            &config.base_url,
            config.language,
        );
        request
            .add("api_key", config.api_key.as_str())
            .add("format", "json");
        request
    }

    pub fn get_contact(&self, email: &str) -> GetContactRequest {
        GetContactRequest::new(self.request(), email)
    }

    pub fn import_contacts(&self, collection: Collection) -> ImportContactsRequest {
        ImportContactsRequest::new(self.request(), collection)
    }

    pub fn get_lists(&self) -> GetListsRequest {
        GetListsRequest::new(self.request())
    }

    pub fn create_list(&self, title: &str) -> CreateListRequest {
        CreateListRequest::new(self.request(), title)
    }

    pub fn update_list(&self, list_id: i64, title: &str) -> UpdateListRequest {
        UpdateListRequest::new(self.request(), list_id, title)
    }

    pub fn delete_list(&self, list_id: i64) -> DeleteListRequest {
        DeleteListRequest::new(self.request(), list_id)
    }

    fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for UniSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.read();
        f.debug_struct("UniSender")
            .field("language", &config.language)
            .field("base_url", &config.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for `UniSender`.
pub struct UniSenderBuilder {
    api_key: String,
    language: Language,
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
}

impl UniSenderBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Override the API host, e.g. to point at a mock server.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<UniSender> {
        validate_api_key(&self.api_key)?;
        if self.base_url.is_empty() {
            return Err(Error::configuration("base URL must not be empty"));
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        Ok(UniSender {
            config: RwLock::new(Config {
                api_key: self.api_key,
                language: self.language,
                base_url: self.base_url,
                transport,
            }),
        })
    }
}

impl fmt::Debug for UniSenderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniSenderBuilder")
            .field("language", &self.language)
            .field("base_url", &self.base_url)
            .field("has_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

fn validate_api_key(api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::configuration("API key must not be empty"));
    }
    Ok(())
}

#[cfg(feature = "ureq")]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::http::UreqTransport::new()))
}

#[cfg(not(feature = "ureq"))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Err(Error::configuration(
        "no transport configured and the `ureq` feature is disabled",
    ))
}
