//! Parameter accumulation and execution of one API call.
//!
//! # Design
//! A `Request` is created from a snapshot of the client configuration and is
//! owned by exactly one endpoint builder, so it needs no locking. Mutators
//! return `&mut Self` for chaining and never touch the network. `execute`
//! encodes the parameters, makes exactly one transport call and decodes the
//! envelope; nothing is retried or cached.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::client::Language;
use crate::envelope;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, Transport};
use crate::params::{self, ParamValue, Record};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const API_KEY_PARAM: &str = "api_key";

/// Accumulated parameters for a single call, plus where and how to send it.
pub struct Request {
    transport: Arc<dyn Transport>,
    base_url: String,
    language: Language,
    params: IndexMap<String, ParamValue>,
}

impl Request {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, language: Language) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            params: IndexMap::new(),
        }
    }

    /// Set a parameter. A later call with the same name replaces the value
    /// but keeps the parameter's original position.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set a list parameter, replacing any previous value.
    pub fn add_list<I, S>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.add(name, ParamValue::List(values))
    }

    /// Set a record collection parameter, replacing any previous value.
    pub fn add_records(&mut self, name: impl Into<String>, records: Vec<Record>) -> &mut Self {
        self.add(name, ParamValue::Records(records))
    }

    /// Append one element to a list parameter. A scalar already stored under
    /// `name` becomes the first element. A record collection stored under
    /// `name` is discarded and replaced by a one-element list, keeping its
    /// position.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        let entry = self
            .params
            .entry(name.into())
            .or_insert_with(|| ParamValue::List(Vec::new()));
        match entry {
            ParamValue::List(values) => values.push(value),
            ParamValue::Scalar(first) => {
                let first = std::mem::take(first);
                *entry = ParamValue::List(vec![first, value]);
            }
            ParamValue::Records(_) => *entry = ParamValue::List(vec![value]),
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.params.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encode all parameters into ordered form pairs.
    pub fn encode(&self) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::with_capacity(self.params.len());
        for (name, value) in &self.params {
            params::encode_into(name, value, &mut pairs)?;
        }
        Ok(pairs)
    }

    /// Build the HTTP request for `method` without sending it.
    pub fn build(&self, method: &str) -> Result<HttpRequest> {
        if method.is_empty() || method.contains('/') {
            return Err(Error::configuration(format!(
                "invalid API method name {method:?}"
            )));
        }

        let pairs = self.encode()?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&pairs)
            .finish();
        trace!(method, body_len = body.len(), "encoded request body");

        Ok(HttpRequest {
            url: format!("{}/{}/api/{}", self.base_url, self.language, method),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
        })
    }

    /// Send the call and decode its `result` into `T`.
    pub fn execute<T: DeserializeOwned>(&self, method: &str) -> Result<T> {
        let request = self.build(method)?;

        debug!(method, params = self.params.len(), language = %self.language, "dispatching API call");
        let response = self.transport.send(request).map_err(Error::Transport)?;
        debug!(method, status = response.status, "API call completed");

        if !response.is_success() {
            warn!(method, status = response.status, "API call returned non-success status");
            return Err(Error::Http {
                status: response.status,
                body: response.body,
            });
        }

        let decoded = envelope::decode(&response.body);
        if let Err(Error::Api { code, message }) = &decoded {
            warn!(method, %code, %message, "API rejected call");
        }
        decoded
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<(&str, &ParamValue)> = self
            .params
            .iter()
            .filter(|(name, _)| name.as_str() != API_KEY_PARAM)
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        f.debug_struct("Request")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("params", &params)
            .finish_non_exhaustive()
    }
}
