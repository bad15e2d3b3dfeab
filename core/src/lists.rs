//! Mailing list endpoints.

use serde::de::IgnoredAny;

use crate::error::Result;
use crate::request::Request;
use crate::types::{CreateListResponse, List};

/// Returns all lists of the account.
///
/// See <https://www.unisender.com/en/support/api/partners/getlists/>
#[derive(Debug)]
pub struct GetListsRequest {
    request: Request,
}

impl GetListsRequest {
    pub(crate) fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn execute(self) -> Result<Vec<List>> {
        self.request.execute("getLists")
    }
}

/// Creates a new list.
///
/// See <https://www.unisender.com/en/support/api/partners/createlist/>
#[derive(Debug)]
pub struct CreateListRequest {
    request: Request,
}

impl CreateListRequest {
    pub(crate) fn new(mut request: Request, title: &str) -> Self {
        request.add("title", title);
        Self { request }
    }

    /// Page shown to the subscriber before the subscription is confirmed.
    pub fn before_subscribe_url(mut self, url: &str) -> Self {
        self.request.add("before_subscribe_url", url);
        self
    }

    /// Page shown to the subscriber after the subscription is confirmed.
    pub fn after_subscribe_url(mut self, url: &str) -> Self {
        self.request.add("after_subscribe_url", url);
        self
    }

    pub fn execute(self) -> Result<CreateListResponse> {
        self.request.execute("createList")
    }
}

/// Renames a list or changes its subscription pages.
#[derive(Debug)]
pub struct UpdateListRequest {
    request: Request,
}

impl UpdateListRequest {
    pub(crate) fn new(mut request: Request, list_id: i64, title: &str) -> Self {
        request
            .add("list_id", list_id.to_string())
            .add("title", title);
        Self { request }
    }

    pub fn before_subscribe_url(mut self, url: &str) -> Self {
        self.request.add("before_subscribe_url", url);
        self
    }

    pub fn after_subscribe_url(mut self, url: &str) -> Self {
        self.request.add("after_subscribe_url", url);
        self
    }

    pub fn execute(self) -> Result<()> {
        let _: IgnoredAny = self.request.execute("updateList")?;
        Ok(())
    }
}

/// Deletes a list.
#[derive(Debug)]
pub struct DeleteListRequest {
    request: Request,
}

impl DeleteListRequest {
    pub(crate) fn new(mut request: Request, list_id: i64) -> Self {
        request.add("list_id", list_id.to_string());
        Self { request }
    }

    pub fn execute(self) -> Result<()> {
        let _: IgnoredAny = self.request.execute("deleteList")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::client::UniSender;
    use crate::error::{BoxError, Error};
    use crate::http::{HttpRequest, HttpResponse, Transport};

    fn client(body: &'static str) -> (UniSender, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let transport: Arc<dyn Transport> = Arc::new(
            move |req: HttpRequest| -> std::result::Result<HttpResponse, BoxError> {
                sink.lock().unwrap().push(req);
                Ok(HttpResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: body.to_string(),
                })
            },
        );
        let client = UniSender::builder("key")
            .base_url("http://localhost")
            .transport(transport)
            .build()
            .unwrap();
        (client, seen)
    }

    fn body(req: &HttpRequest) -> String {
        req.body.clone().unwrap_or_default()
    }

    #[test]
    fn get_lists_decodes_sequence() {
        let (client, seen) = client(r#"{"result": [{"id": 1, "title": "News"}, {"id": 2, "title": "Offers"}]}"#);
        let lists = client.get_lists().execute().unwrap();
        assert_eq!(
            lists,
            vec![
                List { id: 1, title: "News".to_string() },
                List { id: 2, title: "Offers".to_string() },
            ]
        );
        assert_eq!(seen.lock().unwrap()[0].url, "http://localhost/en/api/getLists");
    }

    #[test]
    fn create_list_sends_title_and_urls() {
        let (client, seen) = client(r#"{"result": {"id": 42}}"#);
        let created = client
            .create_list("Weekly digest")
            .before_subscribe_url("https://example.com/before")
            .after_subscribe_url("https://example.com/after")
            .execute()
            .unwrap();
        assert_eq!(created.id, 42);

        let seen = seen.lock().unwrap();
        let body = body(&seen[0]);
        assert!(body.contains("title=Weekly+digest"));
        assert!(body.contains("before_subscribe_url=https%3A%2F%2Fexample.com%2Fbefore"));
        assert!(body.contains("after_subscribe_url=https%3A%2F%2Fexample.com%2Fafter"));
    }

    #[test]
    fn update_list_ignores_result_payload() {
        let (client, seen) = client(r#"{"result": {}}"#);
        client.update_list(7, "Renamed").execute().unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].url, "http://localhost/en/api/updateList");
        assert!(body(&seen[0]).contains("list_id=7"));
    }

    #[test]
    fn delete_list_surfaces_api_error() {
        let (client, _) = client(r#"{"error": "list not found", "code": "not_found"}"#);
        let err = client.delete_list(99).execute().unwrap_err();
        assert!(matches!(err, Error::Api { ref code, .. } if code == "not_found"));
    }
}
