//! Full list/contact lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every endpoint
//! builder over real HTTP through the default `ureq` transport. Validates
//! parameter encoding, envelope decoding and error mapping end-to-end.

use std::net::SocketAddr;

use chrono::{TimeZone, Utc};
use mock_server::DEFAULT_API_KEY;
use unisender_core::{Collection, Error, Language, UniSender};

/// Start the mock server on a background thread with its own runtime.
fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr, api_key: &str) -> UniSender {
    UniSender::builder(api_key)
        .base_url(&format!("http://{addr}"))
        .build()
        .unwrap()
}

#[test]
fn list_and_contact_lifecycle() {
    let addr = spawn_server();
    let client = client(addr, DEFAULT_API_KEY);

    // Step 1: no lists yet.
    let lists = client.get_lists().execute().unwrap();
    assert!(lists.is_empty(), "expected no lists");

    // Step 2: create a list.
    let created = client
        .create_list("Weekly digest")
        .after_subscribe_url("https://example.com/thanks")
        .execute()
        .unwrap();
    assert!(created.id > 0);
    let raw: Vec<serde_json::Value> = client.request().execute("getLists").unwrap();
    assert_eq!(raw[0]["after_subscribe_url"], "https://example.com/thanks");
    assert!(raw[0].get("before_subscribe_url").is_none());

    // Step 3: a duplicate title is rejected by the API.
    let err = client.create_list("Weekly digest").execute().unwrap_err();
    assert_eq!(err.api_code(), Some("invalid_arg"));

    // Step 4: import two contacts and one broken row.
    let subscribed_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let mut contacts = Collection::new();
    contacts
        .email("ann@example.com")
        .add_list_id(created.id, subscribed_at)
        .add_tag("vip")
        .set_field("Name", "Ann, Jr.")
        .unwrap();
    contacts.email("bob@example.com").set_field("Name", "Bob").unwrap();
    contacts.email("broken");

    let report = client
        .import_contacts(contacts)
        .field_names(["email", "email_list_ids", "email_subscribe_times", "tags", "Name"])
        .execute()
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.log.len(), 1);
    assert_eq!(report.log[0].index, 2);
    assert_eq!(report.log[0].code, "invalid_email");

    // Step 5: fetch the contact with lists and fields.
    let person = client
        .get_contact("ann@example.com")
        .include_lists()
        .include_fields()
        .include_details()
        .execute()
        .unwrap();
    assert_eq!(person.email.email, "ann@example.com");
    assert_eq!(person.email.status, "active");
    assert_eq!(person.email.lists.len(), 1);
    assert_eq!(person.email.lists[0].id, created.id);
    assert_eq!(person.email.lists[0].title, "Weekly digest");
    assert_eq!(person.email.lists[0].added_at, Some(subscribed_at));
    assert_eq!(person.email.fields["Name"], "Ann, Jr.");

    // Step 6: rename the list.
    client
        .update_list(created.id, "Monthly digest")
        .before_subscribe_url("https://example.com/confirm")
        .execute()
        .unwrap();
    let lists = client.get_lists().execute().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].title, "Monthly digest");
    let raw: Vec<serde_json::Value> = client.request().execute("getLists").unwrap();
    assert_eq!(raw[0]["before_subscribe_url"], "https://example.com/confirm");
    assert_eq!(raw[0]["after_subscribe_url"], "https://example.com/thanks");

    // Step 7: responses in another language still decode.
    client.set_language(Language::Ru);
    assert_eq!(client.get_lists().execute().unwrap().len(), 1);

    // Step 8: delete the list, then deleting again is not_found.
    client.delete_list(created.id).execute().unwrap();
    let err = client.delete_list(created.id).execute().unwrap_err();
    assert_eq!(err.api_code(), Some("not_found"));

    // Step 9: unknown contact.
    let err = client.get_contact("nobody@example.com").execute().unwrap_err();
    assert!(matches!(err, Error::Api { ref code, .. } if code == "not_found"));
}

#[test]
fn wrong_api_key_is_api_error() {
    let addr = spawn_server();
    let client = client(addr, "not-the-key");

    let err = client.get_lists().execute().unwrap_err();
    match err {
        Error::Api { code, message } => {
            assert_eq!(code, "invalid_api_key");
            assert_eq!(message, "AK100: Invalid api key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    client.set_api_key(DEFAULT_API_KEY).unwrap();
    assert!(client.get_lists().execute().unwrap().is_empty());
}

#[test]
fn unknown_route_is_http_error() {
    let addr = spawn_server();
    let client = UniSender::builder(DEFAULT_API_KEY)
        .base_url(&format!("http://{addr}/v2"))
        .build()
        .unwrap();

    let err = client.get_lists().execute().unwrap_err();
    assert!(matches!(err, Error::Http { status: 404, .. }), "got {err:?}");
}

#[test]
fn unreachable_server_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr, DEFAULT_API_KEY);

    let err = client.get_lists().execute().unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}
