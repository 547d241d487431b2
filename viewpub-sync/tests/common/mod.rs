//! Stub S3-compatible bucket built on the shared HTTP stub.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub use viewpub_testkit::{init_logging, RecordedRequest, StubResponse, StubServer};

pub type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

/// A stub S3-compatible bucket with a public read path.
///
/// `PUT <put_prefix><name>` stores an object and answers with an ETag;
/// `GET /views/<name>` serves it. Any `PUT` whose name is in `fail_puts`
/// answers 500 and stores nothing.
pub fn bucket_server(put_prefix: &str, fail_puts: &[&str]) -> (StubServer, Objects) {
    let objects: Objects = Arc::new(Mutex::new(HashMap::new()));
    let store = Arc::clone(&objects);
    let put_prefix = put_prefix.to_string();
    let failing: Vec<String> = fail_puts.iter().map(|s| s.to_string()).collect();

    let server = StubServer::spawn(move |req| {
        if req.method == "PUT" {
            let Some(name) = req.path.strip_prefix(&put_prefix) else {
                return StubResponse::status(404);
            };
            if failing.iter().any(|f| f == name) {
                return StubResponse::status(500);
            }
            store
                .lock()
                .expect("objects")
                .insert(name.to_string(), req.body.clone());
            return StubResponse::status(200).with_header("etag", "\"stub-etag\"");
        }
        let Some(name) = req.path.strip_prefix("/views/") else {
            return StubResponse::status(404);
        };
        match store.lock().expect("objects").get(name) {
            Some(body) => StubResponse {
                status: 200,
                content_type: Some("application/json".to_string()),
                headers: Vec::new(),
                body: body.clone(),
            },
            None => StubResponse::status(404),
        }
    });
    (server, objects)
}
