use vein::http::request::{Method, Request, RequestBuilder};
use std::collections::HashMap;

fn get(path: &str, headers: &[(&str, &str)]) -> Request {
    let mut map = HashMap::new();
    for (k, v) in headers {
        map.insert(k.to_string(), v.to_string());
    }

    Request {
        method: Method::GET,
        path: path.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: map,
        body: vec![],
    }
}

#[test]
fn test_request_header_retrieval_ignores_case() {
    let req = get("/", &[("Host", "example.com")]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("host"), Some("example.com"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    assert_eq!(get("/", &[("Content-Length", "42")]).content_length(), 42);
    assert_eq!(get("/", &[]).content_length(), 0);
    assert_eq!(get("/", &[("Content-Length", "not-a-number")]).content_length(), 0);
}

#[test]
fn test_request_keep_alive_http11_default() {
    assert!(get("/", &[]).keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    assert!(!get("/", &[("Connection", "close")]).keep_alive());
}

#[test]
fn test_request_keep_alive_case_insensitive() {
    assert!(get("/", &[("Connection", "Keep-Alive")]).keep_alive());
}

#[test]
fn test_request_http10_closes_by_default() {
    let mut req = get("/", &[]);
    req.version = "HTTP/1.0".to_string();
    assert!(!req.keep_alive());

    req.headers.insert("Connection".to_string(), "keep-alive".to_string());
    assert!(req.keep_alive());
}

#[test]
fn test_request_path_only_strips_query() {
    assert_eq!(get("/search?q=rust", &[]).path_only(), "/search");
    assert_eq!(get("/plain", &[]).path_only(), "/plain");
}

#[test]
fn test_request_query_pairs_are_decoded() {
    let req = get("/form?name=J%C3%BCrgen&city=New+York&empty=", &[]);
    let pairs: Vec<(String, String)> = req
        .query_pairs()
        .into_iter()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("name".to_string(), "Jürgen".to_string()),
            ("city".to_string(), "New York".to_string()),
            ("empty".to_string(), String::new()),
        ]
    );
    assert!(get("/", &[]).query_pairs().is_empty());
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_request_read_methods() {
    assert!(Method::GET.is_read());
    assert!(Method::HEAD.is_read());
    assert!(!Method::POST.is_read());
}

#[test]
fn test_request_builder_defaults_version() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .build()
        .unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert!(RequestBuilder::new().path("/").build().is_err());
}
