use vein::http::response::{Response, ResponseBuilder, StatusCode};
use vein::http::writer::serialize_response;

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    let content_length = response.headers.get("Content-Length").unwrap();
    assert_eq!(content_length, &body.len().to_string());
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    // Should keep the custom value
    assert_eq!(response.headers.get("Content-Length").unwrap(), "999");
}

#[test]
fn test_response_html_helper() {
    let response = Response::html("<p>hi</p>");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(
        response.headers.get("Content-Type").unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(response.body, b"<p>hi</p>".to_vec());
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, b"404 Not Found".to_vec());
}

#[test]
fn test_response_method_not_allowed_lists_allowed() {
    let response = Response::method_not_allowed();

    assert_eq!(response.status, StatusCode::MethodNotAllowed);
    assert_eq!(response.headers.get("Allow").unwrap(), "GET, HEAD");
}

#[test]
fn test_response_without_body_keeps_length() {
    let response = Response::html("<p>hi</p>").without_body();

    assert!(response.body.is_empty());
    assert_eq!(response.headers.get("Content-Length").unwrap(), "9");
}

#[test]
fn test_serialize_response_connection_header() {
    let response = Response::ok("x");

    let keep = String::from_utf8(serialize_response(&response, true)).unwrap();
    let close = String::from_utf8(serialize_response(&response, false)).unwrap();

    assert!(keep.contains("Connection: keep-alive\r\n"));
    assert!(close.contains("Connection: close\r\n"));
    assert!(close.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(close.ends_with("\r\n\r\nx"));
}
