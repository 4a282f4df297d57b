//! Method selection integration tests.

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::{body_json, body_text, fixture_dispatcher, request};

    #[test]
    fn test_should_resolve_longest_base_path() {
        let dispatcher = fixture_dispatcher();

        let response = dispatcher.serve(&request("GET", "/api/products/reviews"));
        assert_eq!(body_text(&response), "reviews");

        let response = dispatcher.serve(&request("GET", "/api/products"));
        assert_eq!(body_text(&response), "\"all products\"");

        let response = dispatcher.serve(&request("GET", "/api/"));
        assert_eq!(body_text(&response), "root");
    }

    #[test]
    fn test_should_prefer_literal_segment_over_capture() {
        let response = fixture_dispatcher().serve(&request("GET", "/api/products/featured"));
        assert_eq!(body_json(&response), json!("featured"));

        let response = fixture_dispatcher().serve(&request("GET", "/api/products/lamp"));
        assert_eq!(body_json(&response), json!({"slug": "lamp"}));
    }

    #[test]
    fn test_should_keep_declaration_order_without_accept() {
        let response = fixture_dispatcher().serve(&request("GET", "/api/products/7"));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(body_json(&response), json!({"id": "7"}));
    }

    #[test]
    fn test_should_select_by_accept_preference() {
        let dispatcher = fixture_dispatcher();

        let request_text =
            request("GET", "/api/products/7").with_accept_header("text/plain, application/json");
        let response = dispatcher.serve(&request_text);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(body_text(&response), "product 7");

        let request_json = request("GET", "/api/products/7")
            .with_accept_header("text/plain;q=0.2, application/json");
        let response = dispatcher.serve(&request_json);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_should_use_wildcard_accept_ranges() {
        let response = fixture_dispatcher()
            .serve(&request("GET", "/api/products/7").with_accept_header("text/*"));
        assert_eq!(body_text(&response), "product 7");
    }

    #[test]
    fn test_should_serialize_with_first_client_preference() {
        let response = fixture_dispatcher().serve(
            &request("GET", "/api/products").with_accept_header("text/plain, application/json"),
        );
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(body_text(&response), "all products");
    }

    #[test]
    fn test_should_ignore_trailing_slash() {
        let dispatcher = fixture_dispatcher();
        let with_slash = dispatcher.serve(&request("GET", "/api/products/7/"));
        let without = dispatcher.serve(&request("GET", "/api/products/7"));
        assert_eq!(with_slash, without);
        assert_eq!(with_slash.status(), StatusCode::OK);
    }

    #[test]
    fn test_should_reject_unacceptable_accept() {
        let response = fixture_dispatcher()
            .serve(&request("GET", "/api/products/7").with_accept_header("image/png"));
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }
}
