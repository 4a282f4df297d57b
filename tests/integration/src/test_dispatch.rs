//! Dispatch outcome integration tests: bodies, status codes, failures.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;
    use rustax_http::DispatchError;
    use serde_json::json;

    use crate::{body_json, body_text, fixture_dispatcher, media, request};

    #[test]
    fn test_should_create_from_json_body() {
        let request = request("POST", "/api/products")
            .with_content_type(media("application/json; charset=utf-8"))
            .with_body(Bytes::from_static(br#"{"name":"lamp","price":12}"#));

        let response = fixture_dispatcher().serve(&request);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(body_json(&response), json!({"name": "lamp", "price": 12}));
    }

    #[test]
    fn test_should_prepend_body_to_path_arguments() {
        let request = request("PUT", "/api/products/3/name")
            .with_content_type(media("text/plain"))
            .with_body("Desk lamp");

        let response = fixture_dispatcher().serve(&request);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!(["Desk lamp", "3"]));
    }

    #[test]
    fn test_should_answer_without_body_for_unit_result() {
        let response = fixture_dispatcher().serve(&request("DELETE", "/api/products/3"));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_none());
    }

    #[test]
    fn test_should_reject_unconsumable_content_type() {
        let request = request("POST", "/api/products")
            .with_content_type(media("application/xml"))
            .with_body("<product/>");
        let err = fixture_dispatcher().dispatch(&request).unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_should_reject_consumable_type_without_serializer() {
        let request = request("POST", "/api/products")
            .with_content_type(media("text/csv"))
            .with_body("name,price\nlamp,12\n");
        let response = fixture_dispatcher().serve(&request);
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body_text(&response), "Unsupported Media Type");
    }

    #[test]
    fn test_should_reject_body_without_content_type() {
        let request = request("POST", "/api/products").with_body("{}");
        let response = fixture_dispatcher().serve(&request);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_reject_producible_type_without_serializer() {
        let err = fixture_dispatcher()
            .dispatch(&request("GET", "/api/products/7/sheet"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotAcceptable(_)));
    }

    #[test]
    fn test_should_return_not_found() {
        let dispatcher = fixture_dispatcher();
        for (method, path) in [
            ("GET", "/products"),
            ("GET", "/api/unknown"),
            ("PATCH", "/api/products"),
            ("GET", "/api/products/7/8/9"),
        ] {
            let response = dispatcher.serve(&request(method, path));
            assert_eq!(
                response.status(),
                StatusCode::NOT_FOUND,
                "failed for {method} {path}"
            );
        }
    }

    #[test]
    fn test_should_serve_concurrent_requests_from_shared_dispatcher() {
        let dispatcher = std::sync::Arc::new(fixture_dispatcher());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = std::sync::Arc::clone(&dispatcher);
                std::thread::spawn(move || {
                    let response = dispatcher.serve(&request("GET", &format!("/api/products/{i}")));
                    body_json(&response)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), json!({"id": i.to_string()}));
        }
    }
}
