//! HTTP service integration tests, driven without a socket.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use hyper::service::Service as _;
    use rustax_http::{REQUEST_ID_HEADER, RustAxHttpConfig, RustAxHttpService};

    use crate::fixture_dispatcher;

    fn service(max_body_bytes: usize) -> RustAxHttpService {
        RustAxHttpService::new(
            Arc::new(fixture_dispatcher()),
            RustAxHttpConfig { max_body_bytes },
        )
    }

    async fn call(
        service: &RustAxHttpService,
        request: http::Request<Full<Bytes>>,
    ) -> (http::response::Parts, Bytes) {
        let response = service.call(request).await.unwrap();
        let (parts, body) = response.into_parts();
        (parts, body.collect().await.unwrap().to_bytes())
    }

    #[tokio::test]
    async fn test_should_tag_every_response_with_request_id() {
        let service = service(1024);
        let mut seen = Vec::new();
        for path in ["/api/products/7", "/api/nowhere"] {
            let request = http::Request::get(path).body(Full::new(Bytes::new())).unwrap();
            let (parts, _) = call(&service, request).await;
            let id = parts.headers[REQUEST_ID_HEADER].to_str().unwrap().to_owned();
            assert!(uuid::Uuid::parse_str(&id).is_ok(), "not a uuid: {id}");
            assert_eq!(parts.headers["server"], "RustAx");
            seen.push(id);
        }
        assert_ne!(seen[0], seen[1]);
    }

    #[tokio::test]
    async fn test_should_dispatch_http_request() {
        let request = http::Request::put("/api/products/12/name")
            .header("content-type", "text/plain; charset=utf-8")
            .header("accept", "application/json")
            .body(Full::new(Bytes::from_static(b"Floor lamp")))
            .unwrap();

        let (parts, body) = call(&service(1024), request).await;
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(parts.headers["content-type"], "application/json");
        assert_eq!(&body[..], br#"["Floor lamp","12"]"#);
    }

    #[tokio::test]
    async fn test_should_refuse_body_over_limit() {
        let request = http::Request::post("/api/products")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(vec![b' '; 64])))
            .unwrap();

        let (parts, _) = call(&service(16), request).await;
        assert_eq!(parts.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_should_map_failures_to_status_codes() {
        let service = service(1024);
        let unsupported = StatusCode::UNSUPPORTED_MEDIA_TYPE;
        let cases = [
            ("GET", "/api/products/7", None, Some("image/png"), StatusCode::NOT_ACCEPTABLE),
            ("POST", "/api/products", Some("application/xml"), None, unsupported),
            ("POST", "/api/products", Some("not a media type"), None, unsupported),
            ("GET", "/elsewhere", None, None, StatusCode::NOT_FOUND),
        ];

        for (method, path, content_type, accept, expected) in cases {
            let mut builder = http::Request::builder().method(method).uri(path);
            if let Some(content_type) = content_type {
                builder = builder.header("content-type", content_type);
            }
            if let Some(accept) = accept {
                builder = builder.header("accept", accept);
            }
            let request = builder.body(Full::new(Bytes::from_static(b"{}"))).unwrap();

            let (parts, body) = call(&service, request).await;
            assert_eq!(parts.status, expected, "failed for {method} {path}");
            assert_eq!(
                body,
                Bytes::from_static(expected.canonical_reason().unwrap().as_bytes())
            );
        }
    }
}
