//! Tests against a running `rustax-server`.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{endpoint_url, http_client, unique_key};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_greet_in_text_by_default() {
        let response = http_client()
            .get(format!("{}/greetings", endpoint_url()))
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.text().await.expect("body"), "Hello, world!");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_greet_in_json_when_asked() {
        let response = http_client()
            .get(format!("{}/greetings/ada/2", endpoint_url()))
            .header("accept", "application/json")
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body, json!(["Hello, ada!", "Hello, ada!"]));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_store_echoed_json() {
        let key = unique_key("echo");
        let response = http_client()
            .put(format!("{}/echo/{key}", endpoint_url()))
            .json(&json!({"n": 1}))
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["location"], format!("echo/{key}"));
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body, json!({"key": key, "value": {"n": 1}}));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_negotiation_failures() {
        let client = http_client();

        let response = client
            .get(format!("{}/nothing-here", endpoint_url()))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = client
            .get(format!("{}/greetings", endpoint_url()))
            .header("accept", "image/png")
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

        let response = client
            .post(format!("{}/echo", endpoint_url()))
            .header("content-type", "application/xml")
            .body("<ping/>")
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
