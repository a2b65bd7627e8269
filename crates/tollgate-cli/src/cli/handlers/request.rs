//! Authenticated request command

use super::build_client;
use crate::error::{CliError, Result};
use console::style;
use reqwest::Method;
use tollgate_sdk::ClientConfig;

/// Parse a case-insensitive HTTP method name
pub fn parse_method(method: &str) -> Result<Method> {
    let method = method.to_ascii_uppercase();
    match method.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" => Method::from_bytes(method.as_bytes())
            .map_err(|e| CliError::invalid_argument(format!("Invalid method: {e}"))),
        other => Err(CliError::invalid_argument(format!(
            "Unsupported HTTP method: {other}"
        ))),
    }
}

/// Send one request through the SDK pipeline and print the response
pub async fn handle_request(
    config: &ClientConfig,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<()> {
    let method = parse_method(method)?;
    let body = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| CliError::invalid_argument(format!("Request body is not JSON: {e}")))?;

    let client = build_client(config)?;
    let mut request = client.request(method, path);
    if let Some(body) = &body {
        request = request.json(body);
    }

    let response = client.send(request).await?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| CliError::internal(format!("Failed to read response body: {e}")))?;

    let status_line = if status.is_success() {
        style(status.to_string()).green()
    } else {
        style(status.to_string()).red()
    };
    println!("{}", status_line);

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or(text)
        ),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }

    if status.is_success() {
        Ok(())
    } else {
        Err(CliError::internal(format!("Request failed with status {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method as http_method, path as http_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(matches!(parse_method("BREW"), Err(CliError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_request_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(http_method("POST"))
            .and(http_path("/items"))
            .and(body_json(json!({ "name": "widget" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            base_url: server.uri(),
            storage_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        };

        handle_request(&config, "post", "/items", Some(r#"{"name":"widget"}"#))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_rejects_invalid_body() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..ClientConfig::default()
        };
        let result = handle_request(&config, "post", "/items", Some("{oops")).await;
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }
}
