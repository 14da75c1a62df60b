//! Typed helpers for the orchestrator and permission endpoints.

use orca_types::{AssessedInstance, AuthorizeResult, Permission};
use orca_util::build_path;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, OrchestratorClient};

const INSTANCE_PATH: &str = "/api/orchestrator/v2/workflows/instances/{instanceId}";
const ABORT_PATH: &str = "/api/orchestrator/v2/workflows/instances/{instanceId}/abort";
const AUTHORIZE_PATH: &str = "/api/permission/authorize";

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    items: Vec<AuthorizeRequestItem<'a>>,
}

#[derive(Debug, Serialize)]
struct AuthorizeRequestItem<'a> {
    id: String,
    permission: BasicPermission<'a>,
}

#[derive(Debug, Serialize)]
struct BasicPermission<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    attributes: PermissionAttributes<'a>,
}

#[derive(Debug, Serialize)]
struct PermissionAttributes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    items: Vec<AuthorizeResponseItem>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponseItem {
    id: String,
    result: AuthorizeResult,
}

impl OrchestratorClient {
    /// Fetch one instance, optionally including the assessment that recommended it.
    pub async fn get_instance(&self, instance_id: &str, include_assessment: bool) -> Result<AssessedInstance, ApiError> {
        let response = self.instance_request(instance_id, include_assessment).send().await?;
        decode_json(response).await
    }

    pub(crate) fn instance_request(&self, instance_id: &str, include_assessment: bool) -> RequestBuilder {
        let path = build_path(INSTANCE_PATH, &[("instanceId", instance_id)]);
        self.request(Method::GET, &path)
            .query(&[("includeAssessment", include_assessment)])
    }

    /// Ask the backend to abort a running instance.
    pub async fn abort_instance(&self, instance_id: &str) -> Result<(), ApiError> {
        let response = self.abort_request(instance_id).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        debug!(%instance_id, "abort accepted");
        Ok(())
    }

    pub(crate) fn abort_request(&self, instance_id: &str) -> RequestBuilder {
        let path = build_path(ABORT_PATH, &[("instanceId", instance_id)]);
        self.request(Method::DELETE, &path)
    }

    /// Evaluate a descriptor set; results are returned in request order.
    ///
    /// Descriptors missing from the response are reported as denied.
    pub async fn authorize(&self, permissions: &[Permission]) -> Result<Vec<AuthorizeResult>, ApiError> {
        let request = AuthorizeRequest {
            items: permissions
                .iter()
                .enumerate()
                .map(|(index, permission)| AuthorizeRequestItem {
                    id: index.to_string(),
                    permission: BasicPermission {
                        kind: "basic",
                        name: &permission.name,
                        attributes: PermissionAttributes {
                            action: permission.action.as_deref(),
                        },
                    },
                })
                .collect(),
        };
        let response = self.request(Method::POST, AUTHORIZE_PATH).json(&request).send().await?;
        let decoded: AuthorizeResponse = decode_json(response).await?;
        Ok(order_results(permissions.len(), decoded.items))
    }
}

fn order_results(expected: usize, items: Vec<AuthorizeResponseItem>) -> Vec<AuthorizeResult> {
    let mut results = vec![AuthorizeResult::Deny; expected];
    for item in items {
        if let Some(slot) = item.id.parse::<usize>().ok().and_then(|index| results.get_mut(index)) {
            *slot = item.result;
        }
    }
    results
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|error| ApiError::decode(status, error, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use serde_json::json;

    fn local_client(base_url: &str) -> OrchestratorClient {
        OrchestratorClient::new(base_url, Some("secret")).unwrap()
    }

    /// Answers exactly one request with `status_line` and a JSON `body`,
    /// returning the request head it received.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base_url, handle)
    }

    #[test]
    fn instance_request_targets_encoded_instance_path() {
        let client = local_client("http://localhost:7007");
        let request = client.instance_request("a/b", true).build().unwrap();

        assert_eq!(*request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:7007/api/orchestrator/v2/workflows/instances/a%2Fb?includeAssessment=true"
        );
    }

    #[test]
    fn abort_request_deletes_abort_resource() {
        let client = local_client("http://localhost:7007");
        let request = client.abort_request("a/b").build().unwrap();

        assert_eq!(*request.method(), Method::DELETE);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:7007/api/orchestrator/v2/workflows/instances/a%2Fb/abort"
        );
        assert!(request.headers().contains_key(reqwest::header::AUTHORIZATION));
    }

    #[tokio::test]
    async fn get_instance_decodes_assessed_instance() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"instance":{"id":"abc","processId":"greeting","state":"Active"}}"#,
        );

        let assessed = local_client(&base_url).get_instance("abc", true).await.unwrap();

        assert_eq!(assessed.instance.process_id, "greeting");
        assert!(assessed.assessed_by.is_none());
        let head = server.join().unwrap();
        assert!(
            head.starts_with("GET /api/orchestrator/v2/workflows/instances/abc?includeAssessment=true HTTP/1.1"),
            "{head}"
        );
    }

    #[tokio::test]
    async fn abort_failure_carries_backend_message() {
        let (base_url, server) = serve_once(
            "409 Conflict",
            r#"{"error":{"message":"instance already completed"}}"#,
        );

        let error = local_client(&base_url).abort_instance("abc").await.unwrap_err();

        assert_eq!(error.status(), Some(409));
        assert_eq!(error.to_string(), "HTTP 409: instance already completed");
        let head = server.join().unwrap();
        assert!(
            head.starts_with("DELETE /api/orchestrator/v2/workflows/instances/abc/abort HTTP/1.1"),
            "{head}"
        );
    }

    #[test]
    fn authorize_request_uses_basic_permission_shape() {
        let permissions = Permission::workflow_use_set(Some("greeting"));
        let request = AuthorizeRequest {
            items: vec![AuthorizeRequestItem {
                id: "0".into(),
                permission: BasicPermission {
                    kind: "basic",
                    name: &permissions[1].name,
                    attributes: PermissionAttributes {
                        action: permissions[1].action.as_deref(),
                    },
                },
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "items": [{
                    "id": "0",
                    "permission": {
                        "type": "basic",
                        "name": "orchestrator.workflow.use.greeting",
                        "attributes": { "action": "update" }
                    }
                }]
            })
        );
    }

    #[test]
    fn results_are_reordered_and_missing_items_denied() {
        let response: AuthorizeResponse = serde_json::from_value(json!({
            "items": [
                { "id": "2", "result": "ALLOW" },
                { "id": "0", "result": "CONDITIONAL" },
                { "id": "9", "result": "ALLOW" }
            ]
        }))
        .unwrap();

        let ordered = order_results(3, response.items);
        assert_eq!(
            ordered,
            vec![AuthorizeResult::Conditional, AuthorizeResult::Deny, AuthorizeResult::Allow]
        );
    }
}
