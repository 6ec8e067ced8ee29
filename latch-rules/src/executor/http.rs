//! External-predicate-call executor: an HTTP endpoint decides the outcome.
//!
//! Config:
//!
//! ```json
//! {
//!   "method": "POST",
//!   "endpoint": "https://api.example.com/check",
//!   "headers": {"Authorization": "Bearer ..."},
//!   "body_template": "{\"cpf\": \"{{cpf}}\"}",
//!   "success_field": "result.approved",
//!   "success_value": true,
//!   "timeout_ms": 3000
//! }
//! ```
//!
//! `{{field}}` placeholders in the body template are substituted with
//! dotted-path lookups into the data payload. A non-2xx response fails;
//! when `success_field` is set the response body is parsed as JSON and
//! that field is compared against `success_value`, or checked for
//! truthiness when `success_value` is unset.

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::executor::{config_str, require_field};
use crate::registry::RuleExecutor;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

/// An outbound HTTP request built from executor config.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A response as seen by the executor.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Outbound HTTP capability. The production implementation is
/// [`ReqwestCaller`]; tests substitute mocks.
#[async_trait]
pub trait HttpCaller: Send + Sync {
    async fn call(&self, request: HttpRequest) -> Result<HttpResponse, RuleError>;
}

/// [`HttpCaller`] backed by a shared reqwest client.
#[derive(Default)]
pub struct ReqwestCaller {
    client: reqwest::Client,
}

impl ReqwestCaller {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpCaller for ReqwestCaller {
    async fn call(&self, request: HttpRequest) -> Result<HttpResponse, RuleError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            RuleError::InvalidConfig {
                reason: format!("invalid HTTP method '{}'", request.method),
            }
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RuleError::ExternalCallFailed {
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RuleError::ExternalCallFailed {
                reason: e.to_string(),
            })?;

        Ok(HttpResponse { status, body })
    }
}

pub struct HttpCallExecutor {
    caller: Arc<dyn HttpCaller>,
}

impl HttpCallExecutor {
    pub fn new(caller: Arc<dyn HttpCaller>) -> Self {
        Self { caller }
    }

    fn build_request(&self, config: &Value, data: &Value) -> Result<HttpRequest, RuleError> {
        let endpoint = config_str(config, "endpoint")?;
        let method = config
            .get("method")
            .and_then(|m| m.as_str())
            .unwrap_or("GET")
            .to_uppercase();

        let mut headers = Vec::new();
        if let Some(Value::Object(map)) = config.get("headers") {
            for (name, value) in map {
                let value = value.as_str().ok_or_else(|| RuleError::InvalidConfig {
                    reason: format!("header '{}' must be a string", name),
                })?;
                headers.push((name.clone(), value.to_string()));
            }
        }

        let body = match config.get("body_template").and_then(|t| t.as_str()) {
            Some(template) => Some(render_template(template, data)?),
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: endpoint.to_string(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl RuleExecutor for HttpCallExecutor {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let request = self.build_request(config, data)?;

        let timeout = config
            .get("timeout_ms")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
            .unwrap_or(ctx.default_timeout);

        tracing::debug!(url = %request.url, method = %request.method, "external predicate call");

        let response = tokio::time::timeout(timeout, self.caller.call(request))
            .await
            .map_err(|_| RuleError::Timeout {
                millis: timeout.as_millis() as u64,
            })??;

        if !(200..300).contains(&response.status) {
            return Err(RuleError::ExternalCallFailed {
                reason: format!("endpoint returned status {}", response.status),
            });
        }

        let Some(success_field) = config.get("success_field").and_then(|f| f.as_str()) else {
            return Ok(());
        };

        let parsed: Value =
            serde_json::from_str(&response.body).map_err(|e| RuleError::ExternalCallFailed {
                reason: format!("response body is not JSON: {}", e),
            })?;

        let actual = crate::executor::lookup_field(&parsed, success_field).cloned();

        let passed = match config.get("success_value") {
            Some(expected) => actual.as_ref() == Some(expected),
            None => actual.map(|v| is_truthy(&v)).unwrap_or(false),
        };

        if passed {
            Ok(())
        } else {
            Err(RuleError::Failed {
                message: format!("external predicate '{}' did not confirm", success_field),
            })
        }
    }
}

fn template_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap())
}

/// Substitutes `{{field}}` placeholders with values from the data payload.
fn render_template(template: &str, data: &Value) -> Result<String, RuleError> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for captures in template_regex().captures_iter(template) {
        let whole = captures.get(0).unwrap();
        let path = &captures[1];

        let value = require_field(data, path)?;
        rendered.push_str(&template[last..whole.start()]);
        match value {
            Value::String(s) => rendered.push_str(s),
            other => rendered.push_str(&other.to_string()),
        }
        last = whole.end();
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
