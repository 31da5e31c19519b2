use crate::openai::config::OpenAiConfig;
use eqr_core::llm::{ChatError, ChatOpts, ChatResult, Message, ModelClient};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    cfg: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(cfg: OpenAiConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))?,
        );
        let mut builder = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        if let Some(p) = &cfg.proxy {
            builder = builder.proxy(reqwest::Proxy::all(p)?);
        }
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }

    /// Options the client was configured with, used for every summary request.
    pub fn default_opts(&self) -> ChatOpts {
        ChatOpts {
            model: self.cfg.model.clone(),
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        }
    }
}

pub(crate) fn chat_request_body(msgs: &[Message], opts: &ChatOpts) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = msgs
        .iter()
        .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
        .collect();
    let mut body = serde_json::json!({
        "model": opts.model,
        "messages": messages,
        "stream": false,
    });
    if let Some(map) = body.as_object_mut() {
        if let Some(t) = opts.temperature {
            map.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(m) = opts.max_tokens {
            map.insert("max_tokens".into(), serde_json::json!(m));
        }
    }
    body
}

pub(crate) fn parse_chat_response(v: &serde_json::Value) -> Result<ChatResult, ChatError> {
    if let Some(msg) = v["error"]["message"].as_str() {
        return Err(ChatError::Protocol(msg.to_string()));
    }
    let choice = &v["choices"][0];
    if choice.is_null() {
        return Err(ChatError::Decode("response has no choices".into()));
    }
    let text = choice["message"]["content"]
        .as_str()
        .unwrap_or("")
        .to_string();
    Ok(ChatResult {
        text,
        finish_reason: choice["finish_reason"].as_str().map(str::to_string),
        prompt_tokens: v["usage"]["prompt_tokens"].as_u64().map(|n| n as u32),
        completion_tokens: v["usage"]["completion_tokens"].as_u64().map(|n| n as u32),
    })
}

#[allow(async_fn_in_trait)]
impl ModelClient for OpenAiClient {
    async fn send_chat(&self, msgs: &[Message], opts: &ChatOpts) -> Result<ChatResult, ChatError> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        info!(target:"providers::openai","chat request model={} messages={}", opts.model, msgs.len());
        let body = chat_request_body(msgs, opts);
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.ok();
            error!(target:"providers::openai","chat non-200 status={} body={:?}", status, body);
            return Err(map_status_err(status, body));
        }
        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        let out = parse_chat_response(&v)?;
        debug!(
            target:"providers::openai",
            "chat done finish={:?} prompt_tokens={:?} completion_tokens={:?}",
            out.finish_reason, out.prompt_tokens, out.completion_tokens
        );
        Ok(out)
    }
}

fn map_reqwest_err(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout(e.to_string())
    } else if e.is_request() || e.is_connect() {
        ChatError::Network(e.to_string())
    } else {
        ChatError::Other(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>) -> ChatError {
    let s = format!("{} {}", status.as_u16(), body.unwrap_or_default());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ChatError::Auth(s),
        StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimit(s),
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => ChatError::Network(s),
        StatusCode::NOT_FOUND => ChatError::Protocol("404".into()),
        _ => ChatError::Other(s),
    }
}
