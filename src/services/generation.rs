//! # Message Generation Service
//!
//! Two-tier message production for the personalized outreach executors:
//! a primary call to the best-effort generative text service, and a
//! deterministic template-substitution fallback. The tiers are modelled as
//! separate Result-returning operations rather than exception control flow,
//! so each is independently testable; the fallback tier cannot fail, which
//! is what lets the personalized-email executor treat generation outages as
//! degraded success instead of item failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::models::Candidate;
use crate::services::templates::TemplateStore;

/// Built-in template used when the job supplies neither an inline template
/// nor a catalog template name. Deliberately generic; real campaigns are
/// expected to provide their own.
const DEFAULT_OUTREACH_TEMPLATE: &str = "Hi {{ first_name }},\n\n\
I came across your background{% if company %} at {{ company }}{% endif %} and \
was impressed. I'd love to connect about an opportunity that could be a \
strong fit for your experience{% if title %} as {{ title }}{% endif %}.\n\n\
Would you be open to a quick chat this week?";

/// Errors from the primary generation tier
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),

    #[error("Generation request timed out: {0}")]
    Timeout(String),

    #[error("Generation service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Prompt sent to the generative service
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

/// Which tier produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    /// Primary tier: the generative service
    Model,
    /// Fallback tier: deterministic template substitution
    Template,
}

impl fmt::Display for GenerationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Template => write!(f, "template"),
        }
    }
}

/// A produced outreach message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub body: String,
    pub source: GenerationSource,
}

/// Client for the best-effort generative text service
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// HTTP client for the platform's generation service
pub struct HttpGenerativeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateApiResponse {
    text: String,
}

impl HttpGenerativeClient {
    /// Build the client with the configured request timeout; a slow
    /// generation call must not occupy a concurrency slot indefinitely
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerativeClient for HttpGenerativeClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/v1/generate", self.base_url);
        let mut http_request = self.client.post(&url).json(&GenerateApiRequest {
            model: &self.model,
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
        });
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(e.to_string())
            } else {
                GenerationError::RequestFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(GenerationError::RequestFailed(format!(
                "generation service returned {}",
                response.status()
            )));
        }

        let payload: GenerateApiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        Ok(payload.text)
    }
}

/// Two-tier message production: generative service first, deterministic
/// template substitution on any primary failure
pub struct MessageGenerationService {
    client: Arc<dyn GenerativeClient>,
    templates: Option<Arc<dyn TemplateStore>>,
    max_tokens: u32,
}

impl MessageGenerationService {
    pub fn new(client: Arc<dyn GenerativeClient>) -> Self {
        Self {
            client,
            templates: None,
            max_tokens: 512,
        }
    }

    /// Attach the template catalog used to resolve `template_name`
    /// parameters in the fallback tier
    pub fn with_templates(
        client: Arc<dyn GenerativeClient>,
        templates: Arc<dyn TemplateStore>,
    ) -> Self {
        Self {
            client,
            templates: Some(templates),
            max_tokens: 512,
        }
    }

    /// Produce a message for one candidate. Never fails: any primary-tier
    /// error degrades to the template tier, which always succeeds.
    pub async fn generate(&self, candidate: &Candidate, parameters: &Value) -> GeneratedMessage {
        match self.try_model(candidate, parameters).await {
            Ok(body) if !body.trim().is_empty() => GeneratedMessage {
                body,
                source: GenerationSource::Model,
            },
            Ok(_) => {
                warn!(
                    candidate_id = %candidate.candidate_id,
                    "Generation service returned an empty message, using template fallback"
                );
                self.render_fallback(candidate, parameters).await
            }
            Err(e) => {
                warn!(
                    candidate_id = %candidate.candidate_id,
                    error = %e,
                    "Generation service unavailable, using template fallback"
                );
                self.render_fallback(candidate, parameters).await
            }
        }
    }

    /// Primary tier: one bounded call to the generative service
    async fn try_model(
        &self,
        candidate: &Candidate,
        parameters: &Value,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest {
            prompt: build_prompt(candidate, parameters),
            max_tokens: self.max_tokens,
        };
        self.client.complete(&request).await
    }

    /// Fallback tier: deterministic template substitution. Always produces
    /// a message.
    pub async fn render_fallback(
        &self,
        candidate: &Candidate,
        parameters: &Value,
    ) -> GeneratedMessage {
        let template_body = self.resolve_template_body(parameters).await;
        let body = match render_template(&template_body, candidate, parameters) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(
                    candidate_id = %candidate.candidate_id,
                    error = %e,
                    "Template rendering failed, using minimal substitution"
                );
                minimal_message(candidate)
            }
        };
        GeneratedMessage {
            body,
            source: GenerationSource::Template,
        }
    }

    /// Template body priority: inline `base_template` parameter, then a
    /// catalog lookup by `template_name`, then the built-in default
    async fn resolve_template_body(&self, parameters: &Value) -> String {
        if let Some(inline) = parameters.get("base_template").and_then(Value::as_str) {
            return inline.to_string();
        }

        if let Some(name) = parameters.get("template_name").and_then(Value::as_str) {
            if let Some(store) = &self.templates {
                match store.find_by_name(name).await {
                    Ok(Some(template)) => return template.base_template,
                    Ok(None) => {
                        debug!(template_name = name, "Template not found, using default")
                    }
                    Err(e) => {
                        warn!(template_name = name, error = %e, "Template lookup failed, using default")
                    }
                }
            }
        }

        DEFAULT_OUTREACH_TEMPLATE.to_string()
    }
}

/// Render a template body against candidate fields and job-supplied
/// variables
fn render_template(
    template_body: &str,
    candidate: &Candidate,
    parameters: &Value,
) -> Result<String, tera::Error> {
    let mut context = tera::Context::new();
    context.insert("first_name", &candidate.first_name);
    context.insert("last_name", &candidate.last_name);
    context.insert("full_name", &candidate.full_name());
    context.insert("email", &candidate.email);
    context.insert("company", &candidate.company);
    context.insert("title", &candidate.title);
    context.insert("pipeline_stage", &candidate.pipeline_stage);

    if let Some(variables) = parameters.get("variables").and_then(Value::as_object) {
        for (key, value) in variables {
            context.insert(key, value);
        }
    }

    tera::Tera::one_off(template_body, &context, false)
}

/// Last-resort message when even template rendering fails; plain string
/// assembly so it cannot error
fn minimal_message(candidate: &Candidate) -> String {
    format!(
        "Hi {},\n\nI came across your background and would love to connect \
about an opportunity. Would you be open to a quick chat this week?",
        candidate.first_name
    )
}

fn build_prompt(candidate: &Candidate, parameters: &Value) -> String {
    let tone = parameters
        .get("tone")
        .and_then(Value::as_str)
        .unwrap_or("warm, concise, professional");
    let role = parameters
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("an open role");

    format!(
        "Write a short outreach email to {name}{title}{company}. \
The email is about {role}. Tone: {tone}. \
Do not include a subject line or signature.",
        name = candidate.full_name(),
        title = candidate
            .title
            .as_deref()
            .map(|t| format!(", {t}"))
            .unwrap_or_default(),
        company = candidate
            .company
            .as_deref()
            .map(|c| format!(" at {c}"))
            .unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    struct FailingClient;

    #[async_trait]
    impl GenerativeClient for FailingClient {
        async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            Err(GenerationError::RequestFailed("connection refused".into()))
        }
    }

    struct EchoClient;

    #[async_trait]
    impl GenerativeClient for EchoClient {
        async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(format!("generated: {}", request.prompt))
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            candidate_id: Uuid::new_v4(),
            first_name: "Priya".to_string(),
            last_name: "Shah".to_string(),
            email: Some("priya@example.com".to_string()),
            company: Some("Vector Labs".to_string()),
            title: Some("Platform Engineer".to_string()),
            pipeline_stage: None,
            tags: json!([]),
        }
    }

    #[tokio::test]
    async fn primary_tier_wins_when_healthy() {
        let service = MessageGenerationService::new(Arc::new(EchoClient));
        let message = service.generate(&candidate(), &json!({})).await;
        assert_eq!(message.source, GenerationSource::Model);
        assert!(message.body.starts_with("generated:"));
    }

    #[tokio::test]
    async fn failing_primary_degrades_to_template() {
        let service = MessageGenerationService::new(Arc::new(FailingClient));
        let message = service.generate(&candidate(), &json!({})).await;
        assert_eq!(message.source, GenerationSource::Template);
        assert!(message.body.contains("Priya"));
        assert!(message.body.contains("Vector Labs"));
    }

    #[tokio::test]
    async fn inline_template_parameter_takes_priority() {
        let service = MessageGenerationService::new(Arc::new(FailingClient));
        let parameters = json!({
            "base_template": "Hello {{ first_name }} from {{ sender }}!",
            "variables": {"sender": "Casey"}
        });
        let message = service.generate(&candidate(), &parameters).await;
        assert_eq!(message.body, "Hello Priya from Casey!");
        assert_eq!(message.source, GenerationSource::Template);
    }

    #[tokio::test]
    async fn malformed_template_still_produces_a_message() {
        let service = MessageGenerationService::new(Arc::new(FailingClient));
        let parameters = json!({"base_template": "Hello {{ unclosed"});
        let message = service.generate(&candidate(), &parameters).await;
        assert_eq!(message.source, GenerationSource::Template);
        assert!(message.body.contains("Priya"));
    }

    #[test]
    fn fallback_rendering_is_deterministic() {
        let c = candidate();
        let parameters = json!({});
        let one = render_template(DEFAULT_OUTREACH_TEMPLATE, &c, &parameters).unwrap();
        let two = render_template(DEFAULT_OUTREACH_TEMPLATE, &c, &parameters).unwrap();
        assert_eq!(one, two);
        assert!(one.contains("Priya"));
    }
}
