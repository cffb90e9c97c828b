// OpenAI chat-completions text generator.
// Builds the stand-up prompt, requests the narrative summary, then short per-commit insights.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::github::Commit;

use super::types::{Insight, MAX_INSIGHTS, Summary, SummaryMetadata, SummaryRequest};
use super::{GenerationError, TextGenerator};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Per-commit insights are only requested for sets this small.
const INSIGHT_COMMIT_LIMIT: usize = 10;
const INSIGHT_FALLBACK: &str = "Unable to generate insight for this commit.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text generator backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, "Summary request rejected");
            return Err(classify_status(status, text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Failed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| GenerationError::Failed("empty completion".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<Summary, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        if request.commits.is_empty() {
            return Err(GenerationError::NoCommits);
        }

        let prompt = build_summary_prompt(&request);
        let summary = self.complete(api_key, &prompt, 800, 0.3).await?;

        let mut insights = Vec::new();
        if request.commits.len() <= INSIGHT_COMMIT_LIMIT {
            for commit in request.commits.iter().take(MAX_INSIGHTS) {
                let insight = match self
                    .complete(api_key, &build_insight_prompt(commit), 100, 0.2)
                    .await
                {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(sha = %commit.sha, error = %e, "Failed to generate insight");
                        INSIGHT_FALLBACK.to_string()
                    }
                };
                insights.push(Insight {
                    sha: commit.sha.clone(),
                    insight,
                });
            }
        }

        Ok(Summary {
            summary,
            insights,
            metadata: SummaryMetadata {
                commit_count: request.commits.len(),
                timeframe: request.timeframe.to_string(),
                repository_name: request.repository_name.to_string(),
                generated_at: Utc::now(),
            },
        })
    }
}

/// Map an upstream HTTP status to a caller-visible failure.
fn classify_status(status: StatusCode, body: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
        _ => GenerationError::Failed(format!("{}: {}", status, body)),
    }
}

/// Prompt asking for the overall stand-up summary.
pub fn build_summary_prompt(request: &SummaryRequest<'_>) -> String {
    let commit_lines = request
        .commits
        .iter()
        .enumerate()
        .map(|(index, commit)| {
            format!(
                "{}. {} (by {} on {})",
                index + 1,
                commit.message(),
                commit.author_name(),
                commit.authored_at().format("%-m/%-d/%Y")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the following {count} commits from the {repo} repository over {timeframe} \
and generate a professional stand-up summary:

{commit_lines}

Please provide:
1. A brief summary of what was accomplished
2. Key technical changes or improvements
3. Any patterns you notice (bug fixes, features, refactoring, etc.)
4. Suggested talking points for a stand-up meeting

Format the response as markdown with clear sections. Keep it concise but informative.",
        count = request.commits.len(),
        repo = request.repository_name,
        timeframe = request.timeframe,
    )
}

fn build_insight_prompt(commit: &Commit) -> String {
    format!(
        "Briefly explain what this commit does in 1-2 sentences: \"{}\"",
        commit.message()
    )
}
