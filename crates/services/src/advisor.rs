use std::env;
use std::fmt::Write as _;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use prep_core::model::{Category, UserStatistics};

use crate::error::AdvisorError;

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AdvisorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("PREP_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("PREP_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("PREP_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Turns a user's statistics into short, personalized study advice.
///
/// Optional: without configuration the service reports itself disabled and
/// callers fall back to showing the raw numbers.
#[derive(Clone)]
pub struct AdvisorService {
    client: Client,
    config: Option<AdvisorConfig>,
}

impl AdvisorService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(AdvisorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<AdvisorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate study advice from the user's current statistics.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError` when the service is disabled, the request
    /// fails, or the response is empty.
    pub async fn advise(&self, stats: &UserStatistics) -> Result<String, AdvisorError> {
        let config = self.config.as_ref().ok_or(AdvisorError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(stats),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdvisorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AdvisorError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

fn build_prompt(stats: &UserStatistics) -> String {
    let mut prompt = String::from(
        "You are a study coach for a real-estate licensing exam. \
         Given the learner's statistics, give two or three short, \
         concrete suggestions for what to study next. Statistics:\n",
    );
    let _ = writeln!(
        prompt,
        "- answered: {} ({} correct, {:.0}% accuracy)",
        stats.total_questions(),
        stats.correct_answers(),
        stats.accuracy() * 100.0
    );
    let _ = writeln!(
        prompt,
        "- study days: {}, current streak: {}",
        stats.study_days(),
        stats.current_streak()
    );
    for category in Category::ALL {
        let tally = stats.category(category);
        if tally.total() == 0 {
            continue;
        }
        let _ = writeln!(
            prompt,
            "- {}: {} of {} correct",
            category.as_str(),
            tally.correct(),
            tally.total()
        );
    }
    prompt
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
