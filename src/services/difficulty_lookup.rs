use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LookupConfig;
use crate::tracker::types::Difficulty;

const QUESTION_DIFFICULTY_QUERY: &str = r#"
query questionData($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        difficulty
    }
}
"#;

/// 外部难度查询：给定 slug 返回难度，或失败
pub trait DifficultyLookup: Send + Sync {
    fn lookup(&self, slug: &str) -> impl Future<Output = Result<Difficulty, LookupError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("difficulty lookup is disabled")]
    Disabled,
    #[error("difficulty lookup timed out")]
    Timeout,
    #[error("difficulty lookup network error: {0}")]
    Network(String),
    #[error("difficulty lookup api error: status={status}")]
    ApiError { status: u16 },
    #[error("difficulty lookup returned no difficulty for '{0}'")]
    Missing(String),
    #[error("difficulty lookup returned unknown label '{0}'")]
    UnknownLabel(String),
}

impl LookupError {
    /// 是否真正发出了网络请求（用于决定是否需要限速间隔）
    pub fn reached_network(&self) -> bool {
        !matches!(self, LookupError::Disabled)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a> {
    query: &'static str,
    variables: GraphqlVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlVariables<'a> {
    title_slug: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<QuestionData>,
}

#[derive(Debug, Deserialize)]
struct QuestionData {
    question: Option<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    difficulty: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GraphqlLookup {
    config: LookupConfig,
    client: reqwest::Client,
}

impl GraphqlLookup {
    pub fn new(config: &LookupConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn fetch(&self, slug: &str) -> Result<Difficulty, LookupError> {
        if !self.config.enabled {
            return Err(LookupError::Disabled);
        }

        let payload = GraphqlRequest {
            query: QUESTION_DIFFICULTY_QUERY,
            variables: GraphqlVariables { title_slug: slug },
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::ApiError {
                status: status.as_u16(),
            });
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        parse_difficulty(slug, body)
    }
}

impl DifficultyLookup for GraphqlLookup {
    async fn lookup(&self, slug: &str) -> Result<Difficulty, LookupError> {
        self.fetch(slug).await
    }
}

fn parse_difficulty(slug: &str, body: GraphqlResponse) -> Result<Difficulty, LookupError> {
    let question = body
        .data
        .and_then(|d| d.question)
        .ok_or_else(|| LookupError::Missing(slug.to_string()))?;

    match question.difficulty {
        Some(label) if !label.trim().is_empty() => label
            .parse::<Difficulty>()
            .map_err(|_| LookupError::UnknownLabel(label)),
        // 题目存在但难度为空，按中等处理
        _ => Ok(Difficulty::Medium),
    }
}
