use crate::config::Settings;
use crate::error::{FetchError, ResponseCode};
use crate::form::GameConfig;
use crate::question::{decode_entities, Question, QuestionKind};
use serde::Deserialize;
use tracing::{debug, info};

/// Anything that can supply the questions for a game
pub trait QuestionSource: Send + Sync {
    fn fetch(&self, config: &GameConfig) -> Result<Vec<Question>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(rename = "type")]
    kind: QuestionKind,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, FetchError> {
        if self.incorrect_answers.is_empty() {
            return Err(FetchError::Malformed(format!(
                "question {:?} has no incorrect answers",
                self.question
            )));
        }

        Ok(Question {
            prompt: decode_entities(&self.question),
            correct_answer: decode_entities(&self.correct_answer),
            incorrect_answers: self
                .incorrect_answers
                .iter()
                .map(|a| decode_entities(a))
                .collect(),
            kind: self.kind,
            difficulty: self.difficulty,
        })
    }
}

/// Query parameters for a game: `amount` always, the filters only when chosen.
pub fn query_params(config: &GameConfig) -> Vec<(&'static str, String)> {
    let mut params = vec![("amount", config.amount.to_string())];
    if let Some(difficulty) = config.difficulty.as_query() {
        params.push(("difficulty", difficulty.to_string()));
    }
    if let Some(category) = config.category {
        params.push(("category", category.to_string()));
    }
    params
}

/// Turn a provider payload into questions, rejecting non-zero response codes.
pub fn parse_response(body: &str) -> Result<Vec<Question>, FetchError> {
    let response: TriviaResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let code = ResponseCode(response.response_code);
    if !code.is_success() {
        return Err(FetchError::Provider(code));
    }

    response
        .results
        .into_iter()
        .map(RawQuestion::into_question)
        .collect()
}

/// Blocking client for the Open Trivia DB API
#[derive(Clone)]
pub struct OpenTdbClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OpenTdbClient {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.trivia_url.clone(),
        })
    }
}

impl QuestionSource for OpenTdbClient {
    fn fetch(&self, config: &GameConfig) -> Result<Vec<Question>, FetchError> {
        let params = query_params(config);
        debug!(url = %self.base_url, ?params, "requesting questions");

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().map_err(FetchError::Transport)?;
        let questions = parse_response(&body)?;
        info!(count = questions.len(), "fetched questions");
        Ok(questions)
    }
}
