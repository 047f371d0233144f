use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use study_core::model::StoryId;

use super::{
    AddSentenceResponse, StartAssessmentResponse, StartStoryResponse, StudyApi,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// `StudyApi` over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpStudyApi {
    client: Client,
    config: ApiConfig,
}

impl HttpStudyApi {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Resolve `segments` under the base URL. Each segment is percent-encoded,
    /// so opaque ids cannot change the route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let base = self.config.base_url();
        let mut url = Url::parse(base)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint {
                base: base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "study api request");
        let builder = self.client.request(method, url);
        Ok(match self.config.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn start_assessment(&self) -> Result<StartAssessmentResponse, ApiError> {
        Self::send(self.request(Method::POST, &["assessments", "start"])?).await
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        let builder = self.request(Method::POST, &["assessments", "submit"])?;
        Self::send(builder.json(request)).await
    }

    async fn start_story(&self, title: &str) -> Result<StartStoryResponse, ApiError> {
        let body = serde_json::json!({ "title": title });
        let builder = self.request(Method::POST, &["stories", "start_story"])?;
        Self::send(builder.json(&body)).await
    }

    async fn add_sentence(
        &self,
        story_id: &StoryId,
        sentence: &str,
    ) -> Result<AddSentenceResponse, ApiError> {
        let body = serde_json::json!({ "sentence": sentence });
        let id = story_id.to_string();
        let builder = self.request(Method::POST, &["stories", &id, "add_sentence"])?;
        Self::send(builder.json(&body)).await
    }

    async fn complete_story(&self, story_id: &StoryId) -> Result<Value, ApiError> {
        let id = story_id.to_string();
        Self::send(self.request(Method::POST, &["stories", &id, "complete_story"])?).await
    }

    async fn story_progress(&self) -> Result<Value, ApiError> {
        Self::send(self.request(Method::GET, &["stories", "progress"])?).await
    }

    async fn list_stories(&self) -> Result<Value, ApiError> {
        Self::send(self.request(Method::GET, &["stories"])?).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Pull the server's `error` string out of a failure body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpStudyApi {
        HttpStudyApi::new(ApiConfig::new(base).unwrap())
    }

    #[test]
    fn endpoint_appends_segments_under_base_path() {
        assert_eq!(
            api("http://h/api/").endpoint(&["stories"]).unwrap().as_str(),
            "http://h/api/stories"
        );
        assert_eq!(
            api("http://h/api")
                .endpoint(&["stories", "st1", "add_sentence"])
                .unwrap()
                .as_str(),
            "http://h/api/stories/st1/add_sentence"
        );
        assert_eq!(
            api("http://h").endpoint(&["stories"]).unwrap().as_str(),
            "http://h/stories"
        );
    }

    #[test]
    fn endpoint_encodes_reserved_characters_in_ids() {
        let url = api("http://h/api")
            .endpoint(&["stories", "a/b?c#d", "complete_story"])
            .unwrap();
        assert_eq!(url.path(), "/api/stories/a%2Fb%3Fc%23d/complete_story");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn error_message_reads_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Title already used"}"#).as_deref(),
            Some("Title already used")
        );
    }

    #[test]
    fn error_message_ignores_other_bodies() {
        assert!(error_message("<html>502</html>").is_none());
        assert!(error_message(r#"{"detail": "nope"}"#).is_none());
        assert!(error_message(r#"{"error": "  "}"#).is_none());
        assert!(error_message(r#"{"error": null}"#).is_none());
    }
}
