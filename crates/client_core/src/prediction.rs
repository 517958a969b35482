use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{PredictRequest, PredictResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    discovery::{self, ServiceLinks},
    error::RequestFailed,
};

pub const DEFAULT_PREDICT_URL: &str = "http://localhost:8080/predict";

/// Classification returned for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub confidence: f64,
    pub summary: String,
}

impl From<PredictResponse> for Prediction {
    fn from(value: PredictResponse) -> Self {
        Self {
            confidence: value.confidence,
            summary: value.result,
        }
    }
}

/// Remote prediction endpoint. Create and update both go through `predict`;
/// the service does not distinguish them.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, words: &str) -> Result<Prediction, RequestFailed>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: Client,
    predict_url: Url,
}

impl HttpPredictionClient {
    pub fn new(predict_url: &str) -> Result<Self, RequestFailed> {
        Self::with_client(Client::new(), predict_url)
    }

    pub fn with_client(http: Client, predict_url: &str) -> Result<Self, RequestFailed> {
        Ok(Self {
            http,
            predict_url: parse_url(predict_url)?,
        })
    }

    /// Builds a client from the `Link` headers advertised at `root_url`.
    pub async fn discover(root_url: &str) -> Result<(Self, ServiceLinks), RequestFailed> {
        let http = Client::new();
        let links = discovery::discover(&http, root_url).await?;
        let predict = links.predict.clone().ok_or_else(|| RequestFailed::InvalidUrl {
            url: root_url.to_string(),
            reason: "service root advertises no prediction link".to_string(),
        })?;
        Ok((
            Self {
                http,
                predict_url: predict,
            },
            links,
        ))
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// Liveness probe against `/ping` at the service root.
    pub async fn ping(&self) -> Result<(), RequestFailed> {
        let url = self
            .predict_url
            .join("/ping")
            .map_err(|err| RequestFailed::InvalidUrl {
                url: self.predict_url.to_string(),
                reason: err.to_string(),
            })?;
        let response = self.http.get(url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// Same prediction, requested as `GET <predict_url>/<words>`.
    pub async fn predict_via_path(&self, words: &str) -> Result<Prediction, RequestFailed> {
        let mut url = self.predict_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestFailed::InvalidUrl {
                url: self.predict_url.to_string(),
                reason: "url cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .push(words);
        let response = self.http.get(url).send().await?;
        decode_prediction(check_status(response).await?).await
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, words: &str) -> Result<Prediction, RequestFailed> {
        debug!(url = %self.predict_url, chars = words.chars().count(), "posting prediction request");
        let response = self
            .http
            .post(self.predict_url.clone())
            .json(&PredictRequest::new(words))
            .send()
            .await?;
        decode_prediction(check_status(response).await?).await
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, RequestFailed> {
    Url::parse(raw.trim()).map_err(|err| RequestFailed::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })
}

pub(crate) async fn check_status(response: Response) -> Result<Response, RequestFailed> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiError>(&body).ok();
    let message = api_error
        .as_ref()
        .and_then(ApiError::describe)
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "no details".to_string());
    warn!(status = status.as_u16(), %message, "prediction service rejected request");
    Err(RequestFailed::Status {
        status: status.as_u16(),
        code: ErrorCode::from_status(status.as_u16()),
        message,
    })
}

async fn decode_prediction(response: Response) -> Result<Prediction, RequestFailed> {
    let bytes = response.bytes().await?;
    let body: PredictResponse = serde_json::from_slice(&bytes)
        .map_err(|err| RequestFailed::MalformedBody(err.to_string()))?;
    Ok(body.into())
}

#[cfg(test)]
#[path = "tests/prediction_tests.rs"]
mod tests;
