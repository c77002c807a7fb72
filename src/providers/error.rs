// ABOUTME: Errors returned by external provider clients.
// ABOUTME: Distinguishes transport failures, structured API errors, and undecodable replies.

use reqwest::Response;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {code}: {description}")]
    Api {
        service: &'static str,
        code: String,
        description: String,
    },

    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn api(
        service: &'static str,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        ProviderError::Api {
            service,
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            ProviderError::Transport { service, .. }
            | ProviderError::Api { service, .. }
            | ProviderError::Decode { service, .. } => service,
        }
    }
}

pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |source| ProviderError::Transport { service, source }
}

/// Pass 2xx responses through; turn anything else into `ProviderError::Api`.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        service,
        code: status.as_u16().to_string(),
        description: error_description(&body),
    })
}

pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(service, response).await?;
    let body = response.text().await.map_err(transport(service))?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Providers report errors as `{"message": ..}` or `{"error": {"message": ..}}`.
fn error_description(body: &str) -> String {
    #[derive(Deserialize)]
    struct Nested {
        message: String,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorBody {
        Flat { message: String },
        Nested { error: Nested },
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Flat { message }) | Ok(ErrorBody::Nested { error: Nested { message } }) => {
            message
        }
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}
