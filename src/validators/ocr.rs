// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Final check of an `mvol` issue:
//! asks the OCR retrieval service for the OCR of the whole issue,
//! which only works if all its pieces fit together.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use url::Url;

use super::Problem;
use crate::model::identifier::Identifier;
use crate::settings::OcrCheck;
use crate::tools;

pub const DEFAULT_BASE_URL: &str = "https://digcollretriever.lib.uchicago.edu";
/// Default request timeout in milliseconds (ms)
pub const DEFAULT_TIMEOUT: u64 = 60000;
pub const DEFAULT_RETRIES: u32 = 1;

const STATUS_QUERY: &str = "jpg_width=0&jpg_height=0&min_year=0&max_year=0";

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Invalid OCR service base URL '{0}': {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("The OCR service base URL '{0}' can not have path segments")]
    NotABase(String),
    #[error("Invalid HTTP header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Failed to build the HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrStatus {
    Ok,
    Failed,
    TimedOut,
}

/// Asks some service whether the OCR of an issue can be produced.
#[async_trait]
pub trait OcrStatusCheck: Send + Sync {
    async fn status(&self, identifier: &Identifier) -> OcrStatus;
}

/// Success means: status 200, and a body that is well-formed XML.
#[must_use]
pub fn classify(status: StatusCode, body: &[u8]) -> OcrStatus {
    let is_xml = std::str::from_utf8(body)
        .ok()
        .is_some_and(|text| roxmltree::Document::parse(text).is_ok());
    if status == StatusCode::OK && is_xml {
        OcrStatus::Ok
    } else {
        OcrStatus::Failed
    }
}

/// The digital collections retriever, queried over HTTP(S).
pub struct HttpOcrCheck {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl HttpOcrCheck {
    pub fn new(settings: &OcrCheck, user_agent: &str) -> Result<Self, SetupError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| SetupError::InvalidUrl(settings.base_url.clone(), err))?;
        if base_url.cannot_be_a_base() {
            return Err(SetupError::NotABase(settings.base_url.clone()));
        }
        let client = tools::create_downloader(
            settings.retries.unwrap_or(DEFAULT_RETRIES),
            settings.timeout.unwrap_or(DEFAULT_TIMEOUT),
            Some(tools::create_headers(user_agent)?),
        )?;
        Ok(Self { client, base_url })
    }

    /// e.g. `.../projects/mvol-0004-1930-0103/ocr?jpg_width=0&...`
    #[must_use]
    pub fn status_url(&self, identifier: &Identifier) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["projects", identifier.as_str(), "ocr"]);
        }
        url.set_query(Some(STATUS_QUERY));
        url
    }
}

#[async_trait]
impl OcrStatusCheck for HttpOcrCheck {
    async fn status(&self, identifier: &Identifier) -> OcrStatus {
        let url = self.status_url(identifier);
        tracing::debug!("{identifier}: OCR status check at '{url}' ...");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) if tools::is_timeout(&err) => return OcrStatus::TimedOut,
            Err(err) => {
                tracing::warn!("{identifier}: OCR status request failed: {err}");
                return OcrStatus::Failed;
            }
        };
        let status = response.status();
        match response.bytes().await {
            Ok(body) => classify(status, &body),
            Err(err) if err.is_timeout() => OcrStatus::TimedOut,
            Err(err) => {
                tracing::warn!("{identifier}: failed to read the OCR status response: {err}");
                OcrStatus::Failed
            }
        }
    }
}

/// Runs the final check for `identifier`.
pub async fn validate(check: &dyn OcrStatusCheck, identifier: &Identifier) -> Vec<Problem> {
    let identifier_str = identifier.to_string();
    match check.status(identifier).await {
        OcrStatus::Ok => vec![],
        OcrStatus::Failed => vec![Problem::OcrFailure {
            identifier: identifier_str,
        }],
        OcrStatus::TimedOut => vec![Problem::OcrTimeout {
            identifier: identifier_str,
        }],
    }
}
