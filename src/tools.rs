// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::borrow::Cow;
use std::time::Duration;

use const_format::concatcp;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use urlencoding::decode;

pub const DEFAULT_USER_AGENT: &str = concatcp!(
    clap::crate_name!(),
    "/",
    clap::crate_version!(),
    " github.com/uchicago-library/digcoll-validator"
);

/// Decodes a percent-encoded URL path segment,
/// e.g. from a WebDAV `href`;
/// returns the input as-is if it does not decode to valid UTF-8.
///
/// ```
/// # use digcoll_validator::tools::url_decode;
/// assert_eq!(url_decode("mvol%20x"), "mvol x");
/// ```
#[must_use]
pub fn url_decode(input: &str) -> Cow<str> {
    decode(input).unwrap_or(Cow::Borrowed(input))
}

/// Creates a default set of headers for requests.
pub fn create_headers(user_agent: &str) -> Result<header::HeaderMap, header::InvalidHeaderValue> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_str(user_agent)?);
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/xml, text/xml, */*"),
    );
    Ok(headers)
}

/// Creates a new [`reqwest::Client`] with the supplied retry and timeout settings.
/// @param retries Number of retries for a single request
/// @param timeout Total timeout per request in milliseconds (ms)
pub fn create_downloader(
    retries: u32,
    timeout: u64,
    headers: Option<header::HeaderMap>,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(retries);
    let mut client_builder = Client::builder().timeout(Duration::from_millis(timeout));
    if let Some(headers_val) = headers {
        client_builder = client_builder.default_headers(headers_val);
    }
    Ok(ClientBuilder::new(client_builder.build()?)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Whether a failed request failed because it took too long.
#[must_use]
pub fn is_timeout(err: &reqwest_middleware::Error) -> bool {
    match err {
        reqwest_middleware::Error::Reqwest(err) => err.is_timeout(),
        reqwest_middleware::Error::Middleware(err) => err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
            .any(reqwest::Error::is_timeout),
    }
}
