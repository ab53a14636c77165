// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::{
    check_relative, CreationError, DirEntry, EntryKind, Error, Factory as IStorageFactory,
    Metadata, Storage as IStorage, TypeInfo, DEFAULT_RETRIES, DEFAULT_TIMEOUT,
};
use crate::settings::PartialSettings;
use crate::tools;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Method, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
    time::Duration,
};
use url::Url;

pub static STORAGE_TYPE: LazyLock<TypeInfo> = LazyLock::new(|| TypeInfo {
    name: "webdav",
    description: "Reads the archive from a WebDAV server, e.g. an OwnCloud instance.",
});

static PROPFIND: LazyLock<Method> = LazyLock::new(|| {
    Method::from_bytes(b"PROPFIND").expect("PROPFIND is a valid HTTP method token")
});

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getcontentlength/>
    <d:getlastmodified/>
  </d:prop>
</d:propfind>"#;

const DAV_NS: &str = "DAV:";
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// URL of the directory containing the collection folders,
    /// e.g. `https://cloud.example.org/remote.php/webdav/IIIF_Files/`.
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    /// Number of retries for a single request
    retries: Option<u32>,
    /// Request timeout in milliseconds (ms)
    timeout: Option<u64>,
    requests_per_second: Option<u32>,
}

pub struct StorageFactory;

impl IStorageFactory for StorageFactory {
    fn info(&self) -> &'static TypeInfo {
        &STORAGE_TYPE
    }

    fn create(
        &self,
        config_all: Arc<PartialSettings>,
        config_storage: Value,
    ) -> Result<Box<dyn IStorage>, CreationError> {
        let type_name = || STORAGE_TYPE.name.to_string();
        let config: Config = serde_json::from_value(config_storage)
            .map_err(|err| CreationError::InvalidConfig(type_name(), err))?;
        let mut base_url =
            Url::parse(&config.base_url).map_err(|err| CreationError::InvalidUrl(type_name(), err))?;
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }
        let timeout = config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let headers = tools::create_headers(&config_all.user_agent)
            .map_err(|err| CreationError::Header(type_name(), err))?;
        let client = tools::create_downloader(
            config.retries.unwrap_or(DEFAULT_RETRIES),
            timeout,
            Some(headers),
        )
        .map_err(|err| CreationError::Client(type_name(), err))?;
        let requests_per_second = NonZeroU32::new(
            config
                .requests_per_second
                .unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
        )
        .unwrap_or(NonZeroU32::MIN);
        Ok(Box::new(Storage {
            client,
            base_url,
            credentials: config.username.map(|user| (user, config.password)),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(requests_per_second))),
            timeout: Duration::from_millis(timeout),
        }))
    }
}

pub struct Storage {
    client: ClientWithMiddleware,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    timeout: Duration,
}

/// One `<d:response>` of a `PROPFIND` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropEntry {
    /// The path part of the `href`, percent-decoded
    pub href: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl PropEntry {
    /// The last path segment of the `href`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    fn to_metadata(&self) -> Metadata {
        Metadata {
            kind: self.kind,
            size: self.size,
            modified: self.modified,
        }
    }
}

fn dav_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|child| {
        child.is_element()
            && child.tag_name().name() == name
            && child.tag_name().namespace() == Some(DAV_NS)
    })
}

fn href_path(href: &str) -> String {
    let path = Url::parse(href).map_or_else(|_| href.to_string(), |url| url.path().to_string());
    tools::url_decode(&path).into_owned()
}

/// Parses a WebDAV `multistatus` document into its entries.
///
/// # Errors
///
/// If the body is not well-formed XML or not a `multistatus` document.
pub fn parse_multistatus(body: &str) -> Result<Vec<PropEntry>, String> {
    let doc = roxmltree::Document::parse(body).map_err(|err| err.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "multistatus" || root.tag_name().namespace() != Some(DAV_NS) {
        return Err(format!(
            "expected a DAV: multistatus document, got <{}>",
            root.tag_name().name()
        ));
    }
    let mut entries = Vec::new();
    for response in root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "response")
    {
        let Some(href) = dav_child(response, "href").and_then(|node| node.text()) else {
            tracing::warn!("Skipping WebDAV response without href");
            continue;
        };
        let mut kind = EntryKind::File;
        let mut size = 0;
        let mut modified = None;
        for propstat in response
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "propstat")
        {
            let ok = dav_child(propstat, "status")
                .and_then(|node| node.text())
                .is_none_or(|status| status.contains(" 200 "));
            let Some(prop) = dav_child(propstat, "prop").filter(|_| ok) else {
                continue;
            };
            if let Some(resource_type) = dav_child(prop, "resourcetype") {
                if dav_child(resource_type, "collection").is_some() {
                    kind = EntryKind::Directory;
                }
            }
            if let Some(length) = dav_child(prop, "getcontentlength").and_then(|node| node.text()) {
                size = length.trim().parse().unwrap_or_default();
            }
            if let Some(last_modified) =
                dav_child(prop, "getlastmodified").and_then(|node| node.text())
            {
                modified = DateTime::parse_from_rfc2822(last_modified.trim())
                    .ok()
                    .map(|stamp| stamp.with_timezone(&Utc));
            }
        }
        if kind == EntryKind::Directory {
            size = 0;
        }
        entries.push(PropEntry {
            href: href_path(href.trim()),
            kind,
            size,
            modified,
        });
    }
    Ok(entries)
}

impl Storage {
    fn url_for(&self, path: &Path, directory: bool) -> Result<Url, Error> {
        check_relative(path)?;
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                Error::InvalidResponse(
                    path.to_path_buf(),
                    "base URL cannot hold a path".to_string(),
                )
            })?;
            segments.pop_if_empty();
            for part in path.iter() {
                let part = part.to_str().ok_or_else(|| Error::OutsideRoot(path.to_path_buf()))?;
                if part != "." {
                    segments.push(part);
                }
            }
            if directory {
                segments.push("");
            }
        }
        Ok(url)
    }

    fn map_send_error(&self, path: &Path, err: reqwest_middleware::Error) -> Error {
        if tools::is_timeout(&err) {
            Error::Timeout(path.to_path_buf(), self.timeout)
        } else {
            Error::Http(path.to_path_buf(), err)
        }
    }

    async fn send(
        &self,
        path: &Path,
        method: Method,
        url: Url,
        depth: Option<&'static str>,
    ) -> Result<reqwest::Response, Error> {
        self.rate_limiter.until_ready().await;
        let mut request = self.client.request(method, url);
        if let Some(depth) = depth {
            request = request
                .header("Depth", depth)
                .header(reqwest::header::CONTENT_TYPE, "application/xml")
                .body(PROPFIND_BODY);
        }
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }
        let response = request
            .send()
            .await
            .map_err(|err| self.map_send_error(path, err))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound(path.to_path_buf())),
            status if status.is_success() => Ok(response),
            status => Err(Error::Status(path.to_path_buf(), status)),
        }
    }

    async fn propfind(&self, path: &Path, depth: &'static str) -> Result<Vec<PropEntry>, Error> {
        let url = self.url_for(path, depth == "1")?;
        let response = self.send(path, PROPFIND.clone(), url, Some(depth)).await?;
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                Error::Timeout(path.to_path_buf(), self.timeout)
            } else {
                Error::Http(path.to_path_buf(), err.into())
            }
        })?;
        parse_multistatus(&body).map_err(|msg| Error::InvalidResponse(path.to_path_buf(), msg))
    }
}

#[async_trait]
impl IStorage for Storage {
    fn info(&self) -> &'static TypeInfo {
        &STORAGE_TYPE
    }

    fn root(&self) -> String {
        self.base_url.to_string()
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, Error> {
        tracing::trace!("list_directory - '{}' ...", path.display());
        let own_path = href_path(self.url_for(path, true)?.path());
        let own_path = own_path.trim_end_matches('/');
        Ok(self
            .propfind(path, "1")
            .await?
            .into_iter()
            .filter(|entry| entry.href.trim_end_matches('/') != own_path)
            .map(|entry| DirEntry {
                name: entry.name().to_string(),
                kind: entry.kind,
            })
            .collect())
    }

    async fn open_for_read(&self, path: &Path) -> Result<Vec<u8>, Error> {
        tracing::trace!("open_for_read - '{}' ...", path.display());
        let url = self.url_for(path, false)?;
        let response = self.send(path, Method::GET, url, None).await?;
        let bytes = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                Error::Timeout(path.to_path_buf(), self.timeout)
            } else {
                Error::Http(path.to_path_buf(), err.into())
            }
        })?;
        Ok(bytes.to_vec())
    }

    async fn stat(&self, path: &Path) -> Result<Metadata, Error> {
        let entries = self.propfind(path, "0").await?;
        entries.first().map(PropEntry::to_metadata).ok_or_else(|| {
            Error::InvalidResponse(PathBuf::from(path), "empty multistatus".to_string())
        })
    }
}
