use crate::error::FetchError;
use lazy_static::lazy_static;
use log::*;
use regex::Regex;
use std::{fs::File, io::Read, time::Duration};
use url::Url;

pub(crate) const HTTP_CONNECT_TIMEOUT: u64 = 30_000;
const HTTP_READ_TIMEOUT: u64 = 10_000;
const USER_AGENT: &str = concat!("hget/", env!("CARGO_PKG_VERSION"));

/// An open download source: where the bytes come from, how many to expect and what the content
/// calls itself.
pub(crate) struct Source {
    pub length: Option<u64>,
    pub filename: Option<String>,
    pub reader: Box<dyn Read>,
}

/// Opens the source the URL points to.
///
/// When downloading over HTTP, the server's response may use chunked transfer encoding in which
/// case the length cannot be determined ahead of time. Local `file` sources always have a
/// length.
pub(crate) fn open(
    url: &Url,
    connect_timeout: u64,
    user_agent: Option<&str>,
) -> Result<Source, FetchError> {
    match url.scheme() {
        "http" | "https" => {
            let agent = ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_millis(connect_timeout))
                .timeout_read(Duration::from_millis(HTTP_READ_TIMEOUT))
                .user_agent(user_agent.unwrap_or(USER_AGENT))
                .build();

            let resp: ureq::Response = match agent.get(url.as_str()).call() {
                Ok(resp) => resp,
                Err(ureq::Error::Status(code, resp)) => {
                    return Err(FetchError::RequestFailed(code, resp.into_string()?));
                }
                Err(e) => return Err(e.into()),
            };

            // the header names may or may not be lowercased
            let length = resp
                .header("Content-Length")
                .or_else(|| resp.header("content-length"))
                .map(str::parse::<u64>)
                .transpose()?;

            if let Some(length) = length {
                debug!("Got response status {} with length {}", resp.status(), length);
            } else {
                debug!(
                    "Got response status {} with indeterminate length",
                    resp.status()
                );
            }

            let filename = resp
                .header("Content-Disposition")
                .or_else(|| resp.header("content-disposition"))
                .and_then(disposition_filename)
                .or_else(|| url_filename(url));

            Ok(Source {
                length,
                filename,
                reader: Box::new(resp.into_reader()) as Box<dyn Read>,
            })
        }
        "file" => {
            let path = match url.to_file_path() {
                Ok(path) => path,
                Err(()) => return Err(FetchError::InvalidFilePath(url.as_str().to_string())),
            };

            let file = File::open(&path)?;
            let meta = file.metadata()?;
            debug!("Opened {} with length {}", path.display(), meta.len());

            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());

            Ok(Source {
                length: Some(meta.len()),
                filename,
                reader: Box::new(file) as Box<dyn Read>,
            })
        }
        scheme => Err(FetchError::UnsupportedUrlScheme(scheme.to_string())),
    }
}

/// Extracts the file name a Content-Disposition header suggests, if it suggests a usable one.
fn disposition_filename(value: &str) -> Option<String> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r#"filename="?([^";]+)"?"#).unwrap();
    }

    let cap = RE.captures(value)?;
    let name = cap[1].trim();
    is_safe_filename(name).then(|| name.to_string())
}

/// Falls back to the last segment of the URL's path as the file name.
fn url_filename(url: &Url) -> Option<String> {
    let name = url.path_segments()?.last()?.trim();
    is_safe_filename(name).then(|| name.to_string())
}

/// A suggested name is only usable if it cannot point outside the directory the download lands
/// in.
fn is_safe_filename(name: &str) -> bool {
    const FORBIDDEN: &[char] = &['/', '\\', ':'];

    !name.is_empty() && name != "." && name != ".." && !name.contains(FORBIDDEN)
}
