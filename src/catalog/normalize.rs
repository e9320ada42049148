//! File-reference normalization.
//!
//! Bitable attachment cells arrive in several shapes: missing, a bare URL
//! string, or a list of attachment objects carrying `url` and/or `tmp_url`.
//! Each shape is decoded once into [`FileReference`] and then turned into a
//! local proxy URL, so pages never link to upstream files directly (those
//! require a bearer token the browser does not have).

use serde_json::Value;

use crate::constants::PROXY_FILE_PATH;

/// One attachment object from a file cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileObject {
    pub url: Option<String>,
    pub tmp_url: Option<String>,
}

/// Decoded shape of a file cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    Absent,
    PlainUrl(String),
    /// Attachment list. `None` entries were not objects.
    ObjectList(Vec<Option<FileObject>>),
}

impl FileReference {
    /// Decode a raw cell value. Unknown shapes decode to [`FileReference::Absent`].
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::PlainUrl(s.clone()),
            Some(Value::Array(items)) => Self::ObjectList(
                items
                    .iter()
                    .take(1)
                    .map(|item| {
                        item.as_object().map(|obj| FileObject {
                            url: string_field(obj.get("url")),
                            tmp_url: string_field(obj.get("tmp_url")),
                        })
                    })
                    .collect(),
            ),
            _ => Self::Absent,
        }
    }

    /// The original upstream URL this reference points at, if any.
    ///
    /// Only the first attachment of a list is considered; its `url` wins over
    /// `tmp_url`.
    #[must_use]
    pub fn original_url(&self) -> Option<&str> {
        let url = match self {
            Self::Absent => None,
            Self::PlainUrl(url) => Some(url.as_str()),
            Self::ObjectList(items) => items.first().and_then(Option::as_ref).and_then(|obj| {
                obj.url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .or(obj.tmp_url.as_deref())
            }),
        };
        url.filter(|u| !u.is_empty())
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Build the local proxy URL for an original upstream URL.
#[must_use]
pub fn proxy_url(original: &str) -> String {
    format!("{PROXY_FILE_PATH}?url={}", urlencoding::encode(original))
}

/// Recover the original upstream URL from a proxy URL built by [`proxy_url`].
#[must_use]
pub fn original_from_proxy_url(proxy: &str) -> Option<String> {
    let parsed = url::Url::parse("http://localhost")
        .and_then(|base| base.join(proxy))
        .ok()?;
    if parsed.path() != PROXY_FILE_PATH {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}

/// Normalize a raw file cell into a proxy URL, or an empty string when the
/// cell holds no usable URL.
#[must_use]
pub fn normalize_file_field(value: Option<&Value>) -> String {
    FileReference::from_value(value)
        .original_url()
        .map(proxy_url)
        .unwrap_or_default()
}
