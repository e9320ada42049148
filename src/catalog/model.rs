use serde::Serialize;
use serde_json::{Map, Value};

use super::normalize::normalize_file_field;
use crate::feishu::RawRecord;

/// Upstream column names.
pub mod fields {
    pub const ASIN: &str = "ASIN";
    pub const LINK: &str = "链接";
    pub const TITLE: &str = "标题";
    pub const TITLE_TRANSLATION: &str = "标题翻译";
    pub const SELLING_POINTS: &str = "五行卖点";
    pub const SELLING_POINTS_TRANSLATION: &str = "五行卖点翻译";
    pub const PRODUCT_SHORT_NAME: &str = "产品简称";
    pub const PRODUCT_TYPE: &str = "产品类型";
    pub const PROMPT: &str = "提示词";
    pub const IMAGE: &str = "图片";
    pub const VIDEO: &str = "视频";
}

/// One catalog row.
///
/// `image` and `video` hold local proxy URLs (or are empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub record_id: String,
    pub asin: String,
    pub link: String,
    pub title: String,
    pub title_translation: String,
    pub selling_points: String,
    pub selling_points_translation: String,
    pub product_short_name: String,
    pub product_type: String,
    pub prompt: String,
    pub image: String,
    pub video: String,
}

impl Record {
    /// Map an upstream row onto the catalog attribute set.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Self {
        let f = &raw.fields;
        Self {
            record_id: raw.record_id.clone(),
            asin: text_field(f, fields::ASIN),
            link: text_field(f, fields::LINK),
            title: text_field(f, fields::TITLE),
            title_translation: text_field(f, fields::TITLE_TRANSLATION),
            selling_points: text_field(f, fields::SELLING_POINTS),
            selling_points_translation: text_field(f, fields::SELLING_POINTS_TRANSLATION),
            product_short_name: text_field(f, fields::PRODUCT_SHORT_NAME),
            product_type: text_field(f, fields::PRODUCT_TYPE),
            prompt: text_field(f, fields::PROMPT),
            image: normalize_file_field(f.get(fields::IMAGE)),
            video: normalize_file_field(f.get(fields::VIDEO)),
        }
    }

    /// Display name: the short name when set, otherwise the title.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.product_short_name.is_empty() {
            &self.title
        } else {
            &self.product_short_name
        }
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(coerce_text).unwrap_or_default()
}

/// Flatten a Bitable text-ish cell into a plain string.
///
/// Text cells can come back as a string, a number, a list of rich-text
/// segments or a hyperlink object. Anything else becomes empty.
pub(crate) fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(segments) => segments
            .iter()
            .map(|segment| match segment {
                Value::String(s) => s.as_str(),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str).unwrap_or(""),
                _ => "",
            })
            .collect(),
        Value::Object(obj) => obj
            .get("link")
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .or_else(|| obj.get("text").and_then(Value::as_str))
            .unwrap_or("")
            .to_string(),
        Value::Null => String::new(),
    }
}
