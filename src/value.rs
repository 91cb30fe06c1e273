//! Conversions from the page model into [`Value`]s for templating.

use std::collections::HashMap;

use gtmpl::Value;
use url::Url;

use crate::heading::Heading;
use crate::share::ShareLink;

/// Builds a [`Value::Object`] from `(key, value)` pairs.
pub(crate) fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<HashMap<String, Value>>(),
    )
}

pub(crate) fn string(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

pub(crate) fn url(url: &Url) -> Value {
    Value::String(url.to_string())
}

pub(crate) fn optional_url(opt: Option<&Url>) -> Value {
    match opt {
        Some(u) => url(u),
        None => Value::Nil,
    }
}

impl From<&Heading> for Value {
    fn from(h: &Heading) -> Value {
        object([
            ("level", string(h.level.to_string())),
            ("text", string(&h.text)),
            ("anchor", string(&h.anchor)),
        ])
    }
}

impl From<&ShareLink> for Value {
    fn from(link: &ShareLink) -> Value {
        object([
            ("url", url(&link.url)),
            ("text", string(&link.text)),
            ("target", string(&link.target)),
            (
                "hashtags",
                Value::Array(link.hashtags.iter().map(string).collect()),
            ),
        ])
    }
}
