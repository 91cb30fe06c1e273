//! Converts post bodies to HTML.
//!
//! The body is parsed into [`pulldown_cmark`] events, adjacent text is merged,
//! headings are given anchor ids ([`crate::heading::annotate`]), and `{Key}`
//! expressions in prose are replaced with values from the post's metadata
//! ([`Scope`]). Code spans, code blocks and raw HTML are never interpolated.

use std::collections::BTreeMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};

use crate::heading::{annotate, heading_texts, Heading};
use crate::post::Post;

/// The parser options shared by the serializer and the heading extractor.
/// Anchors only match when both see the same event stream.
pub(crate) fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// A post body rendered to HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    html: String,
    headings: Vec<Heading>,
}

impl RenderedDocument {
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The headings as they were anchored in [`RenderedDocument::html`].
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// The values available to `{Key}` expressions in a post body.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    values: BTreeMap<String, String>,
}

impl Scope {
    /// Builds the scope from a post's frontmatter. Keys use the frontmatter
    /// spelling (`Title`, `Abstract`, `Tags`, `HeaderImage`, `isPublished`,
    /// `Id`). Extra keys with scalar values are included as well.
    pub fn of(post: &Post) -> Scope {
        let mut values = BTreeMap::new();
        for (key, value) in &post.extra {
            let rendered = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            values.insert(key.clone(), rendered);
        }
        values.insert("Title".to_owned(), post.title.clone());
        values.insert("Abstract".to_owned(), post.summary.clone());
        values.insert("Tags".to_owned(), post.tags_text());
        values.insert("HeaderImage".to_owned(), post.header_image.clone());
        values.insert("isPublished".to_owned(), post.published.to_string());
        values.insert("Id".to_owned(), post.id.to_string());
        Scope { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Renders `content` to HTML, resolving `{Key}` expressions against the
/// metadata of `post`.
pub fn serialize(content: &str, post: &Post) -> Result<RenderedDocument> {
    serialize_with(content, &Scope::of(post))
}

/// Renders `content` to HTML, resolving `{Key}` expressions against `scope`.
pub fn serialize_with(content: &str, scope: &Scope) -> Result<RenderedDocument> {
    let mut events: Vec<Event> =
        TextMergeStream::new(Parser::new_ext(content, options())).collect();

    // Anchors are computed from the source text, before interpolation, so
    // they agree with `extract_headings`.
    let mut headings = annotate(&mut events);

    let mut code_depth = 0usize;
    let mut converted = Vec::with_capacity(events.len());
    for ev in events {
        converted.push(match ev {
            Event::Start(Tag::CodeBlock(kind)) => {
                code_depth += 1;
                Event::Start(Tag::CodeBlock(kind))
            }
            Event::End(TagEnd::CodeBlock) => {
                code_depth = code_depth.saturating_sub(1);
                Event::End(TagEnd::CodeBlock)
            }
            Event::Text(text) if code_depth == 0 => Event::Text(interpolate(text, scope)?),
            ev => ev,
        });
    }

    // The table of contents shows headings as rendered.
    for (heading, text) in headings.iter_mut().zip(heading_texts(&converted)) {
        heading.text = text;
    }

    let mut html = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html, converted.into_iter());
    Ok(RenderedDocument { html, headings })
}

/// Replaces every `{Key}` in `text` with its value from `scope`. Whitespace
/// inside the braces is ignored. A lone `}` is left alone.
fn interpolate<'a>(text: CowStr<'a>, scope: &Scope) -> Result<CowStr<'a>> {
    if !text.contains('{') {
        return Ok(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest: &str = &text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| Error::UnterminatedExpression {
            near: excerpt(&rest[open..]),
        })?;
        let expr = after[..close].trim();
        if !is_identifier(expr) {
            return Err(Error::InvalidExpression {
                expression: after[..close].to_owned(),
            });
        }
        let value = scope.get(expr).ok_or_else(|| Error::UnknownIdentifier {
            name: expr.to_owned(),
        })?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(CowStr::from(out))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn excerpt(s: &str) -> String {
    s.chars().take(24).collect()
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed post body.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Returned when a `{` has no matching `}` in the same run of text.
    #[error("unterminated expression near `{near}`")]
    UnterminatedExpression { near: String },

    /// Returned when the text between braces isn't a plain identifier.
    #[error("invalid expression `{{{expression}}}`: only identifiers are supported")]
    InvalidExpression { expression: String },

    /// Returned when an identifier isn't in the post's scope.
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String },
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::heading::extract_headings;

    fn post() -> Post {
        Post::parse(
            Path::new("p.md"),
            "---\nTitle: My Post\nAbstract: About things\nTags: tech go\nId: 3\nAuthor: Sam\n---\n",
        )
        .unwrap()
    }

    #[test]
    fn test_serialize_basic() -> Result<()> {
        let doc = serialize("Hello *world*.", &post())?;
        assert_eq!(doc.html(), "<p>Hello <em>world</em>.</p>\n");
        Ok(())
    }

    #[test]
    fn test_heading_ids() -> Result<()> {
        let content = "## Getting Started\n\nSome text.\n";
        let doc = serialize(content, &post())?;
        assert!(
            doc.html().contains(r#"<h2 id="getting-started">Getting Started</h2>"#),
            "{}",
            doc.html()
        );
        assert_eq!(doc.headings()[0].anchor, "getting-started");
        Ok(())
    }

    #[test]
    fn test_heading_ids_match_extractor() -> Result<()> {
        let content = concat!(
            "# Intro\n\n## Intro\n\n## Setup {#install}\n\n",
            "### About {Title} here\n\n## `code` & more\n",
        );
        let doc = serialize(content, &post())?;
        let anchors = |headings: &[Heading]| -> Vec<String> {
            headings.iter().map(|h| h.anchor.clone()).collect()
        };
        assert_eq!(anchors(doc.headings()), anchors(&extract_headings(content)));
        for heading in doc.headings() {
            assert!(
                doc.html().contains(&format!(r#"id="{}""#, heading.anchor)),
                "missing anchor {} in {}",
                heading.anchor,
                doc.html()
            );
        }
        Ok(())
    }

    #[test]
    fn test_heading_text_is_interpolated() -> Result<()> {
        let doc = serialize("### About {Title} here\n\n## Using `{Id}`\n", &post())?;
        let texts: Vec<&str> = doc.headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["About My Post here", "Using {Id}"]);
        assert_eq!(doc.headings()[0].anchor, "about-title-here");
        assert!(doc.html().contains(r#"<h3 id="about-title-here">About My Post here</h3>"#));
        Ok(())
    }

    #[test]
    fn test_interpolation() -> Result<()> {
        let doc = serialize("This is {Title} by { Author }, id {Id}.", &post())?;
        assert_eq!(doc.html(), "<p>This is My Post by Sam, id 3.</p>\n");
        Ok(())
    }

    #[test]
    fn test_interpolated_values_are_escaped() -> Result<()> {
        let mut scope = Scope::default();
        scope.insert("Name", "<b>");
        let doc = serialize_with("Hi {Name}", &scope)?;
        assert_eq!(doc.html(), "<p>Hi &lt;b&gt;</p>\n");
        Ok(())
    }

    #[test]
    fn test_code_is_not_interpolated() -> Result<()> {
        let doc = serialize("`{Title}`\n\n```\nfn main() {}\n```\n", &post())?;
        assert!(doc.html().contains("<code>{Title}</code>"), "{}", doc.html());
        assert!(doc.html().contains("fn main() {}"), "{}", doc.html());
        Ok(())
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(
            serialize("{Nope}", &post()).unwrap_err(),
            Error::UnknownIdentifier {
                name: "Nope".to_owned()
            }
        );
    }

    #[test]
    fn test_unterminated_expression() {
        assert!(matches!(
            serialize("oops {Title", &post()),
            Err(Error::UnterminatedExpression { .. })
        ));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(matches!(
            serialize("{1 + 1}", &post()),
            Err(Error::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_stray_close_brace() -> Result<()> {
        let doc = serialize("a } b", &post())?;
        assert_eq!(doc.html(), "<p>a } b</p>\n");
        Ok(())
    }
}
