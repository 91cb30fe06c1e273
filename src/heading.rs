//! Heading extraction and anchor ids.
//!
//! Anchor ids are assigned in a single pass ([`annotate`]) over the parsed
//! markdown events. Both [`extract_headings`] and
//! [`crate::markdown::serialize`] run that pass over the same event stream,
//! so the table of contents always links to ids that exist in the rendered
//! document.

use std::collections::HashMap;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Parser, Tag, TagEnd, TextMergeStream};

use crate::markdown::options;

/// A heading in a post body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// 1 through 6.
    pub level: u8,

    /// The heading's source text with inline markup stripped.
    pub text: String,

    /// The `id` attribute the heading carries in the rendered document.
    pub anchor: String,
}

/// Extracts headings from `content` in document order.
pub fn extract_headings(content: &str) -> Vec<Heading> {
    let mut events: Vec<Event> =
        TextMergeStream::new(Parser::new_ext(content, options())).collect();
    annotate(&mut events)
}

/// Assigns an anchor id to every heading start tag in `events` and returns
/// the headings found. An explicit `{#id}` attribute is kept as is; other
/// headings get [`anchor_slug`] of their text. Repeated anchors receive `-1`,
/// `-2`, ... suffixes in document order, skipping any suffix already taken.
pub(crate) fn annotate(events: &mut [Event<'_>]) -> Vec<Heading> {
    enum Step {
        Open(usize),
        Text(String),
        Close(u8),
        Skip,
    }

    let mut slugger = AnchorSlugger::default();
    let mut headings = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for i in 0..events.len() {
        let step = match &events[i] {
            Event::Start(Tag::Heading { .. }) => Step::Open(i),
            Event::Text(text) | Event::Code(text) => Step::Text(text.to_string()),
            Event::End(TagEnd::Heading(level)) => Step::Close(level_number(*level)),
            _ => Step::Skip,
        };

        match step {
            Step::Open(start) => open = Some((start, String::new())),
            Step::Text(text) => {
                if let Some((_, buffer)) = open.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Step::Close(level) => {
                let Some((start, text)) = open.take() else {
                    continue;
                };
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
                    let anchor = match id.as_deref() {
                        Some(custom) => slugger.claim(custom),
                        None => slugger.anchor_for(&text),
                    };
                    *id = Some(CowStr::from(anchor.clone()));
                    headings.push(Heading {
                        level,
                        text: text.trim().to_owned(),
                        anchor,
                    });
                }
            }
            Step::Skip => {}
        }
    }

    headings
}

/// Hands out unique anchors within a single document. A suffixed anchor is
/// itself claimed, so a later heading whose text happens to produce it gets
/// a further suffix instead of a duplicate id.
#[derive(Default)]
struct AnchorSlugger {
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    fn anchor_for(&mut self, text: &str) -> String {
        match anchor_slug(text) {
            base if base.is_empty() => self.claim(FALLBACK_ANCHOR),
            base => self.claim(&base),
        }
    }

    fn claim(&mut self, base: &str) -> String {
        let mut anchor = base.to_owned();
        while self.occurrences.contains_key(&anchor) {
            let count = self.occurrences.entry(base.to_owned()).or_default();
            *count += 1;
            anchor = format!("{base}-{count}");
        }
        self.occurrences.insert(anchor.clone(), 0);
        anchor
    }
}

/// The anchor base for headings with no alphanumeric text.
const FALLBACK_ANCHOR: &str = "section";

/// Converts heading text into an anchor: lowercase ASCII alphanumerics, with
/// every run of other characters collapsed into a single `-`.
pub fn anchor_slug(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    result
}

/// The text of every heading in `events`, in document order. Unlike
/// [`annotate`] this reads whatever the events hold, so run over interpolated
/// events it yields the text as rendered.
pub(crate) fn heading_texts(events: &[Event<'_>]) -> Vec<String> {
    let mut texts = Vec::new();
    let mut open: Option<String> = None;
    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => open = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = open.as_mut() {
                    buffer.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(buffer) = open.take() {
                    texts.push(buffer.trim().to_owned());
                }
            }
            _ => {}
        }
    }
    texts
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn anchors(content: &str) -> Vec<String> {
        extract_headings(content).into_iter().map(|h| h.anchor).collect()
    }

    #[test]
    fn test_extract_headings() {
        let headings =
            extract_headings("# Intro\n\ntext\n\n## Getting Started\n\n### Step `one`\n");
        assert_eq!(
            headings,
            vec![
                Heading {
                    level: 1,
                    text: "Intro".to_owned(),
                    anchor: "intro".to_owned(),
                },
                Heading {
                    level: 2,
                    text: "Getting Started".to_owned(),
                    anchor: "getting-started".to_owned(),
                },
                Heading {
                    level: 3,
                    text: "Step one".to_owned(),
                    anchor: "step-one".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_custom_id() {
        assert_eq!(anchors("## Setup {#install}\n"), vec!["install"]);
        assert_eq!(extract_headings("## Setup {#install}\n")[0].text, "Setup");
    }

    #[test]
    fn test_duplicate_anchors() {
        assert_eq!(anchors("## FAQ\n\n## FAQ\n\n## FAQ\n"), vec!["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_suffix_collides_with_heading_text() {
        assert_eq!(
            anchors("## FAQ\n\n## FAQ\n\n## FAQ 1\n"),
            vec!["faq", "faq-1", "faq-1-1"]
        );
    }

    #[test]
    fn test_suffix_collides_with_custom_id() {
        assert_eq!(
            anchors("## Setup {#setup-1}\n\n## Setup\n\n## Setup\n"),
            vec!["setup-1", "setup", "setup-2"]
        );
    }

    #[test]
    fn test_punctuation_only_heading() {
        assert_eq!(anchors("## !!!\n\n## ???\n"), vec!["section", "section-1"]);
    }

    #[test]
    fn test_setext_and_emphasis() {
        assert_eq!(anchors("Big *Idea*\n==========\n"), vec!["big-idea"]);
    }

    #[test]
    fn test_ignores_code_blocks() {
        assert!(extract_headings("```\n# not a heading\n```\n").is_empty());
    }

    #[test]
    fn test_anchor_slug() {
        assert_eq!(anchor_slug("Getting Started"), "getting-started");
        assert_eq!(anchor_slug("What's New?"), "whats-new");
        assert_eq!(anchor_slug("  snake_case  and-kebab "), "snake-case-and-kebab");
        assert_eq!(anchor_slug("Ünïcode Title"), "ünïcode-title");
    }
}
