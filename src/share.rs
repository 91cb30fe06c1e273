//! Social share links for post pages.

use url::Url;

use crate::post::Post;
use crate::routes::POSTS_PREFIX;
use crate::slug::{derive_slug, Slug};

/// A share-intent link for a single post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLink {
    /// The complete intent URL, query string included.
    pub url: Url,

    /// The text posted along with the link.
    pub text: String,

    /// The post's page, without a scheme: `{host}/blogs/{slug}`.
    pub target: String,

    pub slug: Slug,

    pub hashtags: Vec<String>,
}

impl ShareLink {
    /// Builds the intent link for `post`:
    /// `{intent}?text={title} by {author}&url={host}/blogs/{slug}&hashtags={tags}`.
    /// The `by` suffix is left out when `author` is empty. Hashtags are the
    /// post's tags joined with commas.
    pub fn new(intent: &Url, site_root: &Url, author: &str, post: &Post) -> ShareLink {
        let slug = derive_slug(&post.title);
        let text = match author.trim() {
            "" => post.title.clone(),
            author => format!("{} by {}", post.title, author),
        };
        let target = format!("{}/{}/{}", host_and_path(site_root), POSTS_PREFIX, slug);
        let hashtags = post.tags.clone();

        let mut url = intent.clone();
        url.query_pairs_mut()
            .append_pair("text", &text)
            .append_pair("url", &target)
            .append_pair("hashtags", &hashtags.join(","));

        ShareLink {
            url,
            text,
            target,
            slug,
            hashtags,
        }
    }
}

/// `https://example.com/blog/` becomes `example.com/blog`.
fn host_and_path(root: &Url) -> String {
    let mut s = root.host_str().unwrap_or_default().to_owned();
    if let Some(port) = root.port() {
        s.push_str(&format!(":{}", port));
    }
    s.push_str(root.path().trim_end_matches('/'));
    s
}
