//! The page composers. Each page type gathers the data its template needs
//! and converts it into a [`Value`] via `to_value`. Navigation, footer,
//! share, like, and comment widgets are rendered by the theme; the composers
//! only hand them the data they're keyed on.

use gtmpl::Value;
use url::Url;

use crate::config::Site;
use crate::heading::Heading;
use crate::post::{Post, Topic};
use crate::props::PostProps;
use crate::routes::POSTS_PREFIX;
use crate::share::ShareLink;
use crate::slug::derive_slug;
use crate::value::{object, optional_url, string, url};

/// The URL path prefix under which topic pages live.
pub const TOPICS_PREFIX: &str = "topics";

/// The posts shown in listings: those with `published` set, in repository
/// order.
pub fn published(posts: &[Post]) -> Vec<&Post> {
    posts.iter().filter(|p| p.published).collect()
}

/// Appends an asset path such as `/images/a.png` to `host`. The host's own
/// path is kept, so `https://cdn.example.com/main/public` and `/a.png`
/// resolve to `https://cdn.example.com/main/public/a.png`. Returns `None` for
/// an empty path.
pub fn resolve_asset(host: &Url, path: &str) -> Option<Url> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Url::parse(&format!(
        "{}/{}",
        host.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
    .ok()
}

/// `site_root` with `segments` appended as a directory (trailing slash).
/// Segments are percent-encoded.
pub fn page_url(root: &Url, segments: &[&str]) -> Url {
    let mut page = root.clone();
    if let Ok(mut path) = page.path_segments_mut() {
        path.pop_if_empty().extend(segments).push("");
    }
    page
}

/// The `<head>` metadata of a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub image: Option<Url>,
    pub url: Url,
}

impl PageMeta {
    pub fn for_post(site: &Site, post: &Post) -> PageMeta {
        let slug = derive_slug(&post.title);
        PageMeta {
            title: post.title.clone(),
            description: post.summary.clone(),
            image: resolve_asset(&site.asset_host, &post.header_image),
            url: page_url(&site.site_root, &[POSTS_PREFIX, slug.as_str()]),
        }
    }

    fn to_value(&self) -> Value {
        object([
            ("title", string(&self.title)),
            ("description", string(&self.description)),
            ("image", optional_url(self.image.as_ref())),
            ("url", url(&self.url)),
        ])
    }
}

/// The navigation bar and footer.
#[derive(Clone, Copy)]
pub struct Chrome<'a> {
    pub site: &'a Site,
    pub topics: &'a [Topic],
    pub year: i32,
}

impl<'a> Chrome<'a> {
    pub fn new(site: &'a Site, topics: &'a [Topic], year: i32) -> Chrome<'a> {
        Chrome { site, topics, year }
    }

    fn topic_url(&self, topic: &Topic) -> Url {
        page_url(
            &self.site.site_root,
            &[TOPICS_PREFIX, topic.path_segment().as_str()],
        )
    }

    fn post_url(&self, post: &Post) -> Url {
        page_url(
            &self.site.site_root,
            &[POSTS_PREFIX, derive_slug(&post.title).as_str()],
        )
    }

    fn summary(&self, post: &Post) -> Value {
        object([
            ("id", string(post.id.to_string())),
            ("title", string(&post.title)),
            ("abstract", string(&post.summary)),
            ("url", url(&self.post_url(post))),
            (
                "header_image",
                optional_url(resolve_asset(&self.site.asset_host, &post.header_image).as_ref()),
            ),
            ("read_time", string(post.read_time.to_string())),
            ("tags", Value::Array(post.tags.iter().map(string).collect())),
        ])
    }

    fn to_value(&self) -> Value {
        object([
            ("title", string(&self.site.title)),
            ("description", string(&self.site.description)),
            ("home", url(&self.site.site_root)),
            ("author", string(&self.site.author)),
            ("year", string(self.year.to_string())),
            (
                "topics",
                Value::Array(
                    self.topics
                        .iter()
                        .map(|t| {
                            object([("name", string(&t.name)), ("url", url(&self.topic_url(t)))])
                        })
                        .collect(),
                ),
            ),
        ])
    }
}

/// The home page: every published post.
pub struct HomePage<'a> {
    pub chrome: Chrome<'a>,
    pub meta: PageMeta,
    pub posts: Vec<&'a Post>,
}

impl<'a> HomePage<'a> {
    pub fn compose(chrome: Chrome<'a>, posts: &'a [Post]) -> HomePage<'a> {
        let site = chrome.site;
        HomePage {
            meta: PageMeta {
                title: site.title.clone(),
                description: site.description.clone(),
                image: resolve_asset(&site.asset_host, &site.preview_image),
                url: site.site_root.clone(),
            },
            posts: published(posts),
            chrome,
        }
    }

    pub fn to_value(&self) -> Value {
        object([
            ("site", self.chrome.to_value()),
            ("meta", self.meta.to_value()),
            ("heading", string(&self.chrome.site.title)),
            ("posts", Value::Array(self.posts.iter().map(|p| self.chrome.summary(p)).collect())),
        ])
    }
}

/// A topic page: the published posts carrying one tag.
pub struct TopicPage<'a> {
    pub chrome: Chrome<'a>,
    pub meta: PageMeta,
    pub topic: &'a Topic,
    pub posts: Vec<&'a Post>,
}

impl<'a> TopicPage<'a> {
    pub fn compose(chrome: Chrome<'a>, topic: &'a Topic, posts: &'a [Post]) -> TopicPage<'a> {
        let site = chrome.site;
        TopicPage {
            meta: PageMeta {
                title: format!("{} | {}", topic.name, site.title),
                description: site.description.clone(),
                image: resolve_asset(&site.asset_host, &site.preview_image),
                url: chrome.topic_url(topic),
            },
            posts: published(posts).into_iter().filter(|p| p.has_tag(topic)).collect(),
            topic,
            chrome,
        }
    }

    pub fn to_value(&self) -> Value {
        object([
            ("site", self.chrome.to_value()),
            ("meta", self.meta.to_value()),
            ("heading", string(&self.topic.name)),
            ("posts", Value::Array(self.posts.iter().map(|p| self.chrome.summary(p)).collect())),
        ])
    }
}

/// A widget hosted by an external service and keyed by route id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Widget {
    pub id: String,
    pub endpoint: Option<Url>,
}

impl Widget {
    fn to_value(&self) -> Value {
        object([
            ("id", string(&self.id)),
            ("endpoint", optional_url(self.endpoint.as_ref())),
        ])
    }
}

/// A post page.
pub struct PostPage<'a> {
    pub chrome: Chrome<'a>,
    pub meta: PageMeta,
    pub props: PostProps<'a>,
    pub share: ShareLink,
    pub like: Widget,
    pub comments: Widget,
}

impl<'a> PostPage<'a> {
    pub fn compose(site: &'a Site, year: i32, props: PostProps<'a>) -> PostPage<'a> {
        let id = props.id.to_string();
        PostPage {
            chrome: Chrome::new(site, props.topics, year),
            meta: PageMeta::for_post(site, props.post),
            share: ShareLink::new(&site.share_intent, &site.site_root, &site.author, props.post),
            like: Widget {
                id: id.clone(),
                endpoint: site.likes_endpoint.clone(),
            },
            comments: Widget {
                id,
                endpoint: site.comments_endpoint.clone(),
            },
            props,
        }
    }

    pub fn headings(&self) -> &[Heading] {
        &self.props.headings
    }

    pub fn to_value(&self) -> Value {
        let post = self.props.post;
        object([
            ("site", self.chrome.to_value()),
            ("meta", self.meta.to_value()),
            ("id", string(self.props.id.as_str())),
            (
                "post",
                object([
                    ("id", string(post.id.to_string())),
                    ("title", string(&post.title)),
                    ("abstract", string(&post.summary)),
                    ("tags", Value::Array(post.tags.iter().map(string).collect())),
                    ("header_image", optional_url(self.meta.image.as_ref())),
                    ("read_time", string(post.read_time.to_string())),
                    ("published", Value::Bool(post.published)),
                ]),
            ),
            ("content", string(self.props.document.html())),
            ("headings", Value::Array(self.headings().iter().map(Value::from).collect())),
            ("share", Value::from(&self.share)),
            ("like", self.like.to_value()),
            ("comments", self.comments.to_value()),
        ])
    }
}

/// The page served for any path outside the route table.
pub struct NotFoundPage<'a> {
    pub chrome: Chrome<'a>,
}

impl NotFoundPage<'_> {
    pub fn to_value(&self) -> Value {
        let site = self.chrome.site;
        object([
            ("site", self.chrome.to_value()),
            (
                "meta",
                object([
                    ("title", string(format!("Not found | {}", site.title))),
                    ("description", string(&site.description)),
                    ("image", Value::Nil),
                    ("url", url(&site.site_root)),
                ]),
            ),
        ])
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::repository::Snapshot;
    use crate::routes::test::post;
    use crate::routes::RouteTable;

    pub(crate) fn site() -> Site {
        Site {
            title: "Test Blog".to_owned(),
            description: "Posts about things".to_owned(),
            site_root: Url::parse("https://blog.example.com/").unwrap(),
            asset_host: Url::parse("https://cdn.example.com/main/public").unwrap(),
            preview_image: "/preview.png".to_owned(),
            author: "@tester".to_owned(),
            share_intent: Url::parse("https://twitter.com/intent/tweet").unwrap(),
            likes_endpoint: Some(Url::parse("https://likes.example.com/api").unwrap()),
            comments_endpoint: None,
        }
    }

    fn field<'v>(value: &'v Value, key: &str) -> &'v Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("`{}` looked up on a non-object", key),
        }
    }

    fn text(value: &Value) -> Option<&str> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[test]
    fn test_published_only() {
        let posts = vec![post("A", true), post("B", false)];
        let titles: Vec<&str> = published(&posts).iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A"]);
    }

    #[test]
    fn test_resolve_asset() {
        let host = Url::parse("https://cdn.example.com/main/public").unwrap();
        assert_eq!(
            resolve_asset(&host, "/images/a.png").map(String::from),
            Some("https://cdn.example.com/main/public/images/a.png".to_owned())
        );
        assert_eq!(resolve_asset(&host, ""), None);
    }

    #[test]
    fn test_page_url() {
        let root = Url::parse("https://blog.example.com/").unwrap();
        assert_eq!(
            page_url(&root, &["blogs", "what's-new?"]).as_str(),
            "https://blog.example.com/blogs/what's-new%3F/"
        );
    }

    #[test]
    fn test_home_page() {
        let site = site();
        let posts = vec![post("A", true), post("B", false)];
        let topics = vec![Topic::new("rust")];
        let home = HomePage::compose(Chrome::new(&site, &topics, 2024), &posts);
        assert_eq!(home.posts.len(), 1);
        assert_eq!(
            home.meta.image.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/main/public/preview.png")
        );

        let value = home.to_value();
        match field(&value, "posts") {
            Value::Array(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(
                    text(field(&items[0], "url")),
                    Some("https://blog.example.com/blogs/a/")
                );
            }
            _ => panic!("posts is not an array"),
        }
        assert_eq!(text(field(field(&value, "site"), "year")), Some("2024"));
    }

    #[test]
    fn test_topic_page() {
        let site = site();
        let mut tagged = post("Tagged", true);
        tagged.tags = vec!["rust".to_owned()];
        let mut draft = post("Draft", false);
        draft.tags = vec!["rust".to_owned()];
        let posts = vec![tagged, draft, post("Other", true)];
        let topics = vec![Topic::new("rust")];
        let page = TopicPage::compose(Chrome::new(&site, &topics, 2024), &topics[0], &posts);
        let titles: Vec<&str> = page.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Tagged"]);
        assert_eq!(page.meta.url.as_str(), "https://blog.example.com/topics/rust/");
    }

    #[test]
    fn test_post_page() {
        let site = site();
        let mut p = post("My Post", true);
        p.summary = "About it".to_owned();
        p.tags = vec!["tech".to_owned(), "go".to_owned()];
        p.header_image = "/images/header.png".to_owned();
        p.body = "## Getting Started\n".to_owned();
        let snapshot = Snapshot::from_posts(vec![p]);
        let table = RouteTable::enumerate(&snapshot);
        let props = PostProps::load(&snapshot, &table.routes()[0]).unwrap();
        let page = PostPage::compose(&site, 2024, props);

        assert_eq!(page.meta.title, "My Post");
        assert_eq!(page.meta.description, "About it");
        assert_eq!(
            page.meta.image.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/main/public/images/header.png")
        );
        assert_eq!(page.meta.url.as_str(), "https://blog.example.com/blogs/my-post/");
        assert_eq!(page.like.id, "my-post");
        assert_eq!(page.comments.id, "my-post");
        assert_eq!(page.comments.endpoint, None);
        assert_eq!(page.share.hashtags, vec!["tech", "go"]);
        assert_eq!(page.headings()[0].anchor, "getting-started");

        let value = page.to_value();
        assert_eq!(text(field(&value, "id")), Some("my-post"));
        assert_eq!(
            text(field(field(&value, "like"), "endpoint")),
            Some("https://likes.example.com/api")
        );
        assert!(matches!(
            field(field(&value, "comments"), "endpoint"),
            Value::Nil
        ));
    }
}
