//! The inverse of [`crate::slug::derive_slug`]: finding the post behind a
//! route.

use crate::post::Post;
use crate::slug::derive_slug;

/// Returns the first post in `posts` whose title derives `slug`. When several
/// titles derive the same slug the earliest in repository order wins and the
/// rest are unreachable.
pub fn resolve<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    posts.iter().find(|post| derive_slug(&post.title) == slug)
}
