//! The library code for the `quire` static blog generator. A build moves
//! through these steps:
//!
//! 1. Loading every post from the posts directory into an immutable
//!    [`repository::Snapshot`]. Post titles, summaries, tags, and the rest of
//!    the frontmatter are parsed into typed [`post::Post`] records.
//! 2. Enumerating one route per post ([`routes::RouteTable`]). The route id is
//!    a slug derived from the title ([`slug::derive_slug`]); titles that derive
//!    the same slug are reported before anything is written.
//! 3. Resolving each route back to its post ([`resolve::resolve`]) and
//!    rendering the body ([`markdown::serialize`]). `{Field}` expressions in
//!    the body are replaced with frontmatter values, and headings receive
//!    stable anchor ids that match the table of contents
//!    ([`heading::extract_headings`]).
//! 4. Composing the home, topic, post, and not-found pages ([`page`]) and
//!    rendering them through the theme's templates to disk ([`write`]).
//!
//! [`build::build_site`] runs all of the above.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod heading;
pub mod markdown;
pub mod page;
pub mod post;
pub mod props;
pub mod repository;
pub mod resolve;
pub mod routes;
pub mod share;
pub mod slug;
mod value;
pub mod write;
