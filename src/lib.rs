//! The library code for the `timenotes` blog generator. The architecture can
//! be generally broken down into three steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`]) and loading
//!    their comments ([`crate::comment`]) into a [`crate::blog::Blog`]
//! 2. Grouping the posts into collections (all posts, categories, tags, and
//!    monthly archives) and paginating each one ([`crate::listing`])
//! 3. Rendering listing and post pages to disk ([`crate::write`]) along with
//!    the Atom feed ([`crate::feed`])
//!
//! The navigation under each listing page is computed by
//! [`crate::pagination`]: a window of page links on either side of the
//! current page, plus flags saying whether the first and last pages need
//! their own links and whether pages are hidden in between.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod blog;
pub mod build;
pub mod comment;
pub mod config;
pub mod feed;
pub mod listing;
pub mod markdown;
pub mod pagination;
pub mod parser;
pub mod post;
pub mod tag;
pub mod url;
pub mod write;
