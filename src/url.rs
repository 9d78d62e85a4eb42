//! Rewrites links found in post bodies. Posts link to each other by source
//! file name (`other-post.md`), which must point at the rendered page
//! (`other-post.html`) once the site is built.

use url::{ParseError, Url};

const MARKDOWN_EXTENSION: &str = ".md";
const HTML_EXTENSION: &str = ".html";
const BUNDLE_INDEX: &str = "/index.md";

/// Resolves link destinations relative to the post that contains them.
pub struct LinkResolver<'a> {
    posts_url: &'a Url,
    base: Url,
}

impl<'a> LinkResolver<'a> {
    /// * `posts_url` - the URL prefix for posts; must end in a slash.
    /// * `source_path` - the post's source path relative to the posts
    ///   directory, e.g. `hello.md` or `trip/index.md`.
    pub fn new(posts_url: &'a Url, source_path: &str) -> Result<LinkResolver<'a>> {
        Ok(LinkResolver {
            posts_url,
            base: posts_url.join(source_path)?,
        })
    }

    /// Returns the destination as an absolute URL, pointing markdown sources
    /// under `posts_url` at their rendered pages. Fragment-only links are
    /// returned as-is.
    pub fn resolve(&self, dest: &str) -> Result<String> {
        if dest.starts_with('#') {
            return Ok(dest.to_owned());
        }
        let absolute = match Url::parse(dest) {
            Ok(absolute) => absolute,
            Err(ParseError::RelativeUrlWithoutBase) => self.base.join(dest)?,
            Err(e) => return Err(e),
        };
        Ok(self.rendered(absolute)?.to_string())
    }

    fn rendered(&self, absolute: Url) -> Result<Url> {
        let relative = match self.posts_url.make_relative(&absolute) {
            Some(relative) => relative,
            None => return Ok(absolute),
        };
        if relative.starts_with("../") || !relative.ends_with(MARKDOWN_EXTENSION) {
            return Ok(absolute);
        }

        let stem = match relative.strip_suffix(BUNDLE_INDEX) {
            Some(bundle) if !bundle.contains('/') => bundle,
            _ => relative.trim_end_matches(MARKDOWN_EXTENSION),
        };
        self.posts_url.join(&format!("{}{}", stem, HTML_EXTENSION))
    }
}

type Result<T> = std::result::Result<T, ParseError>;
