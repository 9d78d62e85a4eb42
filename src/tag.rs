//! Defines the [`Tag`] and [`Category`] types which classify a
//! [`crate::post::Post`]. A post has exactly one category and any number of
//! tags.

use crate::markdown::slug_or;
use gtmpl::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use url::Url;

/// Represents a [`crate::post::Post`] tag.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag's name as written in the post's frontmatter.
    pub name: String,

    /// The slugified name, so e.g., `macOS` and `MacOS` resolve to the same
    /// tag and the value can be dropped into a [`Url`].
    pub slug: String,

    /// The URL for the tag's first listing page,
    /// `{index_url}/tag/{slug}/index.html`.
    pub url: Url,
}

/// Represents a [`crate::post::Post`] category.
#[derive(Clone, Debug)]
pub struct Category {
    /// The category's display name.
    pub name: String,

    /// The slugified name.
    pub slug: String,

    /// The URL for the category's first listing page,
    /// `{index_url}/category/{slug}/index.html`.
    pub url: Url,
}

/// The slug of a tag or category whose name has no slug-safe characters.
const UNNAMED_SLUG: &str = "unnamed";

impl Tag {
    pub fn new(name: &str, index_url: &Url) -> Result<Tag, url::ParseError> {
        let slug = slug_or(name, UNNAMED_SLUG);
        Ok(Tag {
            url: index_url.join(&format!("tag/{}/index.html", slug))?,
            name: name.to_owned(),
            slug,
        })
    }
}

impl Category {
    pub fn new(name: &str, index_url: &Url) -> Result<Category, url::ParseError> {
        let slug = slug_or(name, UNNAMED_SLUG);
        Ok(Category {
            url: index_url.join(&format!("category/{}/index.html", slug))?,
            name: name.to_owned(),
            slug,
        })
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Category {}

fn to_value(name: &str, url: &Url) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(name.to_owned()));
    m.insert("url".to_owned(), Value::String(url.to_string()));
    Value::Object(m)
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        to_value(&t.name, &t.url)
    }
}

impl From<&Category> for Value {
    /// Converts [`Category`]s into [`Value`]s for templating.
    fn from(c: &Category) -> Value {
        to_value(&c.name, &c.url)
    }
}
