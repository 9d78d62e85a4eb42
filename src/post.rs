//! Defines the [`Post`] type and how posts are converted into template values.
//! See [`Post::to_value`] and [`Post::summarize`].

use crate::markdown::Heading;
use crate::tag::{Category, Tag};
use chrono::{Datelike, NaiveDateTime};
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// The format used to display post dates in templates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a blog post.
#[derive(Clone, Debug)]
pub struct Post {
    /// The post's identifier: the source file name less its extension, or
    /// the directory name for `{dir}/index.md` bundles.
    pub id: String,

    /// The output location of the rendered post page.
    pub file_path: PathBuf,

    /// The URL of the rendered post page.
    pub url: Url,

    pub title: String,
    pub created: NaiveDateTime,
    pub modified: NaiveDateTime,
    pub category: Category,

    /// The post's tags in frontmatter order, unique by slug.
    pub tags: Vec<Tag>,

    pub author: Option<String>,

    /// A short summary shown on listing pages.
    pub excerpt: String,

    /// The rendered HTML body.
    pub body: String,

    /// The headings of the body, in order.
    pub toc: Vec<Heading>,

    /// The body as plain text. Search matches against this.
    pub text: String,
}

/// The calendar month a post was created in. Archives are grouped by month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: &NaiveDateTime) -> Month {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The path of the month's archive relative to the index base, e.g.
    /// `archives/2017/11/`.
    pub fn path(&self) -> String {
        format!("archives/{:04}/{:02}/", self.year, self.month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Post {
    pub fn month(&self) -> Month {
        Month::of(&self.created)
    }

    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|t| t.slug == slug)
    }

    /// Whether `needle` (already lowercased) occurs in the title or the body
    /// text, ignoring case.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.text.to_lowercase().contains(needle)
    }

    /// Converts a [`Post`] into a template [`Value`] for post pages.
    /// The result has all of the fields of [`Post::summarize`] plus `body`
    /// and `toc`.
    pub fn to_value(&self) -> Value {
        let mut m = self.fields();
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        m.insert(
            "toc".to_owned(),
            Value::Array(self.toc.iter().map(heading_to_value).collect()),
        );
        Value::Object(m)
    }

    /// Converts a [`Post`] into a template [`Value`] for listing pages. The
    /// result has fields `id`, `url`, `title`, `date`, `modified`, `author`,
    /// `excerpt`, `category`, and `tags`.
    pub fn summarize(&self) -> Value {
        Value::Object(self.fields())
    }

    fn fields(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::String(self.id.clone()));
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(self.created.format(DATE_FORMAT).to_string()),
        );
        m.insert(
            "modified".to_owned(),
            Value::String(self.modified.format(DATE_FORMAT).to_string()),
        );
        m.insert(
            "author".to_owned(),
            match &self.author {
                Some(author) => Value::String(author.clone()),
                None => Value::Nil,
            },
        );
        m.insert("excerpt".to_owned(), Value::String(self.excerpt.clone()));
        m.insert("category".to_owned(), (&self.category).into());
        m.insert(
            "tags".to_owned(),
            Value::Array(self.tags.iter().map(Value::from).collect()),
        );
        m
    }
}

fn heading_to_value(heading: &Heading) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("level".to_owned(), Value::String(heading.level.to_string()));
    m.insert("title".to_owned(), Value::String(heading.title.clone()));
    m.insert("anchor".to_owned(), Value::String(heading.anchor.clone()));
    Value::Object(m)
}

/// Sorts posts the way every collection is ordered: most recent first,
/// then by title.
pub fn sort(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.title.cmp(&b.title)));
}

#[cfg(test)]
pub mod fixture {
    use super::*;
    use chrono::NaiveDate;

    /// Builds a post in category `category` with the given tags, created at
    /// midnight on `date` (`YYYY-MM-DD`).
    pub fn post(id: &str, title: &str, date: &str, category: &str, tags: &[&str]) -> Post {
        let index_url = Url::parse("https://example.org/pages/").unwrap();
        let created = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms(0, 0, 0);
        Post {
            id: id.to_owned(),
            file_path: PathBuf::from(format!("/tmp/posts/{}.html", id)),
            url: Url::parse(&format!("https://example.org/posts/{}.html", id)).unwrap(),
            title: title.to_owned(),
            created,
            modified: created,
            category: Category::new(category, &index_url).unwrap(),
            tags: tags.iter().map(|t| Tag::new(t, &index_url).unwrap()).collect(),
            author: None,
            excerpt: String::new(),
            body: format!("<p>{}</p>", title),
            toc: Vec::new(),
            text: title.to_owned(),
        }
    }
}
