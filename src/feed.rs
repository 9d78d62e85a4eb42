//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::post::Post;
use atom_syndication::{
    Category, Content, Entry, Error as AtomError, Feed, FixedDateTime, Link, Person, Text,
};
use chrono::{NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

/// Builds the feed. It is dated by the most recently modified post, so
/// rebuilding an unchanged blog produces an identical feed.
pub fn feed(config: &FeedConfig, posts: &[Post]) -> Feed {
    let updated = match posts.iter().map(|p| p.modified).max() {
        Some(modified) => utc(&modified),
        None => Utc::now().into(),
    };

    let mut feed = Feed::default();
    feed.set_title(config.title.as_str());
    feed.set_id(config.id.as_str());
    feed.set_updated(updated);
    if !config.description.is_empty() {
        feed.set_subtitle(Some(Text::from(config.description.as_str())));
    }
    feed.set_authors(author_to_people(config.author.as_ref()));
    feed.set_links(vec![alternate(config.home_page.as_str())]);
    feed.set_entries(
        posts
            .iter()
            .map(|post| entry(config, post))
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn entry(config: &FeedConfig, post: &Post) -> Entry {
    let mut content = Content::default();
    content.set_content_type(Some(String::from("html")));
    content.set_value(Some(post.body.clone()));

    let mut entry = Entry::default();
    entry.set_id(post.url.as_str());
    entry.set_title(format!("[{}] {}", post.category.name, post.title));
    entry.set_updated(utc(&post.modified));
    entry.set_published(Some(utc(&post.created)));
    entry.set_authors(match &post.author {
        Some(name) => vec![person(name, None)],
        None => author_to_people(config.author.as_ref()),
    });
    entry.set_links(vec![alternate(post.url.as_str())]);
    entry.set_summary(Some(Text::from(post.excerpt.as_str())));
    entry.set_content(Some(content));
    entry.set_categories(
        post.tags
            .iter()
            .map(|tag| {
                let mut category = Category::default();
                category.set_term(tag.slug.as_str());
                category.set_label(Some(tag.name.clone()));
                category
            })
            .collect::<Vec<Category>>(),
    );
    entry
}

// Post dates carry no timezone; they are published as UTC.
fn utc(date: &NaiveDateTime) -> FixedDateTime {
    Utc.from_utc_datetime(date).into()
}

fn alternate(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn person(name: &str, email: Option<&String>) -> Person {
    let mut person = Person::default();
    person.set_name(name);
    person.set_email(email.cloned());
    person
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![person(&author.name, author.email.as_ref())],
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude I/O and Atom issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}
