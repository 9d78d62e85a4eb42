//! Converts post markdown into HTML. Alongside the HTML, rendering produces a
//! table of contents (every heading gets an `id` anchor) and the post's plain
//! text, which feeds search and generated excerpts.

use crate::url::LinkResolver;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::collections::{HashMap, HashSet};
use std::fmt;
use url::{ParseError as UrlParseError, Url};

/// The output of [`to_html`].
#[derive(Clone, Debug, Default)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<Heading>,
    pub text: String,
}

/// A table-of-contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub anchor: String,
}

/// Converts markdown to HTML.
///
/// * `posts_url` is the prefix for post URLs (e.g.,
///   https://example.org/posts/). This should end in a trailing slash.
/// * `source_path` is the relative path to the source file from the posts
///   directory; relative links in the body are resolved against it.
/// * `markdown` is the post body.
pub fn to_html(posts_url: &Url, source_path: &str, markdown: &str) -> Result<Rendered, Error> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let resolver = LinkResolver::new(posts_url, source_path)?;
    let mut anchors = Anchors::default();
    let mut rendered = Rendered::default();
    let mut text = String::new();
    let mut events: Vec<Event> = Vec::new();

    // Events between a heading's start and end are held back until the
    // heading's text (and therefore its anchor) is known.
    let mut heading: Option<(Vec<Event>, String)> = None;

    for ev in Parser::new_ext(markdown, options) {
        let ev = convert(&resolver, ev)?;
        push_text(&mut text, &ev);
        match ev {
            Event::Start(Tag::Heading(_)) => heading = Some((Vec::new(), String::new())),
            Event::End(Tag::Heading(level)) => {
                if let Some((inner, title)) = heading.take() {
                    let anchor = anchors.claim(&title);
                    events.push(Event::Html(
                        format!(r#"<h{} id="{}">"#, level, anchor).into(),
                    ));
                    events.extend(inner);
                    events.push(Event::Html(format!("</h{}>\n", level).into()));
                    rendered.toc.push(Heading {
                        level,
                        title,
                        anchor,
                    });
                }
            }
            ev => match &mut heading {
                Some((inner, title)) => {
                    if let Event::Text(s) | Event::Code(s) = &ev {
                        title.push_str(s);
                    }
                    inner.push(ev);
                }
                None => events.push(ev),
            },
        }
    }

    html::push_html(&mut rendered.html, events.into_iter());
    rendered.text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(rendered)
}

/// Returns the first `length` characters of `text`. Counts characters rather
/// than bytes so multi-byte text is never split.
pub fn excerpt(text: &str, length: usize) -> String {
    text.chars().take(length).collect()
}

fn push_text(text: &mut String, ev: &Event) {
    match ev {
        Event::Text(s) | Event::Code(s) => text.push_str(s),
        Event::SoftBreak | Event::HardBreak => text.push(' '),
        Event::End(
            Tag::Paragraph
            | Tag::Heading(_)
            | Tag::Item
            | Tag::TableCell
            | Tag::CodeBlock(_)
            | Tag::BlockQuote,
        ) => text.push(' '),
        _ => {}
    }
}

fn convert<'b>(resolver: &LinkResolver, ev: Event<'b>) -> Result<Event<'b>, UrlParseError> {
    Ok(match ev {
        Event::Start(Tag::Link(link_type, dest, title)) if link_type != LinkType::Email => {
            Event::Start(Tag::Link(link_type, resolved(resolver, &dest)?, title))
        }
        Event::Start(Tag::Image(link_type, dest, title)) => {
            Event::Start(Tag::Image(link_type, resolved(resolver, &dest)?, title))
        }
        _ => ev,
    })
}

fn resolved<'b>(resolver: &LinkResolver, dest: &str) -> Result<CowStr<'b>, UrlParseError> {
    Ok(CowStr::Boxed(resolver.resolve(dest)?.into_boxed_str()))
}

/// Hands out unique heading anchors. A repeated heading gets `-1`, `-2`, ...
/// appended, skipping any suffix another heading already claimed.
#[derive(Default)]
struct Anchors {
    next_suffix: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl Anchors {
    fn claim(&mut self, title: &str) -> String {
        let base = slug_or(title, "section");
        let suffix = self.next_suffix.entry(base.clone()).or_insert(0);
        loop {
            let anchor = match *suffix {
                0 => base.clone(),
                n => format!("{}-{}", base, n),
            };
            *suffix += 1;
            if self.issued.insert(anchor.clone()) {
                return anchor;
            }
        }
    }
}

/// Slugifies `name`, falling back to `fallback` when nothing of `name`
/// survives slugification.
pub fn slug_or(name: &str, fallback: &str) -> String {
    match slug::slugify(name) {
        slug if slug.is_empty() => fallback.to_owned(),
        slug => slug,
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a problem parsing URLs.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> Result<Rendered, Error> {
        to_html(
            &Url::parse("https://example.org/posts/")?,
            "hello.md",
            markdown,
        )
    }

    #[test]
    fn test_heading_anchors() -> Result<(), Error> {
        let rendered = render("# Getting started\n\nSome text.\n")?;
        assert!(rendered
            .html
            .contains(r#"<h1 id="getting-started">Getting started</h1>"#));
        assert!(rendered.html.contains("<p>Some text.</p>"));
        Ok(())
    }

    #[test]
    fn test_anchors_never_collide() -> Result<(), Error> {
        let rendered = render("## Setup\n\n## Setup\n\n## Setup 1\n\n## Setup\n")?;
        let anchors: Vec<&str> = rendered.toc.iter().map(|h| h.anchor.as_str()).collect();
        assert_eq!(vec!["setup", "setup-1", "setup-1-1", "setup-2"], anchors);
        Ok(())
    }

    #[test]
    fn test_table_of_contents() -> Result<(), Error> {
        let rendered = render("# Intro\n\n## Setup\n\n## Setup\n\n## `cargo` usage\n")?;
        let anchors: Vec<&str> = rendered.toc.iter().map(|h| h.anchor.as_str()).collect();
        assert_eq!(vec!["intro", "setup", "setup-1", "cargo-usage"], anchors);
        assert_eq!(2, rendered.toc[1].level);
        assert_eq!("cargo usage", rendered.toc[3].title);
        Ok(())
    }

    #[test]
    fn test_heading_without_slug() -> Result<(), Error> {
        let rendered = render("# ???\n")?;
        assert_eq!("section", rendered.toc[0].anchor);
        Ok(())
    }

    #[test]
    fn test_plain_text() -> Result<(), Error> {
        let rendered = render("# Title\n\nOne *two*\nthree `four`.\n\n- five\n- six\n")?;
        assert_eq!("Title One two three four. five six", rendered.text);
        Ok(())
    }

    #[test]
    fn test_links_to_posts_are_rewritten() -> Result<(), Error> {
        let rendered = render("See [the other post](other.md) and [docs](https://docs.rs).\n")?;
        assert!(rendered
            .html
            .contains(r#"<a href="https://example.org/posts/other.html">"#));
        assert!(rendered.html.contains(r#"<a href="https://docs.rs/">"#));
        Ok(())
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!("时光", excerpt("时光笔记", 2));
        assert_eq!("short", excerpt("short", 54));
    }
}
