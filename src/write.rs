//! Turns a [`Blog`] into pages and writes them to disk. Every collection of
//! posts (all posts, each category, each tag, each month) becomes a run of
//! paginated listing pages, and every post becomes a post page.

use crate::blog::{self, Blog, Counted};
use crate::listing::{self, Listing};
use crate::pagination;
use crate::post::{Month, Post};
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::{ParseError as UrlParseError, Url};

/// Responsible for indexing, templating, and writing HTML pages to disk from
/// a [`Blog`].
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The base URL for listing pages. The main listing pages will be located
    /// at `{index_base_url}/index.html`, `{index_base_url}/2.html`, etc. The
    /// category listing pages will be located at
    /// `{index_base_url}/category/{slug}/index.html`, and likewise for tags
    /// (`tag/{slug}/`) and months (`archives/{yyyy}/{mm}/`).
    pub index_base_url: &'a Url,

    /// The directory in which the listing HTML files will be written, laid
    /// out the same way as [`Writer::index_base_url`].
    pub index_output_directory: &'a Path,

    /// The number of posts per listing page.
    pub index_page_size: usize,

    /// How many page links to show on either side of the current page.
    pub neighbor_span: usize,

    /// How many posts the `recent` sidebar list holds.
    pub recent_posts: usize,

    pub title: &'a str,
    pub description: &'a str,

    /// The URL for the site's home page. This is made available to both post
    /// and listing templates, typically as the destination for the
    /// site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets. This is made available to both post and
    /// listing templates, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    pub feed_url: &'a Url,
}

impl Writer<'_> {
    /// Creates every listing and post page for `blog`, templates them, and
    /// writes them to disk.
    pub fn write_blog(&self, blog: &Blog) -> Result<()> {
        let shared = self.shared_values(blog)?;
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for page in self.pages(blog)? {
            if let Some(dir) = page.file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            self.write_page(&page, &shared)?;
        }
        Ok(())
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page, shared: &HashMap<String, Value>) -> Result<()> {
        debug!(path = %page.file_path.display(), "writing page");
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            for (key, v) in shared {
                obj.insert(key.clone(), v.clone());
            }
        }
        let template = match page.layout {
            Layout::Listing => self.index_template,
            Layout::Post => self.posts_template,
        };
        template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        Ok(())
    }

    /// The site values and sidebar aggregates every page gets: `title`,
    /// `description`, `home_page`, `static_url`, `feed_url`, `recent`,
    /// `archives`, `categories`, and `tags`.
    fn shared_values(&self, blog: &Blog) -> Result<HashMap<String, Value>> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.to_owned()));
        m.insert(
            "description".to_owned(),
            Value::String(self.description.to_owned()),
        );
        m.insert(
            "home_page".to_owned(),
            Value::String(self.home_page.to_string()),
        );
        m.insert(
            "static_url".to_owned(),
            Value::String(self.static_url.to_string()),
        );
        m.insert(
            "feed_url".to_owned(),
            Value::String(self.feed_url.to_string()),
        );
        m.insert(
            "recent".to_owned(),
            Value::Array(blog.recent(self.recent_posts).iter().map(Post::summarize).collect()),
        );

        let mut archives = Vec::new();
        for month in blog.archives() {
            archives.push(link_to_value(
                &month.to_string(),
                &self.index_base_url.join(&month.path())?.join("index.html")?,
                blog.by_month(month).len(),
            ));
        }
        m.insert("archives".to_owned(), Value::Array(archives));
        m.insert(
            "categories".to_owned(),
            Value::Array(
                blog.categories()
                    .iter()
                    .map(|c| link_to_value(&c.item.name, &c.item.url, c.num_posts))
                    .collect(),
            ),
        );
        m.insert(
            "tags".to_owned(),
            Value::Array(
                blog.tags()
                    .iter()
                    .map(|t| link_to_value(&t.item.name, &t.item.url, t.num_posts))
                    .collect(),
            ),
        );
        Ok(m)
    }

    /// Creates all of the listing and post [`Page`]s for a [`Blog`].
    fn pages(&self, blog: &Blog) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for collection in self.collections(blog)? {
            pages.extend(collection.to_pages(self.index_page_size, self.neighbor_span)?);
        }
        pages.extend(post_pages(blog));
        Ok(pages)
    }

    /// Groups the posts of `blog` into the collections that get listing
    /// pages: all posts first, then each category, each tag, and each month.
    fn collections<'b>(&self, blog: &'b Blog) -> Result<Vec<Collection<'b>>> {
        let base_url = self.index_base_url;
        let base_dir = self.index_output_directory;

        let mut collections = vec![Collection {
            kind: "index",
            name: String::new(),
            url: base_url.to_owned(),
            output_directory: base_dir.to_owned(),
            posts: blog.posts().iter().collect(),
        }];

        for Counted { item, .. } in blog.categories() {
            collections.push(Collection {
                kind: "category",
                name: item.name.clone(),
                url: base_url.join(&format!("category/{}/", item.slug))?,
                output_directory: base_dir.join("category").join(&item.slug),
                posts: blog.by_category(&item.slug)?,
            });
        }

        for Counted { item, .. } in blog.tags() {
            collections.push(Collection {
                kind: "tag",
                name: item.name.clone(),
                url: base_url.join(&format!("tag/{}/", item.slug))?,
                output_directory: base_dir.join("tag").join(&item.slug),
                posts: blog.by_tag(&item.slug)?,
            });
        }

        for month in blog.archives() {
            collections.push(Collection {
                kind: "archive",
                name: month.to_string(),
                url: base_url.join(&month.path())?,
                output_directory: month_directory(base_dir, month),
                posts: blog.by_month(month),
            });
        }

        Ok(collections)
    }
}

fn month_directory(base_dir: &Path, month: Month) -> PathBuf {
    base_dir
        .join("archives")
        .join(format!("{:04}", month.year))
        .join(format!("{:02}", month.month))
}

fn link_to_value(name: &str, url: &Url, num_posts: usize) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(name.to_owned()));
    m.insert("url".to_owned(), Value::String(url.to_string()));
    m.insert("num_posts".to_owned(), Value::String(num_posts.to_string()));
    Value::Object(m)
}

/// Which template renders a page.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Layout {
    Listing,
    Post,
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page {
    /// The main item for the page: a post for post pages, an array of post
    /// summaries for listing pages.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// Layout-specific values: `listing` and `pagination` for listing pages,
    /// `comments` for post pages.
    extra: HashMap<String, Value>,

    layout: Layout,
}

impl Page {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions)
    /// plus the layout-specific values.
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m = self.extra.clone();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// Creates all of the post [`Page`]s for a [`Blog`]. `prev` links to the newer
/// post and `next` to the older one.
fn post_pages(blog: &Blog) -> impl Iterator<Item = Page> + '_ {
    let posts = blog.posts();
    posts.iter().enumerate().map(move |(i, post)| {
        let mut extra: HashMap<String, Value> = HashMap::new();
        extra.insert(
            "comments".to_owned(),
            Value::Array(blog.comments(&post.id).iter().map(|c| c.to_value()).collect()),
        );
        Page {
            item: post.to_value(),
            file_path: post.file_path.clone(),
            prev: match i < 1 {
                true => None,
                false => Some(posts[i - 1].url.clone()),
            },
            next: posts.get(i + 1).map(|p| p.url.clone()),
            extra,
            layout: Layout::Post,
        }
    })
}

/// `Collection` represents an ordered group of [`Post`]s that gets its own
/// run of listing pages.
struct Collection<'a> {
    /// `index`, `category`, `tag`, or `archive`.
    kind: &'static str,

    /// The category or tag name, or the month. Empty for the main index.
    name: String,

    /// The base URL for the collection's listing pages.
    url: Url,

    /// The output directory for the collection's listing pages.
    output_directory: PathBuf,

    posts: Vec<&'a Post>,
}

impl Collection<'_> {
    /// Converts the collection to a list of listing pages with
    /// `index_page_size` posts per page.
    fn to_pages(&self, index_page_size: usize, neighbor_span: usize) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for listing in listing::paginate(self.posts.as_slice(), index_page_size, neighbor_span)? {
            let mut extra: HashMap<String, Value> = HashMap::new();
            extra.insert("listing".to_owned(), self.to_value());
            extra.insert("pagination".to_owned(), self.pagination_to_value(&listing)?);
            pages.push(Page {
                item: Value::Array(listing.items.iter().map(|p| p.summarize()).collect()),
                file_path: self.output_directory.join(listing::file_name(listing.number)),
                prev: listing.previous().map(|n| self.page_url(n)).transpose()?,
                next: listing.next().map(|n| self.page_url(n)).transpose()?,
                extra,
                layout: Layout::Listing,
            });
        }
        Ok(pages)
    }

    fn page_url(&self, number: usize) -> std::result::Result<Url, UrlParseError> {
        self.url.join(&listing::file_name(number))
    }

    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("kind".to_owned(), Value::String(self.kind.to_owned()));
        m.insert("name".to_owned(), Value::String(self.name.clone()));
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        Value::Object(m)
    }

    /// Converts a listing's navigation into a [`Value::Object`] with page
    /// lists `left` and `right` (each entry has `number` and `url`), the
    /// flags of [`pagination::PaginationDisplay`], and `current`, `total`,
    /// `is_paginated`, `first_url`, and `last_url`.
    fn pagination_to_value<T>(&self, listing: &Listing<'_, T>) -> Result<Value> {
        let display = &listing.pagination;
        let links = |numbers: &[usize]| -> std::result::Result<Value, UrlParseError> {
            let mut links = Vec::with_capacity(numbers.len());
            for &number in numbers {
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert("number".to_owned(), Value::String(number.to_string()));
                m.insert(
                    "url".to_owned(),
                    Value::String(self.page_url(number)?.to_string()),
                );
                links.push(Value::Object(m));
            }
            Ok(Value::Array(links))
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "is_paginated".to_owned(),
            Value::Bool(listing.is_paginated()),
        );
        m.insert(
            "current".to_owned(),
            Value::String(listing.number.to_string()),
        );
        m.insert(
            "total".to_owned(),
            Value::String(listing.total_pages.to_string()),
        );
        m.insert("left".to_owned(), links(display.left.as_slice())?);
        m.insert("right".to_owned(), links(display.right.as_slice())?);
        m.insert(
            "left_has_more".to_owned(),
            Value::Bool(display.left_has_more),
        );
        m.insert(
            "right_has_more".to_owned(),
            Value::Bool(display.right_has_more),
        );
        m.insert("show_first".to_owned(), Value::Bool(display.show_first));
        m.insert("show_last".to_owned(), Value::Bool(display.show_last));
        m.insert(
            "first_url".to_owned(),
            Value::String(self.page_url(1)?.to_string()),
        );
        m.insert(
            "last_url".to_owned(),
            Value::String(self.page_url(listing.total_pages)?.to_string()),
        );
        Ok(Value::Object(m))
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error paginating a collection.
    Pagination(pagination::Error),

    /// An error querying the blog for a collection.
    Blog(blog::Error),

    /// An error building a page URL.
    UrlParse(UrlParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<pagination::Error> for Error {
    fn from(err: pagination::Error) -> Error {
        Error::Pagination(err)
    }
}

impl From<blog::Error> for Error {
    fn from(err: blog::Error) -> Error {
        Error::Blog(err)
    }
}

impl From<UrlParseError> for Error {
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Pagination(err) => err.fmt(f),
            Error::Blog(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Pagination(err) => Some(err),
            Error::Blog(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
