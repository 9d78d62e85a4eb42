//! Defines the [`Parser`] and [`Error`] types and the logic for parsing posts
//! from the file system into memory.

use std::{
    collections::HashSet,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

use crate::{
    markdown,
    post::{self, Post},
    tag::{Category, Tag},
};

const MARKDOWN_EXTENSION: &str = "md";
const BUNDLE_INDEX: &str = "index.md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `index_url` is the base URL for listing pages. It's used to prefix
    /// category and tag page URLs (i.e., the URL for the first page of a tag
    /// is `{index_url}/tag/{slug}/index.html`).
    index_url: &'a Url,

    /// `posts_url` is the base URL for post pages. It's used to prefix post
    /// page URLs (i.e., the URL for a post is `{posts_url}/{post_id}.html`).
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,

    /// The author credited on posts without an `Author` of their own.
    default_author: Option<&'a str>,

    /// The number of characters in generated excerpts.
    excerpt_length: usize,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(
        index_url: &'a Url,
        posts_url: &'a Url,
        posts_directory: &'a Path,
        default_author: Option<&'a str>,
        excerpt_length: usize,
    ) -> Parser<'a> {
        Parser {
            index_url,
            posts_url,
            posts_directory,
            default_author,
            excerpt_length,
        }
    }

    /// Searches a provided `source_directory` for post files (extension =
    /// `.md`, or a directory containing an `index.md`) and returns the posts
    /// sorted by date (most recent first). Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title`, `Date`, `Category`, and
    ///    optionally `Modified`, `Tags`, `Excerpt`, and `Author`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Date: 2017-11-25 16:11
    /// Category: Notes
    /// Tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        let mut ids = HashSet::new();
        for result in WalkDir::new(source_directory).min_depth(1).max_depth(2) {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
            {
                continue;
            }

            // strip_prefix() should never fail since WalkDir only yields
            // descendants of `source_directory`
            let relative_path = match entry.path().strip_prefix(source_directory) {
                Ok(relative_path) => relative_path,
                Err(_) => continue,
            };

            // Only `{dir}/index.md` is a post below the top level; other
            // markdown files in a bundle are assets.
            if entry.depth() == 2 && entry.file_name() != BUNDLE_INDEX {
                continue;
            }

            let post = self.parse_post(source_directory, relative_path)?;
            if !ids.insert(post.id.clone()) {
                return Err(Error::DuplicateId(post.id));
            }
            posts.push(post);
        }

        post::sort(&mut posts);
        Ok(posts)
    }

    /// Parses a single [`Post`] from the file at `relative_path` under
    /// `posts_source_directory`, annotating any error with the path.
    pub fn parse_post(&self, posts_source_directory: &Path, relative_path: &Path) -> Result<Post> {
        debug!(path = %relative_path.display(), "parsing post");
        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| annotate(relative_path, e.into()))?;
        self.parse_str(relative_path, &contents)
            .map_err(|e| annotate(relative_path, e))
    }

    /// Parses a single [`Post`] from its source text. `relative_path` is the
    /// path of the source file relative to the posts source directory; the
    /// post's ID is derived from it.
    pub fn parse_str(&self, relative_path: &Path, input: &str) -> Result<Post> {
        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let id = post_id(relative_path)?;
        let file_name = format!("{}.html", id);
        let source_path = relative_path
            .to_str()
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?
            .replace('\\', "/");

        let rendered = markdown::to_html(self.posts_url, &source_path, &input[body_start..])?;
        let created = parse_date(&frontmatter.date)?;
        let modified = match &frontmatter.modified {
            Some(modified) => parse_date(modified)?,
            None => created,
        };

        let mut tags: Vec<Tag> = Vec::with_capacity(frontmatter.tags.len());
        for name in &frontmatter.tags {
            let tag = Tag::new(name, self.index_url)?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let excerpt = match frontmatter.excerpt.trim() {
            "" => markdown::excerpt(&rendered.text, self.excerpt_length),
            excerpt => excerpt.to_owned(),
        };

        Ok(Post {
            file_path: self.posts_directory.join(&file_name),
            url: self.posts_url.join(&file_name)?,
            id,
            title: frontmatter.title,
            created,
            modified,
            category: Category::new(&frontmatter.category, self.index_url)?,
            tags,
            author: frontmatter
                .author
                .or_else(|| self.default_author.map(str::to_owned)),
            excerpt,
            body: rendered.html,
            toc: rendered.toc,
            text: rendered.text,
        })
    }
}

fn annotate(relative_path: &Path, err: Error) -> Error {
    Error::Annotated(format!("parsing post `{}`", relative_path.display()), Box::new(err))
}

fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                        // yaml_start
            FENCE.len() + offset,               // yaml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )),
    }
}

fn post_id(relative_path: &Path) -> Result<String> {
    let bundle = match relative_path.ends_with(BUNDLE_INDEX) {
        true => relative_path.parent().and_then(Path::file_name),
        false => None,
    };
    bundle
        .or_else(|| relative_path.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()).into())
}

/// Parses frontmatter dates. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`, and
/// `YYYY-MM-DD HH:MM:SS`; a bare date means midnight.
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(date);
        }
    }
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => Ok(date.and_hms(0, 0, 0)),
        Err(_) => Err(Error::InvalidDate(input.to_owned())),
    }
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the post.
    #[serde(rename = "Title")]
    pub title: String,

    /// The creation date of the post.
    #[serde(rename = "Date")]
    pub date: String,

    /// The date the post was last modified.
    #[serde(default, rename = "Modified")]
    pub modified: Option<String>,

    /// The post's category.
    #[serde(rename = "Category")]
    pub category: String,

    /// The tags associated with the post.
    #[serde(default, rename = "Tags")]
    pub tags: Vec<String>,

    /// A hand-written summary. Generated from the body when empty.
    #[serde(default, rename = "Excerpt")]
    pub excerpt: String,

    #[serde(default, rename = "Author")]
    pub author: Option<String>,
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a frontmatter date isn't in a supported format.
    InvalidDate(String),

    /// Returned when two source files map to the same post ID.
    DuplicateId(String),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(date) => write!(f, "invalid date `{}`", date),
            Error::DuplicateId(id) => write!(f, "more than one post has the ID `{}`", id),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_) => None,
            Error::DuplicateId(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        match err {
            markdown::Error::UrlParse(e) => Error::UrlParse(e),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Fixture {
        index_url: Url,
        posts_url: Url,
        posts_directory: PathBuf,
    }

    impl Fixture {
        fn new() -> Result<Fixture> {
            Ok(Fixture {
                index_url: Url::parse("https://example.com/pages/")?,
                posts_url: Url::parse("https://example.com/posts/")?,
                posts_directory: PathBuf::from("/tmp/out/posts"),
            })
        }

        fn parser(&self) -> Parser<'_> {
            Parser::new(
                &self.index_url,
                &self.posts_url,
                &self.posts_directory,
                Some("admin"),
                10,
            )
        }
    }

    #[test]
    fn test_parse_str() -> Result<()> {
        let fixture = Fixture::new()?;
        let post = fixture.parser().parse_str(
            Path::new("hello.md"),
            "---\nTitle: Hello\nDate: 2017-11-25 16:11\nCategory: Notes\nTags: [Rust, rust, Web]\n---\n# Hi\n\nToday is the first day of the rest.\n",
        )?;

        assert_eq!("hello", post.id);
        assert_eq!("Hello", post.title);
        assert_eq!("https://example.com/posts/hello.html", post.url.as_str());
        assert_eq!(PathBuf::from("/tmp/out/posts/hello.html"), post.file_path);
        assert_eq!(parse_date("2017-11-25 16:11:00")?, post.created);
        assert_eq!(post.created, post.modified);
        assert_eq!("notes", post.category.slug);
        let tags: Vec<&str> = post.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(vec!["rust", "web"], tags);
        assert_eq!(Some("admin"), post.author.as_deref());
        assert_eq!("Hi Today i", post.excerpt);
        assert_eq!("hi", post.toc[0].anchor);
        Ok(())
    }

    #[test]
    fn test_parse_str_explicit_fields() -> Result<()> {
        let fixture = Fixture::new()?;
        let post = fixture.parser().parse_str(
            Path::new("trip/index.md"),
            "---\nTitle: Trip\nDate: 2018-01-02\nModified: 2018-02-03 04:05:06\nCategory: Travel\nExcerpt: A short trip\nAuthor: guest\n---\nBody\n",
        )?;

        assert_eq!("trip", post.id);
        assert_eq!("A short trip", post.excerpt);
        assert_eq!(Some("guest"), post.author.as_deref());
        assert_eq!(parse_date("2018-02-03 04:05:06")?, post.modified);
        assert!(post.tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_fences() -> Result<()> {
        let fixture = Fixture::new()?;
        let parser = fixture.parser();
        assert!(matches!(
            parser.parse_str(Path::new("a.md"), "Title: A\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            parser.parse_str(Path::new("a.md"), "---\nTitle: A\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
        Ok(())
    }

    #[test]
    fn test_missing_category() -> Result<()> {
        let fixture = Fixture::new()?;
        assert!(matches!(
            fixture
                .parser()
                .parse_str(Path::new("a.md"), "---\nTitle: A\nDate: 2018-01-02\n---\n"),
            Err(Error::DeserializeYaml(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parse_date() -> Result<()> {
        assert_eq!(parse_date("2017-11-25 00:00:00")?, parse_date("2017-11-25")?);
        assert_eq!(parse_date("2017-11-25 16:11:00")?, parse_date("2017-11-25 16:11")?);
        assert!(matches!(parse_date("25/11/2017"), Err(Error::InvalidDate(_))));
        Ok(())
    }

    #[test]
    fn test_parse_posts() -> Result<()> {
        let fixture = Fixture::new()?;
        let posts = fixture
            .parser()
            .parse_posts(Path::new("./testdata/blog/posts/"))?;

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["rust-ownership", "trip", "hello-world", "first-post"], ids);
        Ok(())
    }
}
