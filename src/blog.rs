//! Defines the [`Blog`] content store: every post plus their comments, and the
//! queries listing pages are built from (recent posts, archives by month,
//! categories, tags, and search).

use crate::comment::{Comment, CommentForm, ValidationErrors};
use crate::post::{self, Month, Post};
use crate::tag::{Category, Tag};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::info;

/// The posts and comments of a blog.
pub struct Blog {
    /// Most recent first; see [`post::sort`].
    posts: Vec<Post>,

    /// Keyed by post ID, in posting order.
    comments: HashMap<String, Vec<Comment>>,
}

/// A category or tag along with the number of posts filed under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counted<'a, T> {
    pub item: &'a T,
    pub num_posts: usize,
}

impl Blog {
    pub fn new(mut posts: Vec<Post>, comments: HashMap<String, Vec<Comment>>) -> Blog {
        post::sort(&mut posts);
        Blog { posts, comments }
    }

    /// Every post, most recent first.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    /// The `n` most recent posts.
    pub fn recent(&self, n: usize) -> &[Post] {
        &self.posts[..n.min(self.posts.len())]
    }

    /// Every month with at least one post, most recent first.
    pub fn archives(&self) -> Vec<Month> {
        let months: BTreeSet<Month> = self.posts.iter().map(Post::month).collect();
        months.into_iter().rev().collect()
    }

    pub fn by_month(&self, month: Month) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.month() == month).collect()
    }

    /// Every category with at least one post, sorted by name.
    pub fn categories(&self) -> Vec<Counted<'_, Category>> {
        count(self.posts.iter().map(|p| &p.category), |c| &c.slug, |c| &c.name)
    }

    /// The posts filed under the category with slug `slug`.
    pub fn by_category(&self, slug: &str) -> Result<Vec<&Post>> {
        let posts: Vec<&Post> = self.posts.iter().filter(|p| p.category.slug == slug).collect();
        match posts.is_empty() {
            true => Err(Error::CategoryNotFound(slug.to_owned())),
            false => Ok(posts),
        }
    }

    /// Every tag with at least one post, sorted by name.
    pub fn tags(&self) -> Vec<Counted<'_, Tag>> {
        count(self.posts.iter().flat_map(|p| p.tags.iter()), |t| &t.slug, |t| &t.name)
    }

    /// The posts tagged with slug `slug`.
    pub fn by_tag(&self, slug: &str) -> Result<Vec<&Post>> {
        let posts: Vec<&Post> = self.posts.iter().filter(|p| p.has_tag(slug)).collect();
        match posts.is_empty() {
            true => Err(Error::TagNotFound(slug.to_owned())),
            false => Ok(posts),
        }
    }

    /// The posts whose title or body contains `query`, ignoring case. A
    /// missing or blank query is an error rather than a match-everything.
    pub fn search(&self, query: Option<&str>) -> Result<Vec<&Post>> {
        let needle = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return Err(Error::MissingKeyword),
        };
        Ok(self.posts.iter().filter(|p| p.matches(&needle)).collect())
    }

    /// The comments on post `post_id`, in posting order.
    pub fn comments(&self, post_id: &str) -> &[Comment] {
        match self.comments.get(post_id) {
            Some(comments) => comments,
            None => &[],
        }
    }

    /// Validates `form` and appends the resulting comment to post `post_id`.
    pub fn post_comment(
        &mut self,
        post_id: &str,
        form: &CommentForm,
        now: NaiveDateTime,
    ) -> Result<&Comment> {
        if self.post(post_id).is_none() {
            return Err(Error::PostNotFound(post_id.to_owned()));
        }
        let comment = form.validate(post_id, now)?;
        info!(post = post_id, name = %comment.name, preview = %comment.preview(), "new comment");

        let comments = self.comments.entry(post_id.to_owned()).or_default();
        comments.push(comment);
        // `comments` was just pushed to, so it can't be empty.
        Ok(&comments[comments.len() - 1])
    }
}

fn count<'a, T, I>(
    items: I,
    slug: impl Fn(&T) -> &String,
    name: impl Fn(&T) -> &String,
) -> Vec<Counted<'a, T>>
where
    I: Iterator<Item = &'a T>,
{
    let mut counts: Vec<Counted<'a, T>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for item in items {
        match index.get(slug(item).as_str()) {
            Some(&i) => counts[i].num_posts += 1,
            None => {
                index.insert(slug(item).as_str(), counts.len());
                counts.push(Counted { item, num_posts: 1 });
            }
        }
    }
    counts.sort_by(|a, b| name(a.item).cmp(name(b.item)));
    counts
}

/// The result of a [`Blog`] query.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed [`Blog`] query.
#[derive(Debug)]
pub enum Error {
    /// Returned when no post has the requested ID.
    PostNotFound(String),

    /// Returned when no post is filed under the requested category.
    CategoryNotFound(String),

    /// Returned when no post has the requested tag.
    TagNotFound(String),

    /// Returned when a search has no keyword.
    MissingKeyword,

    /// Returned when a submitted comment fails validation.
    InvalidComment(ValidationErrors),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::PostNotFound(id) => write!(f, "no post with ID `{}`", id),
            Error::CategoryNotFound(slug) => write!(f, "no category `{}`", slug),
            Error::TagNotFound(slug) => write!(f, "no tag `{}`", slug),
            Error::MissingKeyword => write!(f, "no search keyword was given"),
            Error::InvalidComment(err) => write!(f, "invalid comment: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidComment(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for Error {
    /// Converts [`ValidationErrors`] into an [`Error`] so comment validation
    /// composes with `?`.
    fn from(err: ValidationErrors) -> Error {
        Error::InvalidComment(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse_date;
    use crate::post::fixture::post;

    fn blog() -> Blog {
        let mut rust = post("rust", "Learning Rust", "2018-01-05", "Programming", &["rust", "notes"]);
        rust.text = String::from("Ownership and borrowing.");
        Blog::new(
            vec![
                post("hello", "Hello world", "2017-11-25", "Life", &["notes"]),
                rust,
                post("python", "Python tips", "2017-11-02", "Programming", &["python"]),
                post("trip", "A trip", "2017-12-24", "Life", &[]),
            ],
            HashMap::new(),
        )
    }

    fn ids(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_posts_are_ordered() {
        let blog = blog();
        let ids: Vec<&str> = blog.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(vec!["rust", "trip", "hello", "python"], ids);
    }

    #[test]
    fn test_recent() {
        let blog = blog();
        assert_eq!(2, blog.recent(2).len());
        assert_eq!("rust", blog.recent(2)[0].id);
        assert_eq!(4, blog.recent(6).len());
    }

    #[test]
    fn test_archives() {
        let blog = blog();
        assert_eq!(
            vec![
                Month { year: 2018, month: 1 },
                Month { year: 2017, month: 12 },
                Month { year: 2017, month: 11 },
            ],
            blog.archives()
        );
        assert_eq!(
            vec!["hello", "python"],
            ids(&blog.by_month(Month { year: 2017, month: 11 }))
        );
        assert!(blog.by_month(Month { year: 2016, month: 1 }).is_empty());
    }

    #[test]
    fn test_categories() -> Result<()> {
        let blog = blog();
        let categories: Vec<(&str, usize)> = blog
            .categories()
            .iter()
            .map(|c| (c.item.name.as_str(), c.num_posts))
            .collect();
        assert_eq!(vec![("Life", 2), ("Programming", 2)], categories);
        assert_eq!(vec!["rust", "python"], ids(&blog.by_category("programming")?));
        assert!(matches!(
            blog.by_category("cooking"),
            Err(Error::CategoryNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_tags() -> Result<()> {
        let blog = blog();
        let tags: Vec<(&str, usize)> = blog
            .tags()
            .iter()
            .map(|t| (t.item.slug.as_str(), t.num_posts))
            .collect();
        assert_eq!(vec![("notes", 2), ("python", 1), ("rust", 1)], tags);
        assert_eq!(vec!["rust", "hello"], ids(&blog.by_tag("notes")?));
        assert!(matches!(blog.by_tag("go"), Err(Error::TagNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_search() -> Result<()> {
        let blog = blog();
        assert_eq!(vec!["rust"], ids(&blog.search(Some("RUST"))?));
        assert_eq!(vec!["rust"], ids(&blog.search(Some(" borrowing "))?));
        assert_eq!(vec!["trip"], ids(&blog.search(Some("trip"))?));
        assert!(blog.search(Some("haskell"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_without_keyword() {
        let blog = blog();
        assert!(matches!(blog.search(None), Err(Error::MissingKeyword)));
        assert!(matches!(blog.search(Some("  ")), Err(Error::MissingKeyword)));
    }

    #[test]
    fn test_post_comment() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut blog = blog();
        let form = CommentForm {
            name: String::from("Ann"),
            email: String::from("ann@example.org"),
            url: String::new(),
            text: String::from("Nice"),
        };
        let now = parse_date("2018-01-06 10:00")?;

        blog.post_comment("rust", &form, now)?;
        blog.post_comment("rust", &form, now)?;
        assert_eq!(2, blog.comments("rust").len());
        assert!(blog.comments("hello").is_empty());

        assert!(matches!(
            blog.post_comment("missing", &form, now),
            Err(Error::PostNotFound(_))
        ));
        let invalid = CommentForm::default();
        assert!(matches!(
            blog.post_comment("rust", &invalid, now),
            Err(Error::InvalidComment(_))
        ));
        assert_eq!(2, blog.comments("rust").len());
        Ok(())
    }
}
