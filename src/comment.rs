//! Comments left on posts. A [`CommentForm`] holds what a reader submitted and
//! is validated into a [`Comment`]. Comments are stored per post in
//! `comments/{post_id}.yaml`.

use chrono::NaiveDateTime;
use gtmpl::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use validator::{validate_email, validate_length};

const MAX_NAME_LENGTH: u64 = 100;
const MAX_EMAIL_LENGTH: u64 = 255;
const PREVIEW_LENGTH: usize = 20;
const COMMENTS_EXTENSION: &str = "yaml";

/// A comment on a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub name: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    pub text: String,
    pub created: NaiveDateTime,

    /// The ID of the post being commented on. Not stored; it's the name of the
    /// file the comment lives in.
    #[serde(skip)]
    pub post: String,
}

impl Comment {
    /// The first few characters of the comment, for log lines and listings.
    pub fn preview(&self) -> String {
        self.text.chars().take(PREVIEW_LENGTH).collect()
    }

    /// Converts a [`Comment`] into a template [`Value`] with fields `name`,
    /// `url`, `text`, and `date`. The email address is omitted.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(self.name.clone()));
        m.insert(
            "url".to_owned(),
            match &self.url {
                Some(url) => Value::String(url.to_string()),
                None => Value::Nil,
            },
        );
        m.insert("text".to_owned(), Value::String(self.text.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(self.created.format("%Y-%m-%d %H:%M").to_string()),
        );
        Value::Object(m)
    }
}

/// The fields a reader submits to leave a comment. `url` may be empty.
#[derive(Clone, Debug, Default)]
pub struct CommentForm {
    pub name: String,
    pub email: String,
    pub url: String,
    pub text: String,
}

impl CommentForm {
    /// Validates the form and builds the [`Comment`] for post `post`. Every
    /// invalid field is reported, not just the first.
    pub fn validate(
        &self,
        post: &str,
        created: NaiveDateTime,
    ) -> std::result::Result<Comment, ValidationErrors> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "This field is required."));
        } else if !validate_length(name, None, Some(MAX_NAME_LENGTH), None) {
            errors.push(FieldError::new(
                "name",
                &format!("Ensure this value has at most {} characters.", MAX_NAME_LENGTH),
            ));
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "This field is required."));
        } else if !validate_length(email, None, Some(MAX_EMAIL_LENGTH), None) {
            errors.push(FieldError::new(
                "email",
                &format!("Ensure this value has at most {} characters.", MAX_EMAIL_LENGTH),
            ));
        } else if !validate_email(email) {
            errors.push(FieldError::new("email", "Enter a valid email address."));
        }

        let url = match parse_url(&self.url) {
            Ok(url) => url,
            Err(()) => {
                errors.push(FieldError::new("url", "Enter a valid URL."));
                None
            }
        };

        let text = self.text.trim();
        if text.is_empty() {
            errors.push(FieldError::new("text", "This field is required."));
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }
        Ok(Comment {
            name: name.to_owned(),
            email: email.to_owned(),
            url,
            text: text.to_owned(),
            created,
            post: post.to_owned(),
        })
    }
}

/// Parses an optional homepage URL. A URL without a scheme is taken to be
/// `http://`.
fn parse_url(input: &str) -> std::result::Result<Option<Url>, ()> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let url = match input.contains("://") {
        true => Url::parse(input),
        false => Url::parse(&format!("http://{}", input)),
    }
    .map_err(|_| ())?;

    match (url.scheme(), url.host_str()) {
        ("http" | "https" | "ftp" | "ftps", Some(host)) if !host.is_empty() => Ok(Some(url)),
        _ => Err(()),
    }
}

/// A problem with one field of a [`CommentForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> FieldError {
        FieldError {
            field,
            message: message.to_owned(),
        }
    }
}

/// Every problem found while validating a [`CommentForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Loads every post's comments from `directory`, keyed by post ID, each list
/// in posting order. A missing directory means there are no comments yet.
pub fn load_comments(directory: &Path) -> Result<HashMap<String, Vec<Comment>>> {
    let mut comments = HashMap::new();
    if !directory.is_dir() {
        return Ok(comments);
    }

    let entries = fs::read_dir(directory).map_err(|err| Error::Io {
        path: directory.to_owned(),
        err,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|err| Error::Io {
                path: directory.to_owned(),
                err,
            })?
            .path();
        if path.extension().map_or(true, |ext| ext != COMMENTS_EXTENSION) {
            continue;
        }
        let post = match path.file_stem().and_then(|s| s.to_str()) {
            Some(post) => post.to_owned(),
            None => continue,
        };

        debug!(path = %path.display(), "loading comments");
        let file = File::open(&path).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
        let mut list: Vec<Comment> =
            serde_yaml::from_reader(file).map_err(|err| Error::Yaml { path, err })?;
        for comment in list.iter_mut() {
            comment.post = post.clone();
        }
        list.sort_by(|a, b| a.created.cmp(&b.created));
        comments.insert(post, list);
    }
    Ok(comments)
}

/// Writes all of a post's comments to `{directory}/{post_id}.yaml`, creating
/// the directory if needed.
pub fn save_comments(directory: &Path, post_id: &str, comments: &[Comment]) -> Result<PathBuf> {
    fs::create_dir_all(directory).map_err(|err| Error::Io {
        path: directory.to_owned(),
        err,
    })?;
    let path = directory.join(format!("{}.{}", post_id, COMMENTS_EXTENSION));
    let file = File::create(&path).map_err(|err| Error::Io {
        path: path.clone(),
        err,
    })?;
    serde_yaml::to_writer(file, comments).map_err(|err| Error::Yaml {
        path: path.clone(),
        err,
    })?;
    Ok(path)
}

/// The result of loading or storing comments.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or storing comments.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems reading or writing a comments file.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when a comments file isn't valid YAML.
    Yaml { path: PathBuf, err: serde_yaml::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "Accessing '{}': {}", path.display(), err),
            Error::Yaml { path, err } => {
                write!(f, "Reading comments '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Yaml { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse_date;

    fn form(name: &str, email: &str, url: &str, text: &str) -> CommentForm {
        CommentForm {
            name: name.to_owned(),
            email: email.to_owned(),
            url: url.to_owned(),
            text: text.to_owned(),
        }
    }

    fn now() -> NaiveDateTime {
        parse_date("2017-11-26 08:00").unwrap()
    }

    #[test]
    fn test_valid_form() -> std::result::Result<(), ValidationErrors> {
        let comment = form(" Ann ", "ann@example.org", "", "Nice post!").validate("hello", now())?;
        assert_eq!("Ann", comment.name);
        assert_eq!(None, comment.url);
        assert_eq!("hello", comment.post);
        assert_eq!(now(), comment.created);
        Ok(())
    }

    #[test]
    fn test_url_without_scheme() -> std::result::Result<(), ValidationErrors> {
        let comment =
            form("Ann", "ann@example.org", "example.org/me", "Hi").validate("hello", now())?;
        assert_eq!(
            Some("http://example.org/me"),
            comment.url.as_ref().map(Url::as_str)
        );
        Ok(())
    }

    #[test]
    fn test_every_invalid_field_is_reported() {
        let errors = form("", "not-an-email", "http://", "  ")
            .validate("hello", now())
            .unwrap_err();
        assert_eq!(vec!["name", "email", "url", "text"], errors.fields());
    }

    #[test]
    fn test_email_validation() {
        let email_errors = |email: &str| {
            form("Ann", email, "", "Hi")
                .validate("hello", now())
                .err()
                .map(|errors| errors.fields())
        };
        assert_eq!(None, email_errors("ann@example.org"));
        assert_eq!(None, email_errors("ann.lee+blog@mail.example.org"));
        assert_eq!(None, email_errors("ann@localhost"));
        for invalid in &[
            "@example.org",
            "ann@@example.org",
            "ann lee@example.org",
            "ann@example..org",
            "a<b>@example.org",
            "ann@-bad-.org",
            "ann@exa_mple.org",
            "ann,lee@example.org",
        ] {
            assert_eq!(Some(vec!["email"]), email_errors(invalid), "{}", invalid);
        }
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@example.org", "a".repeat(250));
        let errors = form("Ann", &email, "", "Hi")
            .validate("hello", now())
            .unwrap_err();
        assert_eq!(vec!["email"], errors.fields());
        assert!(errors.0[0].message.contains("255"));
    }

    #[test]
    fn test_name_too_long() {
        let errors = form(&"x".repeat(101), "ann@example.org", "", "Hi")
            .validate("hello", now())
            .unwrap_err();
        assert_eq!(vec!["name"], errors.fields());
    }

    #[test]
    fn test_preview() -> std::result::Result<(), ValidationErrors> {
        let comment = form("Ann", "ann@example.org", "", "一二三四五六七八九十一二三四五六七八九十多")
            .validate("hello", now())?;
        assert_eq!(20, comment.preview().chars().count());
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let comments_dir = dir.path().join("comments");
        let first = form("Ann", "ann@example.org", "https://ann.example.org", "First")
            .validate("hello", parse_date("2017-11-26 08:00")?)?;
        let second =
            form("Bob", "bob@example.org", "", "Second").validate("hello", parse_date("2017-11-27")?)?;

        save_comments(&comments_dir, "hello", &[second.clone(), first.clone()])?;
        let loaded = load_comments(&comments_dir)?;
        assert_eq!(Some(&vec![first, second]), loaded.get("hello"));
        Ok(())
    }

    #[test]
    fn test_load_missing_directory() -> Result<()> {
        assert!(load_comments(Path::new("./testdata/does-not-exist"))?.is_empty());
        Ok(())
    }
}
