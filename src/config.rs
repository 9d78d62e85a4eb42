//! Loads the project configuration from `blog.yaml` and the theme from
//! `theme/theme.yaml`.

use crate::pagination::DEFAULT_NEIGHBOR_SPAN;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file's name.
pub const PROJECT_FILE: &str = "blog.yaml";

#[derive(Deserialize, Clone)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(3)
    }
}

#[derive(Deserialize)]
struct NeighborSpan(usize);
impl Default for NeighborSpan {
    fn default() -> Self {
        NeighborSpan(DEFAULT_NEIGHBOR_SPAN)
    }
}

#[derive(Deserialize)]
struct RecentPosts(usize);
impl Default for RecentPosts {
    fn default() -> Self {
        RecentPosts(6)
    }
}

#[derive(Deserialize)]
struct ExcerptLength(usize);
impl Default for ExcerptLength {
    fn default() -> Self {
        ExcerptLength(54)
    }
}

fn default_home_page() -> String {
    String::from("index.html")
}

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    site_root: Url,

    #[serde(default = "default_home_page")]
    home_page: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default)]
    neighbor_span: NeighborSpan,

    #[serde(default)]
    recent_posts: RecentPosts,

    #[serde(default)]
    excerpt_length: ExcerptLength,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// Everything needed to build a site, with every path and URL resolved.
pub struct Config {
    pub title: String,
    pub description: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub posts_source_directory: PathBuf,
    pub comments_directory: PathBuf,
    pub index_url: Url,
    pub index_template: Vec<PathBuf>,
    pub index_output_directory: PathBuf,
    pub index_page_size: usize,
    pub neighbor_span: usize,
    pub recent_posts: usize,
    pub excerpt_length: usize,
    pub posts_url: Url,
    pub posts_template: Vec<PathBuf>,
    pub posts_output_directory: PathBuf,
    pub static_url: Url,
    pub static_source_directory: PathBuf,
    pub static_output_directory: PathBuf,
    pub feed_url: Url,
    pub root_output_directory: PathBuf,
}

impl Config {
    /// Finds [`PROJECT_FILE`] in `dir` or the nearest parent directory that
    /// has one and loads it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = find_project_file(dir)?;
        Config::from_project_file(&path, output_directory)
            .with_context(|| format!("Loading configuration `{}`", path.display()))
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            )
        })?;

        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;

        if project.index_page_size.0 < 1 {
            return Err(anyhow!("`index_page_size` must be at least 1"));
        }
        if project.neighbor_span.0 < 1 {
            return Err(anyhow!("`neighbor_span` must be at least 1"));
        }

        let site_root = with_trailing_slash(project.site_root);
        Ok(Config {
            home_page: site_root.join(&project.home_page)?,
            index_url: site_root.join("pages/")?,
            posts_url: site_root.join("posts/")?,
            static_url: site_root.join("static/")?,
            feed_url: site_root.join("feed.atom")?,
            title: project.title,
            description: project.description,
            author: project.author,
            posts_source_directory: project_root.join("posts"),
            comments_directory: project_root.join("comments"),
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_source_directory: theme_dir.join("static"),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("posts"),
            static_output_directory: output_directory.join("static"),
            root_output_directory: output_directory.to_owned(),
            index_page_size: project.index_page_size.0,
            neighbor_span: project.neighbor_span.0,
            recent_posts: project.recent_posts.0,
            excerpt_length: project.excerpt_length.0,
        })
    }
}

/// Searches `dir` and then its ancestors for [`PROJECT_FILE`]. `dir` is made
/// absolute first so a relative path like `.` still reaches its real parents.
pub fn find_project_file(dir: &Path) -> Result<PathBuf> {
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Resolving project directory `{}`", dir.display()))?;
    dir.ancestors()
        .map(|ancestor| ancestor.join(PROJECT_FILE))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            anyhow!(
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            )
        })
}

/// `Url::join` treats the last path segment of a base without a trailing
/// slash as a file name, so the site root always gets one.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).with_context(|| format!("Opening {} file `{}`", kind, path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_directory() -> Result<()> {
        let config = Config::from_directory(Path::new("./testdata/blog/posts"), Path::new("/tmp/out"))?;
        assert_eq!("时光笔记", config.title);
        assert_eq!("https://example.org/blog/index.html", config.home_page.as_str());
        assert_eq!("https://example.org/blog/pages/", config.index_url.as_str());
        assert_eq!("https://example.org/blog/posts/", config.posts_url.as_str());
        assert_eq!("https://example.org/blog/feed.atom", config.feed_url.as_str());
        assert_eq!(PathBuf::from("/tmp/out/pages"), config.index_output_directory);
        assert_eq!(
            std::fs::canonicalize("./testdata/blog/theme/index.html")?,
            config.index_template[0]
        );
        assert_eq!(2, config.index_page_size);
        assert_eq!(2, config.neighbor_span);
        assert_eq!(6, config.recent_posts);
        assert_eq!(Some("admin"), config.author.as_ref().map(|a| a.name.as_str()));
        Ok(())
    }

    #[test]
    fn test_find_project_file_from_subdirectory() -> Result<()> {
        let expected = std::fs::canonicalize("testdata/blog/blog.yaml")?;
        assert_eq!(expected, find_project_file(Path::new("testdata/blog/posts/trip/."))?);
        assert_eq!(expected, find_project_file(Path::new("testdata/blog/posts/trip/.."))?);
        assert!(find_project_file(Path::new("testdata/does-not-exist")).is_err());

        let config = Config::from_directory(Path::new("testdata/blog/posts"), Path::new("/tmp/out"))?;
        assert!(config.posts_source_directory.is_absolute());
        Ok(())
    }

    #[test]
    fn test_missing_project_file() {
        let dir = tempfile::tempdir().unwrap();
        // The temporary directory's ancestors are assumed not to hold a
        // project file either.
        assert!(Config::from_directory(dir.path(), Path::new("/tmp/out")).is_err());
    }

    #[test]
    fn test_with_trailing_slash() -> Result<()> {
        assert_eq!(
            "https://example.org/blog/",
            with_trailing_slash(Url::parse("https://example.org/blog")?).as_str()
        );
        assert_eq!(
            "https://example.org/",
            with_trailing_slash(Url::parse("https://example.org/")?).as_str()
        );
        Ok(())
    }
}
