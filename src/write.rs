//! Templating and writing of the HTML pages: one page per post, the home
//! page, and the archive page.

use crate::config::Site;
use crate::layout::{Error as LayoutError, Layout};
use crate::post::Post;
use gtmpl::Value;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// The file name every page directory receives.
pub const INDEX_FILE: &str = "index.html";

/// Responsible for templating and writing HTML pages to disk from [`Post`]
/// sources.
pub struct Writer<'a> {
    /// The layout for post pages and the home page.
    pub post_layout: &'a Layout,

    /// The site's public output directory.
    pub public_directory: &'a Path,

    /// The base path the site is served from. Available to templates as
    /// `basePath`, see [`Writer::globals`].
    pub base_path: &'a str,

    /// Site metadata, available to templates as `site`.
    pub site: &'a Site,
}

impl Writer<'_> {
    /// Writes every post to `{public}/{permalink}/index.html` and the newest
    /// post, flagged with `index`, to `{public}/index.html`. `posts` must be
    /// ordered newest first; each page links to its neighbours in that
    /// order.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        for page in post_pages(posts) {
            let dir = page.output_directory(self.public_directory);
            create_dir(&dir)?;
            self.write_page(&page, false, &dir.join(INDEX_FILE))?;

            if page.is_newest() {
                self.write_page(&page, true, &self.public_directory.join(INDEX_FILE))?;
            }
        }
        if posts.is_empty() {
            log::warn!("No posts found; skipping the home page");
        }
        Ok(())
    }

    /// Renders `archives` through `layout` into
    /// `{archive_directory}/index.html`.
    pub fn write_archive(
        &self,
        layout: &Layout,
        archive_directory: &Path,
        archives: &[ArchiveItem],
    ) -> Result<()> {
        let mut m = self.globals();
        m.insert(
            "archives".to_owned(),
            Value::Array(archives.iter().map(ArchiveItem::to_value).collect()),
        );
        let html = layout.render(Value::Object(m))?;
        create_dir(archive_directory)?;
        write_file(&archive_directory.join(INDEX_FILE), &html)
    }

    /// Takes a single [`Page`], templates it, and writes it to `file_path`.
    fn write_page(&self, page: &Page, index: bool, file_path: &Path) -> Result<()> {
        let mut value = page.to_value(index);
        if let Value::Object(obj) = &mut value {
            obj.extend(self.globals());
        }
        let html = self.post_layout.render(value)?;
        write_file(file_path, &html)
    }

    /// The values every layout receives: `site` and `basePath`. `basePath`
    /// always ends in a slash so that layouts can append to it (e.g.
    /// `{{ .basePath }}atom.xml`).
    pub fn globals(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site".to_owned(), site_to_value(self.site));
        m.insert(
            "basePath".to_owned(),
            Value::String(format!("{}/", self.base_path.trim_end_matches('/'))),
        );
        m
    }
}

/// A post together with its neighbours in newest-first order.
struct Page<'a> {
    /// The post rendered on this page.
    post: &'a Post,

    /// The position of the post, 0 being the newest.
    position: usize,

    /// The next-older post, if any.
    next: Option<&'a Post>,

    /// The next-newer post, if any.
    prev: Option<&'a Post>,
}

impl Page<'_> {
    fn is_newest(&self) -> bool {
        self.position == 0
    }

    fn output_directory(&self, public_directory: &Path) -> PathBuf {
        self.post
            .permalink
            .split('/')
            .fold(public_directory.to_owned(), |dir, segment| dir.join(segment))
    }

    /// Converts a [`Page`] into a [`Value`]: the post's fields (see
    /// [`Post::to_value`]) plus `index`, `nextPage` and `prevPage`.
    fn to_value(&self, index: bool) -> Value {
        let neighbour = |post: Option<&Post>| match post {
            Some(post) => post.summarize(),
            None => Value::Nil,
        };

        let mut value = self.post.to_value();
        if let Value::Object(m) = &mut value {
            m.insert("index".to_owned(), Value::Bool(index));
            m.insert("nextPage".to_owned(), neighbour(self.next));
            m.insert("prevPage".to_owned(), neighbour(self.prev));
        }
        value
    }
}

/// Pairs each post with its neighbours. `next` points one step older (toward
/// the end of the slice) and `prev` one step newer.
fn post_pages(posts: &[Post]) -> impl Iterator<Item = Page<'_>> {
    posts.iter().enumerate().map(move |(i, post)| Page {
        post,
        position: i,
        next: posts.get(i + 1),
        prev: match i {
            0 => None,
            _ => posts.get(i - 1),
        },
    })
}

/// One line of the archive page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveItem {
    pub title: String,
    pub formatted_date: String,
    pub link: String,
    pub permalink: String,
}

impl From<&Post> for ArchiveItem {
    fn from(post: &Post) -> ArchiveItem {
        ArchiveItem {
            title: post.title.clone(),
            formatted_date: post.formatted_date.clone(),
            link: post.link.clone(),
            permalink: post.permalink.clone(),
        }
    }
}

impl ArchiveItem {
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert(
            "formattedDate".to_owned(),
            Value::String(self.formatted_date.clone()),
        );
        m.insert("link".to_owned(), Value::String(self.link.clone()));
        m.insert("permalink".to_owned(), Value::String(self.permalink.clone()));
        Value::Object(m)
    }
}

/// Converts [`Site`] metadata into a template value. Missing fields become
/// empty strings so that templates can test them with `if`.
pub fn site_to_value(site: &Site) -> Value {
    let string = |s: &Option<String>| Value::String(s.clone().unwrap_or_default());
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), string(&site.title));
    m.insert("url".to_owned(), string(&site.url));
    let (author, email) = match &site.author {
        Some(author) => (Some(author.name.clone()), author.email.clone()),
        None => (None, None),
    };
    m.insert("author".to_owned(), string(&author));
    m.insert("email".to_owned(), string(&email));
    Value::Object(m)
}

/// Creates `dir` and its parents unless it already exists.
pub fn create_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

/// Writes `contents` to `path`, replacing any existing file.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    log::debug!("Writing `{}`", path.display());
    std::fs::write(path, contents).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error during templating.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// An error writing the output files.
    #[error("Writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
