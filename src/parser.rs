//! Defines the [`Parser`] and [`Error`] types and the logic for loading posts
//! from the file system into memory: front-matter splitting, date parsing,
//! permalink derivation and ordering.

use std::collections::HashMap;
use std::fs::read_dir;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::build::FEED_FILE;
use crate::config::{BuildOptions, ARCHIVE_DIRECTORY};
use crate::markdown::Markdown;
use crate::post::{format_date, parse_date, Post};
use crate::slug::normalize;
use crate::write::INDEX_FILE;

/// The extension that marks a file in the posts directory as a post.
pub const MARKDOWN_EXTENSION: &str = "md";

const FENCE: &str = "---";

/// Loads [`Post`] objects from source files.
pub struct Parser<'a> {
    /// Provides the base path that prefixes every post link.
    options: &'a BuildOptions,

    /// Converts post bodies to HTML.
    markdown: &'a Markdown,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(options: &'a BuildOptions, markdown: &'a Markdown) -> Parser<'a> {
        Parser { options, markdown }
    }

    /// Searches `source_directory` for post files (extension `.md`) and
    /// returns them sorted by date, most recent first. Posts with the same
    /// date keep the order of their file names. Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date`, and optionally
    ///    `permalink`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Post>> {
        let mut sources = Vec::new();
        for result in read_dir(source_directory).map_err(|e| {
            Error::Annotated(
                format!("reading posts directory `{}`", source_directory.display()),
                Box::new(Error::Io(e)),
            )
        })? {
            let entry = result?;
            let path = entry.path();
            if entry.file_type()?.is_file()
                && path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                sources.push(path);
            }
        }
        sources.sort();

        let mut posts = Vec::with_capacity(sources.len());
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for path in sources {
            let post = self.parse_post(&path)?;
            if self.is_reserved(&post.permalink) {
                return Err(Error::ReservedPermalink {
                    permalink: post.permalink,
                    path,
                });
            }
            if let Some(existing) = seen.insert(post.permalink.clone(), path.clone()) {
                return Err(Error::DuplicatePermalink {
                    permalink: post.permalink,
                    path,
                    existing,
                });
            }
            log::debug!("Parsed post `{}` -> {}", path.display(), post.link);
            posts.push(post);
        }

        // `sort_by` is stable, so same-date posts stay in file-name order.
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Reports whether a post published under `permalink` would share a path
    /// with a page or file the build generates itself.
    fn is_reserved(&self, permalink: &str) -> bool {
        let first = permalink.split('/').next().unwrap_or(permalink);
        first == INDEX_FILE
            || first == FEED_FILE
            || (self.options.generate_archive && first == ARCHIVE_DIRECTORY)
    }

    /// Parses a single [`Post`] from the file at `path`.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        match self._parse_post(path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, path: &Path) -> Result<Post> {
        let contents = std::fs::read_to_string(path)?;
        let (yaml, body) = split_frontmatter(&contents)?;
        let frontmatter: Frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let title = match frontmatter.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(Error::MissingTitle),
        };
        let raw_date = frontmatter.date.ok_or(Error::MissingDate)?;
        let date = parse_date(&raw_date).ok_or(Error::InvalidDate(raw_date))?;

        let permalink = match frontmatter.permalink {
            Some(explicit) => explicit_permalink(&explicit)?,
            None => permalink_from_path(path)?,
        };

        Ok(Post {
            source_path: path.to_owned(),
            title,
            formatted_date: format_date(&date),
            date,
            link: link(&self.options.base_path, &permalink),
            permalink,
            body: self.markdown.to_html(body),
        })
    }
}

/// The header of a post file. Every field is optional at the YAML level so
/// that missing fields can be reported by name.
#[derive(Deserialize, Default, Clone, Debug)]
struct Frontmatter {
    /// The title of the post.
    #[serde(default, deserialize_with = "scalar")]
    title: Option<String>,

    /// The date of the post.
    #[serde(default, deserialize_with = "scalar")]
    date: Option<String>,

    /// An explicit permalink overriding the one derived from the file name.
    #[serde(default, deserialize_with = "scalar")]
    permalink: Option<String>,
}

/// Reads any YAML scalar as a string, so that e.g. `title: 2020` or
/// `title: yes` keep their literal text. `null` reads as absent.
fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    use serde_yaml::Value as Yaml;
    match Yaml::deserialize(deserializer)? {
        Yaml::Null => Ok(None),
        Yaml::Bool(b) => Ok(Some(b.to_string())),
        Yaml::Number(n) => Ok(Some(n.to_string())),
        Yaml::String(s) => Ok(Some(s)),
        _ => Err(D::Error::custom("expected a string")),
    }
}

/// Splits a post file into its YAML frontmatter and its body. The first line
/// must be the `---` fence; the frontmatter ends at the next line consisting
/// only of `---`, and the body is everything after that line.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = LineSpans::new(input);

    match lines.next() {
        Some((_, _, line)) if is_fence(line) => {}
        _ => return Err(Error::FrontmatterMissingStartFence),
    }

    let yaml_start = match lines.peek_offset() {
        Some(offset) => offset,
        None => return Err(Error::FrontmatterMissingEndFence),
    };
    for (start, end, line) in lines {
        if is_fence(line) {
            return Ok((&input[yaml_start..start], &input[end..]));
        }
    }
    Err(Error::FrontmatterMissingEndFence)
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Iterates over the lines of a string, yielding each line's start offset,
/// the offset just past its terminator, and its text without the terminator.
struct LineSpans<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> LineSpans<'a> {
    fn new(input: &'a str) -> Self {
        LineSpans { input, offset: 0 }
    }

    fn peek_offset(&self) -> Option<usize> {
        match self.offset < self.input.len() {
            true => Some(self.offset),
            false => None,
        }
    }
}

impl<'a> Iterator for LineSpans<'a> {
    type Item = (usize, usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.input.len() {
            return None;
        }
        let start = self.offset;
        let rest = &self.input[start..];
        let (line, end) = match rest.find('\n') {
            Some(i) => (&rest[..i], start + i + 1),
            None => (rest, self.input.len()),
        };
        self.offset = end;
        Some((start, end, line))
    }
}

fn date_prefix() -> &'static Regex {
    use std::sync::OnceLock;
    static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();
    DATE_PREFIX.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}-").expect("date prefix pattern is valid")
    })
}

/// Derives a permalink from a post's file name: the stem with a leading
/// `YYYY-MM-DD-` removed, normalized into a slug.
fn permalink_from_path(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;
    let permalink = normalize(&date_prefix().replace(stem, ""));
    match permalink.is_empty() {
        true => Err(Error::InvalidPermalink(stem.to_owned())),
        false => Ok(permalink),
    }
}

/// Validates an explicit `permalink` field. Leading and trailing slashes are
/// dropped; the remaining segments must be non-empty and may not be `.` or
/// `..`, so that the output always lands inside the public directory.
fn explicit_permalink(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    let valid = !trimmed.is_empty() && trimmed.split('/').all(is_plain_segment);
    match valid {
        true => Ok(trimmed.to_owned()),
        false => Err(Error::InvalidPermalink(raw.to_owned())),
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

/// Joins the base path and a permalink into the link used in hrefs.
pub fn link(base_path: &str, permalink: &str) -> String {
    format!("{}/{}/", base_path.trim_end_matches('/'), permalink)
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    #[error("Post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    #[error("Missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when the frontmatter has no (or an empty) `title`.
    #[error("Missing required field `title`")]
    MissingTitle,

    /// Returned when the frontmatter has no `date`.
    #[error("Missing required field `date`")]
    MissingDate,

    /// Returned when the `date` field isn't in a supported format.
    #[error("Invalid date `{0}`; expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),

    /// Returned when a permalink is empty or would escape the output
    /// directory.
    #[error("Invalid permalink `{0}`")]
    InvalidPermalink(String),

    /// Returned when a file name isn't valid UTF-8.
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// Returned when two posts resolve to the same permalink.
    #[error(
        "Duplicate permalink `{permalink}` in `{}` (already used by `{}`)",
        .path.display(),
        .existing.display()
    )]
    DuplicatePermalink {
        permalink: String,
        path: PathBuf,
        existing: PathBuf,
    },

    /// Returned when a permalink would be overwritten by the archive page or
    /// the feed, or would shadow the home page.
    #[error(
        "Permalink `{permalink}` in `{}` is reserved for generated output",
        .path.display()
    )]
    ReservedPermalink { permalink: String, path: PathBuf },

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, #[source] Box<Error>),
}
