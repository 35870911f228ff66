//! Scaffolds new post files.

use crate::parser::MARKDOWN_EXTENSION;
use crate::slug::normalize;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Creates `{posts_directory}/{YYYY-MM-DD}-{slug}.md` for `title`, dated
/// `now`, with a frontmatter skeleton and an empty body. The title is
/// rejected before anything touches the disk if it has no alphanumeric
/// characters. Existing files are never overwritten. Returns the path of the
/// new file.
pub fn create_post(
    posts_directory: &Path,
    title: &str,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf> {
    let slug = normalize(title);
    if slug.is_empty() {
        return Err(Error::EmptyTitle);
    }

    let path = posts_directory.join(format!(
        "{}-{}.{}",
        now.format("%Y-%m-%d"),
        slug,
        MARKDOWN_EXTENSION
    ));
    let contents = format!(
        "---\ntitle: {}\ndate: {}\n---\n",
        slug,
        now.to_rfc3339_opts(SecondsFormat::Secs, false)
    );

    std::fs::create_dir_all(posts_directory).map_err(|err| Error::Io {
        path: posts_directory.to_owned(),
        err,
    })?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(path.clone()),
            _ => Error::Io {
                path: path.clone(),
                err,
            },
        })?;
    file.write_all(contents.as_bytes()).map_err(|err| Error::Io {
        path: path.clone(),
        err,
    })?;
    log::debug!("Created `{}`", path.display());
    Ok(path)
}

/// The result of a fallible post-creation operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a post.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the title is missing or has nothing to build a file name
    /// from.
    #[error("nomin new requires title")]
    EmptyTitle,

    /// Returned when a post with the same date and slug already exists.
    #[error("Post `{}` already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Returned for I/O errors creating the file.
    #[error("Creating `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}
