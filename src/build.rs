//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), rendering post pages and the home page
//! ([`crate::write`]), generating the Atom feed ([`crate::feed`]), rendering
//! the archive, and copying the static source directory into the output
//! directory.

use crate::config::{BuildOptions, Paths, Site};
use crate::feed::{self, Error as FeedError};
use crate::layout::{Error as LayoutError, Layout};
use crate::markdown::Markdown;
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::write::{self, ArchiveItem, Error as WriteError, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The layout for post pages and the home page.
pub const POST_LAYOUT: &str = "post.html";

/// The layout for the archive page.
pub const ARCHIVE_LAYOUT: &str = "archive.html";

/// The optional layout for the Atom feed.
pub const FEED_LAYOUT: &str = "atom.xml";

/// The feed's file name in the public directory.
pub const FEED_FILE: &str = "atom.xml";

/// What a build produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// The number of post pages written.
    pub posts: usize,

    /// The number of entries in the feed.
    pub feed_items: usize,

    /// The number of entries on the archive page; `None` when the archive
    /// is disabled.
    pub archive_items: Option<usize>,

    /// The number of static files copied.
    pub static_files: usize,
}

/// Builds the site described by `paths` with the given `options`. This calls
/// into [`PostParser::parse_posts`], [`Writer::write_posts`],
/// [`Writer::write_archive`] and the [`feed`] module, which do the
/// heavy-lifting, and finally copies the static assets into the public
/// directory, overwriting any generated file with the same name.
///
/// Every step completes before the next one starts. The first failure aborts
/// the build; files written by earlier steps are left in place.
pub fn build_site(paths: &Paths, options: &BuildOptions, site: &Site) -> Result<BuildSummary> {
    // Load the layouts up front so a missing one fails before anything is
    // written.
    let post_layout = Layout::load(&paths.layouts, POST_LAYOUT)?;
    let archive_layout = match options.generate_archive {
        true => Some(Layout::load(&paths.layouts, ARCHIVE_LAYOUT)?),
        false => None,
    };
    let feed_layout = Layout::load_optional(&paths.layouts, FEED_LAYOUT)?;

    // collect all posts
    let markdown = Markdown::new();
    let posts = PostParser::new(options, &markdown).parse_posts(&paths.posts)?;

    write::create_dir(&paths.public)?;

    // write the post pages and the home page
    let writer = Writer {
        post_layout: &post_layout,
        public_directory: &paths.public,
        base_path: &options.base_path,
        site,
    };
    writer.write_posts(&posts)?;

    // create the atom feed
    let items = feed::feed_items(&posts, options.feed_size);
    let feed_path = paths.public.join(FEED_FILE);
    match &feed_layout {
        Some(layout) => {
            let xml = feed::render_feed(layout, &items, writer.globals())?;
            write::write_file(&feed_path, &xml)?;
        }
        None => {
            log::debug!("No `{}` layout; generating the default feed", FEED_LAYOUT);
            let file = File::create(&feed_path).map_err(|err| Error::Io {
                path: feed_path.clone(),
                err,
            })?;
            feed::write_feed(site, &items, file)?;
        }
    }

    // write the archive page
    let archive_items = match &archive_layout {
        Some(layout) => {
            let archives: Vec<ArchiveItem> = posts.iter().map(ArchiveItem::from).collect();
            writer.write_archive(layout, &paths.archive, &archives)?;
            Some(archives.len())
        }
        None => None,
    };

    // copy static directory
    let static_files = match paths.static_assets.is_dir() {
        true => copy_dir(&paths.static_assets, &paths.public)?,
        false => {
            log::debug!(
                "No static directory at `{}`; nothing to copy",
                paths.static_assets.display()
            );
            0
        }
    };

    Ok(BuildSummary {
        posts: posts.len(),
        feed_items: items.len(),
        archive_items,
        static_files,
    })
}

/// Recursively copies the contents of `src` into `dst`, overwriting existing
/// files. Symlinks are followed, so a linked directory is copied as a real
/// one. Returns the number of files copied.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for result in WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = result?;
        // strip_prefix() should never fail since `src` is the walk's root
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            write::create_dir(&target)?;
        } else {
            log::debug!("Copying `{}` -> `{}`", entry.path().display(), target.display());
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                path: entry.path().to_owned(),
                err,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, writing,
/// templating, feed generation, copying static files, and other I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors during parsing.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Returned for errors writing pages to disk.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned for errors loading layout files.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Returned for errors writing the feed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Returned for errors copying a static file.
    #[error("Copying static file `{}`: {err}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for errors walking the static directory.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error("Writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}
