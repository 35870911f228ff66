//! Loads layout files from the layouts directory and renders them with
//! [`gtmpl`] (Go template syntax).

use gtmpl::Value;
use std::path::{Path, PathBuf};

/// A template file, read once per build and rendered any number of times.
pub struct Layout {
    path: PathBuf,
    source: String,
}

impl Layout {
    /// Reads the layout `name` (e.g. `post.html`) from `layouts_directory`.
    pub fn load(layouts_directory: &Path, name: &str) -> Result<Layout> {
        let path = layouts_directory.join(name);
        let source = std::fs::read_to_string(&path).map_err(|err| Error::Open {
            path: path.clone(),
            err,
        })?;
        Ok(Layout { path, source })
    }

    /// Like [`Layout::load`], but returns `None` when the file doesn't exist.
    pub fn load_optional(layouts_directory: &Path, name: &str) -> Result<Option<Layout>> {
        match layouts_directory.join(name).is_file() {
            true => Layout::load(layouts_directory, name).map(Some),
            false => Ok(None),
        }
    }

    /// Builds a layout directly from its source text.
    pub fn from_source(name: &str, source: &str) -> Layout {
        Layout {
            path: PathBuf::from(name),
            source: source.to_owned(),
        }
    }

    /// Applies the layout to `data`.
    pub fn render(&self, data: Value) -> Result<String> {
        gtmpl::template(&self.source, data).map_err(|e| Error::Render {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

/// The result of a fallible layout operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading or applying a layout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a layout file can't be read.
    #[error("Opening layout file `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the template fails to parse or execute.
    #[error("Rendering layout `{}`: {message}", .path.display())]
    Render { path: PathBuf, message: String },
}
