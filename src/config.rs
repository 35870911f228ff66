//! Defines the [`Paths`] of a site project, the optional [`Site`]
//! configuration file, and the [`BuildOptions`] that parameterize a build.

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the optional project file in the site root.
pub const CONFIG_FILE_NAME: &str = "nomin.yaml";

/// The archive page's directory under the public directory.
pub const ARCHIVE_DIRECTORY: &str = "archive";

/// The fixed directory layout of a site project. Every path is derived from
/// the project root; nothing here touches the file system except
/// [`Paths::from_current_dir`], which resolves the root itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    /// The project root, usually the working directory.
    pub root: PathBuf,

    /// Source directory for post files (`{root}/posts`).
    pub posts: PathBuf,

    /// Directory holding `post.html`, `archive.html` and `atom.xml`
    /// (`{root}/layouts`).
    pub layouts: PathBuf,

    /// Output directory for the generated site (`{root}/public`).
    pub public: PathBuf,

    /// Output directory for the archive page (`{root}/public/archive`).
    pub archive: PathBuf,

    /// Directory copied verbatim into [`Paths::public`] (`{root}/static`).
    pub static_assets: PathBuf,

    /// Location of the optional project file (`{root}/nomin.yaml`).
    pub config_file: PathBuf,
}

impl Paths {
    /// Derives the project layout from `root`.
    pub fn new(root: &Path) -> Paths {
        let public = root.join("public");
        Paths {
            root: root.to_owned(),
            posts: root.join("posts"),
            layouts: root.join("layouts"),
            archive: public.join(ARCHIVE_DIRECTORY),
            public,
            static_assets: root.join("static"),
            config_file: root.join(CONFIG_FILE_NAME),
        }
    }

    /// Derives the project layout from the canonicalized working directory.
    /// This is the only way resolving paths can fail.
    pub fn from_current_dir() -> Result<Paths> {
        let cwd = std::env::current_dir()
            .and_then(|dir| dir.canonicalize())
            .map_err(Error::CurrentDir)?;
        Ok(Paths::new(&cwd))
    }
}

/// An author, as listed in the project file and the built-in Atom feed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Site-wide metadata. Every template can reach it as `.site`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Site {
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<Author>,
}

/// Parameters for one build. Resolved once at startup and passed explicitly
/// to the loader and the writers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Whether `{public}/archive/index.html` is generated.
    pub generate_archive: bool,

    /// The path the site is served from; prefixed onto every post link.
    pub base_path: String,

    /// The maximum number of posts in the Atom feed.
    pub feed_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            generate_archive: true,
            base_path: String::from("/"),
            feed_size: 5,
        }
    }
}

/// Build options given explicitly on the command line. `None` means the flag
/// was not passed.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub archive: Option<bool>,
    pub base_path: Option<String>,
    pub feed_size: Option<usize>,
}

/// The on-disk shape of `nomin.yaml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    archive: Option<bool>,

    #[serde(default)]
    base_path: Option<String>,

    #[serde(default)]
    feed_size: Option<usize>,
}

/// The loaded project configuration: site metadata plus the build options
/// after applying the precedence `flags > nomin.yaml > defaults`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub site: Site,
    pub options: BuildOptions,
}

impl Config {
    /// Loads `paths.config_file` if it exists and applies `overrides` on top
    /// of it.
    pub fn load(paths: &Paths, overrides: &Overrides) -> Result<Config> {
        let project = if paths.config_file.is_file() {
            log::debug!("Loading project file `{}`", paths.config_file.display());
            let file = File::open(&paths.config_file).map_err(|err| Error::Open {
                path: paths.config_file.clone(),
                err,
            })?;
            serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
                path: paths.config_file.clone(),
                err,
            })?
        } else {
            Project::default()
        };
        Ok(Config::from_project(project, overrides))
    }

    fn from_project(project: Project, overrides: &Overrides) -> Config {
        let defaults = BuildOptions::default();
        Config {
            site: Site {
                title: project.title,
                url: project.url,
                author: project.author,
            },
            options: BuildOptions {
                generate_archive: overrides
                    .archive
                    .or(project.archive)
                    .unwrap_or(defaults.generate_archive),
                base_path: overrides
                    .base_path
                    .clone()
                    .or(project.base_path)
                    .unwrap_or(defaults.base_path),
                feed_size: overrides
                    .feed_size
                    .or(project.feed_size)
                    .unwrap_or(defaults.feed_size),
            },
        }
    }
}

/// The result of a fallible configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem resolving paths or loading the project file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the working directory can't be resolved.
    #[error("Resolving working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// Returned when the project file exists but can't be opened.
    #[error("Opening project file `{}`: {err}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid YAML or has unknown keys.
    #[error("Parsing project file `{}`: {err}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },
}
