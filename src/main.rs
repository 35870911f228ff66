use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local};
use clap::{ArgAction, Parser, Subcommand};
use nomin::build::build_site;
use nomin::config::{Config, Overrides, Paths};
use nomin::new::{create_post, Error as NewError};

/// nomin - static site generator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Generate the archive page (default: true)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    archive: Option<bool>,

    /// Path the site is served from (default: /)
    #[arg(long = "base-path", alias = "base_path", value_name = "PATH", global = true)]
    base_path: Option<String>,

    /// Number of posts in the Atom feed (default: 5)
    #[arg(long = "feed-size", alias = "feed_size", value_name = "N", global = true)]
    feed_size: Option<usize>,

    /// Log what is being read and written
    #[arg(long, global = true)]
    verbose: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new post in ./posts
    New {
        /// The post title; also used for the file name
        title: Option<String>,
    },
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            archive: self.archive,
            base_path: self.base_path.clone(),
            feed_size: self.feed_size,
        }
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    if let Err(err) = run(args) {
        if let Some(NewError::EmptyTitle) = err.downcast_ref::<NewError>() {
            println!("{}", err);
        } else {
            eprintln!("Error: {:?}", err);
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let paths = Paths::from_current_dir()?;

    match &args.command {
        Some(Command::New { title }) => {
            let now: DateTime<FixedOffset> = Local::now().into();
            let path = create_post(&paths.posts, title.as_deref().unwrap_or_default(), now)?;
            log::info!("Created {}", path.display());
            Ok(())
        }
        None => {
            let config = Config::load(&paths, &args.overrides())?;
            let summary = build_site(&paths, &config.options, &config.site)
                .with_context(|| format!("Building site in `{}`", paths.root.display()))?;
            log::info!(
                "Built {} posts ({} in feed, {} archived, {} static files) into {}",
                summary.posts,
                summary.feed_items,
                summary.archive_items.unwrap_or(0),
                summary.static_files,
                paths.public.display()
            );
            Ok(())
        }
    }
}
