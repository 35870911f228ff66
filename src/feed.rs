//! Support for creating Atom feeds from a list of posts. A site may provide
//! its own `atom.xml` layout; otherwise a feed is generated with
//! [`atom_syndication`].

use crate::config::{Author, Site};
use crate::layout::{Error as LayoutError, Layout};
use crate::post::Post;
use atom_syndication::{Content, Entry, Error as AtomError, Feed, Link, Person};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use gtmpl::Value;
use std::collections::HashMap;
use std::io::Write;

/// One feed entry: a projection of a [`Post`].
#[derive(Clone, Debug, PartialEq)]
pub struct FeedItem {
    pub title: String,

    /// The post date as an RFC 3339 timestamp.
    pub date: String,

    pub link: String,
    pub permalink: String,

    /// The rendered HTML body.
    pub content: String,

    updated: DateTime<FixedOffset>,
}

impl From<&Post> for FeedItem {
    fn from(post: &Post) -> FeedItem {
        FeedItem {
            title: post.title.clone(),
            date: post.rfc3339_date(),
            link: post.link.clone(),
            permalink: post.permalink.clone(),
            content: post.body.clone(),
            updated: post.date,
        }
    }
}

impl FeedItem {
    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("date".to_owned(), Value::String(self.date.clone()));
        m.insert("link".to_owned(), Value::String(self.link.clone()));
        m.insert("permalink".to_owned(), Value::String(self.permalink.clone()));
        m.insert("content".to_owned(), Value::String(self.content.clone()));
        Value::Object(m)
    }
}

/// Projects the newest `feed_size` posts into [`FeedItem`]s. `posts` must be
/// ordered newest first; fewer items are returned when there are fewer
/// posts.
pub fn feed_items(posts: &[Post], feed_size: usize) -> Vec<FeedItem> {
    posts.iter().take(feed_size).map(FeedItem::from).collect()
}

/// The feed-level `updated` timestamp: the date of the newest item, or the
/// Unix epoch for an empty feed. Never derived from the clock, so rebuilding
/// unchanged input produces an identical feed.
fn updated(items: &[FeedItem]) -> DateTime<FixedOffset> {
    match items.first() {
        Some(item) => item.updated,
        None => DateTime::<Utc>::default().into(),
    }
}

/// Renders `items` through a user-provided `atom.xml` layout. The layout
/// receives `feeds`, `updated`, and the writer's globals (`site`,
/// `basePath`).
pub fn render_feed(
    layout: &Layout,
    items: &[FeedItem],
    mut globals: HashMap<String, Value>,
) -> Result<String> {
    globals.insert(
        "feeds".to_owned(),
        Value::Array(items.iter().map(FeedItem::to_value).collect()),
    );
    globals.insert(
        "updated".to_owned(),
        Value::String(updated(items).to_rfc3339_opts(SecondsFormat::Secs, false)),
    );
    Ok(layout.render(Value::Object(globals))?)
}

/// Creates a feed from `site` metadata and `items` and writes the result to
/// a [`std::io::Write`]. Used when the site has no `atom.xml` layout.
pub fn write_feed<W: Write>(site: &Site, items: &[FeedItem], w: W) -> Result<()> {
    feed(site, items).write_to(w)?;
    Ok(())
}

fn feed(site: &Site, items: &[FeedItem]) -> Feed {
    let home_page = site.url.clone().unwrap_or_else(|| String::from("/"));
    let mut feed = Feed::default();
    feed.set_title(site.title.clone().unwrap_or_default());
    feed.set_id(home_page.clone());
    feed.set_updated(updated(items));
    feed.set_authors(author_to_people(site.author.as_ref()));
    feed.set_links(vec![alternate(home_page.clone())]);
    feed.set_entries(
        items
            .iter()
            .map(|item| feed_entry(site, &home_page, item))
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn feed_entry(site: &Site, home_page: &str, item: &FeedItem) -> Entry {
    let url = absolute_url(home_page, &item.link);

    let mut content = Content::default();
    content.set_content_type(Some(String::from("html")));
    content.set_value(Some(item.content.clone()));

    let mut entry = Entry::default();
    entry.set_id(url.clone());
    entry.set_title(item.title.clone());
    entry.set_updated(item.updated);
    entry.set_published(Some(item.updated));
    entry.set_authors(author_to_people(site.author.as_ref()));
    entry.set_links(vec![alternate(url)]);
    entry.set_content(Some(content));
    entry
}

/// Post links are site-relative (`/hello/`); the feed wants them absolute
/// when the site URL is known.
fn absolute_url(home_page: &str, link: &str) -> String {
    match link.starts_with('/') && home_page != "/" {
        true => format!("{}{}", home_page.trim_end_matches('/'), link),
        false => link.to_owned(),
    }
}

fn alternate(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name.clone());
            person.set_email(author.email.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

/// The result of a fallible feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants include templating and
/// Atom serialization issues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the `atom.xml` layout fails to render.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Returned when there is an Atom-related error.
    #[error("Writing Atom feed: {0}")]
    Atom(#[from] AtomError),
}
