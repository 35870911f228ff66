//! Defines the [`Post`] type and the date handling shared by post pages, the
//! archive and the feed. See [`Post::to_value`] and [`Post::summarize`] for
//! how posts are converted into template values.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// A single parsed post, ready to be templated.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source file the post was parsed from.
    pub source_path: PathBuf,

    /// The title of the post.
    pub title: String,

    /// The publish date of the post.
    pub date: DateTime<FixedOffset>,

    /// The publish date formatted for humans, e.g. `Apr 25th, 2020`.
    pub formatted_date: String,

    /// The path segment(s) under which the post is published, without
    /// leading or trailing slashes (e.g. `hello-world` or `2020/04/25/1`).
    pub permalink: String,

    /// The permalink prefixed with the configured base path, with a trailing
    /// slash (e.g. `/blog/hello-world/`).
    pub link: String,

    /// The rendered HTML body.
    pub body: String,
}

impl Post {
    /// The publish date as an RFC 3339 timestamp.
    pub fn rfc3339_date(&self) -> String {
        self.date.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Converts the post into a template value. The result is a
    /// [`Value::Object`] with the fields `title`, `link`, `permalink`,
    /// `date`, `formattedDate` and `content`.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("link".to_owned(), Value::String(self.link.clone()));
        m.insert("permalink".to_owned(), Value::String(self.permalink.clone()));
        m.insert("date".to_owned(), Value::String(self.rfc3339_date()));
        m.insert(
            "formattedDate".to_owned(),
            Value::String(self.formatted_date.clone()),
        );
        m.insert("content".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts the post into the reduced value used for neighbour links
    /// (`nextPage`/`prevPage`): `title`, `link`, `permalink` and
    /// `formattedDate`.
    pub fn summarize(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("link".to_owned(), Value::String(self.link.clone()));
        m.insert("permalink".to_owned(), Value::String(self.permalink.clone()));
        m.insert(
            "formattedDate".to_owned(),
            Value::String(self.formatted_date.clone()),
        );
        Value::Object(m)
    }
}

/// Parses a front-matter date. Accepts RFC 3339 timestamps with an offset,
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS` (taken as UTC), and plain
/// `YYYY-MM-DD` dates (UTC midnight). Returns `None` for anything else.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"].iter() {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(utc(naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(utc)
}

fn utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into()
}

/// Formats a date as e.g. `Apr 25th, 2020`.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {}{}, {}",
        date.format("%b"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
