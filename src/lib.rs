//! The library code for the `nomin` static site generator. A build can be
//! broken down into a few distinct steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`])
//! 2. Writing a page per post plus the home page ([`crate::write`])
//! 3. Writing the Atom feed ([`crate::feed`]) and the archive page
//! 4. Copying static assets over the output
//!
//! Posts are ordered newest first, and each post page links to its
//! neighbours in that order. The home page is simply the newest post,
//! rendered with the same layout and an `index` flag.
//!
//! [`build::build_site`] stitches these together. [`new::create_post`]
//! scaffolds a new post file.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod layout;
pub mod markdown;
pub mod new;
pub mod parser;
pub mod post;
pub mod slug;
pub mod write;
