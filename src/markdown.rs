//! Converts post bodies from Markdown to HTML. Fenced code blocks whose
//! language `syntect` recognizes are syntax-highlighted with inline styles;
//! everything else goes through [`pulldown_cmark::html::push_html`].

use pulldown_cmark::escape::escape_html;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// The highlighting theme for fenced code blocks.
const THEME: &str = "base16-ocean.dark";

/// Renders Markdown to HTML. Loading the syntax and theme sets is expensive,
/// so one [`Markdown`] is created per build and shared by every post.
pub struct Markdown {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Markdown {
    pub fn new() -> Self {
        Markdown {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Converts `markdown` to HTML.
    pub fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(String, String)> = None;
        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let lang = info.split_whitespace().next().unwrap_or("");
                    code_block = Some((lang.to_owned(), String::new()));
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                    if let Some((lang, code)) = code_block.take() {
                        events.push(Event::Html(CowStr::Boxed(
                            self.code_block(&lang, &code).into_boxed_str(),
                        )));
                    }
                }
                _ => events.push(event),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set.themes.get(THEME)
    }

    fn code_block(&self, lang: &str, code: &str) -> String {
        if !lang.is_empty() {
            if let (Some(syntax), Some(theme)) =
                (self.syntax_set.find_syntax_by_token(lang), self.theme())
            {
                match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
                    Ok(highlighted) => return highlighted,
                    Err(e) => log::warn!("Highlighting `{}` code block: {}", lang, e),
                }
            }
        }

        let mut out = String::new();
        if lang.is_empty() {
            out.push_str("<pre><code>");
        } else {
            out.push_str(r#"<pre><code class="language-"#);
            let _ = escape_html(&mut out, lang);
            out.push_str(r#"">"#);
        }
        let _ = escape_html(&mut out, code);
        out.push_str("</code></pre>\n");
        out
    }
}
