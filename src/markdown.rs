//! Markdown to display HTML for model replies
//!
//! Model output is untrusted. Raw HTML in it is shown as text rather than
//! interpreted, and script-capable link schemes are neutralized. Fenced code
//! is highlighted with class-based spans (`hl-` prefixed) so the widget's
//! stylesheet decides the colors.

#[cfg(test)]
mod proptests;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Class prefix for highlighted spans
const HIGHLIGHT_CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Language class used when the fence language is missing or unknown
const PLAIN_TEXT_LANGUAGE: &str = "plaintext";

/// Renders Markdown to sanitized HTML. Loading the syntax definitions is
/// costly, so build one renderer and share it.
pub struct MarkdownRenderer {
    syntaxes: SyntaxSet,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fenced or indented code collected between its start and end events
struct PendingCode {
    language: Option<String>,
    source: String,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut pending: Option<PendingCode> = None;

        for event in Parser::new_ext(markdown, options) {
            if let Some(code) = pending.as_mut() {
                match event {
                    Event::Text(text) => code.source.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(code) = pending.take() {
                            events.push(Event::Html(self.highlight_block(&code).into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => fence_language(&info),
                        CodeBlockKind::Indented => None,
                    };
                    pending = Some(PendingCode {
                        language,
                        source: String::new(),
                    });
                }
                // Shown literally; the text writer escapes it
                Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url: sanitize_url(dest_url),
                    title,
                    id,
                })),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url: sanitize_url(dest_url),
                    title,
                    id,
                })),
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    /// Resolve a fence language to a syntax, falling back to plain text.
    /// Returns the syntax and the language name used for the CSS class.
    fn resolve_syntax<'s>(&'s self, language: Option<&str>) -> (&'s SyntaxReference, String) {
        language
            .and_then(|lang| {
                self.syntaxes
                    .find_syntax_by_token(lang)
                    .map(|syntax| (syntax, lang.to_ascii_lowercase()))
            })
            .unwrap_or_else(|| {
                (
                    self.syntaxes.find_syntax_plain_text(),
                    PLAIN_TEXT_LANGUAGE.to_string(),
                )
            })
    }

    fn highlight_block(&self, code: &PendingCode) -> String {
        let (syntax, language) = self.resolve_syntax(code.language.as_deref());
        let body = self
            .highlight(syntax, &code.source)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    language = %language,
                    error = %e,
                    "Highlighting failed, emitting plain code"
                );
                escape_text(&code.source)
            });
        format!("<pre><code class=\"language-{language}\">{body}</code></pre>\n")
    }

    fn highlight(&self, syntax: &SyntaxReference, source: &str) -> Result<String, syntect::Error> {
        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntaxes,
            HIGHLIGHT_CLASS_STYLE,
        );
        for line in LinesWithEndings::from(source) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

/// First word of the fence info string, restricted to characters that are
/// safe inside a class attribute
fn fence_language(info: &str) -> Option<String> {
    let token = info.split_whitespace().next()?;
    let token: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
        .collect();
    (!token.is_empty()).then_some(token)
}

/// Replace destinations with schemes that can run script
fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let unsafe_scheme = normalized.starts_with("javascript:")
        || normalized.starts_with("vbscript:")
        || (normalized.starts_with("data:") && !normalized.starts_with("data:image/"));

    if unsafe_scheme {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    html::push_html(&mut out, std::iter::once(Event::Text(text.into())));
    out
}
