use pulldown_cmark::{html, Options, Parser};

use super::domain::OutputFormat;

/// Renders a stored value for display.
pub trait TextFormatter: Send + Sync {
    fn format(&self, text: &str, format: OutputFormat) -> String;
}

/// Formatter that never emits active content: scripts, event handlers and unsafe URLs are stripped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SanitizingFormatter;

fn newlines_to_br(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "<br />\n")
}

impl TextFormatter for SanitizingFormatter {
    fn format(&self, text: &str, format: OutputFormat) -> String {
        match format {
            OutputFormat::Raw => text.to_string(),
            OutputFormat::Html => ammonia::clean(text),
            OutputFormat::Auto => newlines_to_br(&ammonia::clean(text)),
            OutputFormat::Plain | OutputFormat::Wiki => newlines_to_br(&html_escape::encode_text(text)),
            OutputFormat::Markdown => {
                let parser = Parser::new_ext(text, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
                let mut out = String::with_capacity(text.len() * 3 / 2);
                html::push_html(&mut out, parser);
                ammonia::clean(&out)
            }
        }
    }
}
