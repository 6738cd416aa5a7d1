#![cfg(feature = "tui")]

//! Terminal rendering of assistant replies: light markdown plus
//! syntax-highlighted fenced code blocks.

use once_cell::sync::Lazy;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME: Lazy<Theme> = Lazy::new(|| {
    let mut themes = ThemeSet::load_defaults();
    themes
        .themes
        .remove("base16-ocean.dark")
        .or_else(|| themes.themes.into_values().next())
        .unwrap_or_default()
});

const INLINE_CODE: Color = Color::Yellow;

/// Render a reply as styled lines. Terminal control sequences in the text
/// are dropped.
pub fn render(content: &str) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut code: Vec<String> = Vec::new();
    let mut lang: Option<String> = None;
    let mut in_code = false;

    for raw in content.split('\n') {
        let line = sanitize(raw);
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_code {
                out.extend(highlight_block(&code, lang.as_deref()));
                code.clear();
                lang = None;
                in_code = false;
            } else {
                in_code = true;
                let rest = rest.trim();
                lang = (!rest.is_empty()).then(|| rest.to_string());
            }
            continue;
        }

        if in_code {
            code.push(line);
        } else {
            out.push(text_line(&line));
        }
    }

    // Unterminated fence: still show the code.
    if in_code {
        out.extend(highlight_block(&code, lang.as_deref()));
    }
    out
}

/// Unstyled lines with control sequences dropped.
pub fn plain(content: &str) -> Vec<Line<'static>> {
    content.split('\n').map(|l| Line::from(sanitize(l))).collect()
}

/// Drop control characters and ANSI escape sequences; expand tabs.
fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => out.push_str("    "),
            '\u{1b}' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    // CSI runs until a final byte in @..~.
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn text_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        let heading = trimmed[hashes..].trim().to_string();
        return Line::from(Span::styled(
            heading,
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ));
    }

    let bullet = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "));
    let (prefix, body) = match bullet {
        Some(rest) => {
            let indent = line.len() - trimmed.len();
            (format!("{}• ", " ".repeat(indent)), rest)
        }
        None => (String::new(), line),
    };

    let mut spans = Vec::new();
    if !prefix.is_empty() {
        spans.push(Span::raw(prefix));
    }
    spans.extend(inline_spans(body));
    Line::from(spans)
}

/// `code` and **bold** runs within a line of prose.
fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, part) in text.split('`').enumerate() {
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(part.to_string(), Style::default().fg(INLINE_CODE)));
            continue;
        }
        for (j, run) in part.split("**").enumerate() {
            if run.is_empty() {
                continue;
            }
            let style = if j % 2 == 1 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(run.to_string(), style));
        }
    }
    spans
}

fn highlight_block(lines: &[String], lang: Option<&str>) -> Vec<Line<'static>> {
    let syntax = lang
        .and_then(find_syntax)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, &THEME);

    lines
        .iter()
        .map(|line| {
            let with_newline = format!("{line}\n");
            match highlighter.highlight_line(&with_newline, &SYNTAX_SET) {
                Ok(ranges) => Line::from(
                    ranges
                        .into_iter()
                        .map(|(style, text)| (style, text.trim_end_matches('\n')))
                        .filter(|(_, text)| !text.is_empty())
                        .map(|(style, text)| Span::styled(text.to_string(), to_ratatui(style)))
                        .collect::<Vec<_>>(),
                ),
                Err(e) => {
                    tracing::debug!(error = %e, "highlighting failed");
                    Line::from(line.clone())
                }
            }
        })
        .collect()
}

fn find_syntax(lang: &str) -> Option<&'static SyntaxReference> {
    SYNTAX_SET
        .find_syntax_by_token(lang)
        .or_else(|| SYNTAX_SET.find_syntax_by_name(lang))
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(lang))
}

fn to_ratatui(style: SyntectStyle) -> Style {
    let fg = style.foreground;
    let mut out = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }
    out
}
