//! HTML-to-plain-text normalization for entry bodies.
//!
//! Entry content arrives from the backend as rich HTML; tool callers get a
//! plain structured text rendering instead, with headings, links, emphasis
//! and lists kept as lightweight markdown-style markers. The conversion is a
//! pure function of the input and idempotent on its own output: plain text
//! with no markup passes through unchanged.
//!
//! A conversion failure is a per-call error reported to the caller; it never
//! takes the process down.

use scraper::{ElementRef, Html, Node};

/// Nesting depth cap while walking the parsed document.
const MAX_DEPTH: usize = 256;

/// Errors raised while normalizing an entry body.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Markup nested deeper than {MAX_DEPTH} levels")]
    NestedTooDeeply,
}

/// Convert an HTML body into plain structured text.
pub fn normalize_html(html: &str) -> Result<String, NormalizeError> {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out, false, 0)?;
    Ok(tidy(&out))
}

fn render_children(
    element: ElementRef,
    out: &mut String,
    pre: bool,
    depth: usize,
) -> Result<(), NormalizeError> {
    if depth > MAX_DEPTH {
        return Err(NormalizeError::NestedTooDeeply);
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if pre {
                    out.push_str(text);
                } else {
                    push_collapsed(out, text);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    render_element(child_element, out, pre, depth + 1)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn render_element(
    element: ElementRef,
    out: &mut String,
    pre: bool,
    depth: usize,
) -> Result<(), NormalizeError> {
    let name = element.value().name();
    match name {
        // Non-content elements are dropped outright
        "script" | "style" | "head" | "title" | "noscript" | "template" => {}

        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let inner = render_inline(element, depth)?;
            out.push_str("\n\n");
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(inner.trim());
            out.push_str("\n\n");
        }

        "p" | "div" | "section" | "article" | "header" | "footer" | "aside" | "figure"
        | "figcaption" | "table" | "tr" => {
            out.push_str("\n\n");
            render_children(element, out, false, depth)?;
            out.push_str("\n\n");
        }

        "br" => out.push('\n'),

        "hr" => out.push_str("\n\n---\n\n"),

        "a" => {
            let inner = render_inline(element, depth)?;
            let inner = inner.trim();
            match element.value().attr("href") {
                Some(href) if !href.is_empty() && !inner.is_empty() => {
                    out.push_str(&format!("[{}]({})", inner, href));
                }
                _ => out.push_str(inner),
            }
        }

        "strong" | "b" => {
            let inner = render_inline(element, depth)?;
            if !inner.trim().is_empty() {
                out.push_str(&format!("**{}**", inner.trim()));
            }
        }

        "em" | "i" => {
            let inner = render_inline(element, depth)?;
            if !inner.trim().is_empty() {
                out.push_str(&format!("*{}*", inner.trim()));
            }
        }

        "ul" | "ol" => {
            render_children(element, out, false, depth)?;
            out.push('\n');
        }

        "li" => {
            let inner = render_inline(element, depth)?;
            out.push('\n');
            out.push_str("- ");
            out.push_str(inner.trim());
        }

        "blockquote" => {
            let inner = render_inline(element, depth)?;
            out.push('\n');
            for line in inner.trim().lines() {
                out.push_str("\n> ");
                out.push_str(line.trim());
            }
            out.push('\n');
        }

        "pre" => {
            let mut inner = String::new();
            render_children(element, &mut inner, true, depth)?;
            out.push_str("\n\n```\n");
            out.push_str(inner.trim_matches('\n'));
            out.push_str("\n```\n\n");
        }

        "code" => {
            if pre {
                render_children(element, out, true, depth)?;
            } else {
                let inner = render_inline(element, depth)?;
                if !inner.trim().is_empty() {
                    out.push_str(&format!("`{}`", inner.trim()));
                }
            }
        }

        "img" => {
            // Keep the alternative text so no content is silently dropped
            if let Some(alt) = element.value().attr("alt") {
                if !alt.trim().is_empty() {
                    out.push_str(alt.trim());
                }
            }
        }

        _ => render_children(element, out, pre, depth)?,
    }
    Ok(())
}

fn render_inline(element: ElementRef, depth: usize) -> Result<String, NormalizeError> {
    let mut inner = String::new();
    render_children(element, &mut inner, false, depth)?;
    Ok(inner)
}

/// Append text with runs of spaces and tabs collapsed. Newlines survive so
/// that already-normalized text stays structurally intact on a second pass.
fn push_collapsed(out: &mut String, text: &str) {
    let mut last_was_space = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
}

/// Trim line edges and cap consecutive blank lines at one.
fn tidy(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }
    lines.join("\n").trim_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_become_markers() {
        let out = normalize_html("<h1>Top</h1><h3>Sub</h3><p>Body text.</p>").unwrap();
        assert_eq!(out, "# Top\n\n### Sub\n\nBody text.");
    }

    #[test]
    fn test_links_keep_target() {
        let out = normalize_html(r#"<p>See <a href="http://a.example">the site</a>.</p>"#).unwrap();
        assert_eq!(out, "See [the site](http://a.example).");
    }

    #[test]
    fn test_emphasis_markers() {
        let out = normalize_html("<p><strong>bold</strong> and <em>soft</em></p>").unwrap();
        assert_eq!(out, "**bold** and *soft*");
    }

    #[test]
    fn test_lists_become_dashes() {
        let out = normalize_html("<ul><li>one</li><li>two</li></ul>").unwrap();
        assert_eq!(out, "- one\n- two");
    }

    #[test]
    fn test_code_blocks_fenced() {
        let out = normalize_html("<pre><code>let x = 1;\nlet y = 2;</code></pre>").unwrap();
        assert_eq!(out, "```\nlet x = 1;\nlet y = 2;\n```");
    }

    #[test]
    fn test_inline_code_backticked() {
        let out = normalize_html("<p>call <code>feeds()</code> first</p>").unwrap();
        assert_eq!(out, "call `feeds()` first");
    }

    #[test]
    fn test_blockquote_prefixed() {
        let out = normalize_html("<blockquote>quoted words</blockquote>").unwrap();
        assert_eq!(out, "> quoted words");
    }

    #[test]
    fn test_script_and_style_dropped() {
        let out =
            normalize_html("<p>keep</p><script>alert(1)</script><style>p{color:red}</style>")
                .unwrap();
        assert_eq!(out, "keep");
    }

    #[test]
    fn test_image_alt_text_kept() {
        let out = normalize_html(r#"<p><img src="x.png" alt="a chart"> trailing</p>"#).unwrap();
        assert_eq!(out, "a chart trailing");
    }

    #[test]
    fn test_no_tags_remain() {
        let html = r#"<div><h2>News</h2><p>A <b>big</b> story about <a href="http://x">x</a>.</p></div>"#;
        let out = normalize_html(html).unwrap();
        assert!(!out.contains('<'));
        assert!(!out.contains('>') || out.starts_with('>'));
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let html = concat!(
            "<h1>Title</h1>",
            "<p>Intro with <em>emphasis</em> and a <a href=\"http://a\">link</a>.</p>",
            "<ul><li>first</li><li>second</li></ul>",
            "<pre>x = 1</pre>",
        );
        let once = normalize_html(html).unwrap();
        let twice = normalize_html(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "Just a plain sentence.";
        assert_eq!(normalize_html(text).unwrap(), text);
    }

    #[test]
    fn test_whitespace_collapsed() {
        let out = normalize_html("<p>spaced   out\t words</p>").unwrap();
        assert_eq!(out, "spaced out words");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_html("").unwrap(), "");
    }

    #[test]
    fn test_pathological_nesting_rejected() {
        let html = format!("{}x{}", "<span>".repeat(400), "</span>".repeat(400));
        assert!(normalize_html(&html).is_err());
    }
}
