//! Rich-text body rendering. Every piece of text is escaped; only the tags
//! produced here reach the page.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

use crate::content::documents::ImageAsset;
use crate::content::image::ImageUrls;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum BodyBlock {
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "image")]
    Image(ImageAsset),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default = "normal_style")]
    pub style: String,
    #[serde(default)]
    pub children: Vec<Span>,
    #[serde(default)]
    pub mark_defs: Vec<MarkDef>,
    #[serde(default)]
    pub list_item: Option<String>,
}

fn normal_style() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
}

fn block_tag(style: &str) -> &'static str {
    match style {
        "h1" => "h1",
        "h2" => "h2",
        "h3" => "h3",
        "h4" => "h4",
        "blockquote" => "blockquote",
        _ => "p",
    }
}

fn list_tag(list_item: &str) -> &'static str {
    match list_item {
        "number" => "ol",
        _ => "ul",
    }
}

/// Links are only emitted for http(s), mailto and site-relative targets.
fn safe_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("https://")
        || lower.starts_with("http://")
        || lower.starts_with("mailto:")
        || (lower.starts_with('/') && !lower.starts_with("//"))
}

fn render_span(span: &Span, mark_defs: &[MarkDef], out: &mut String) {
    let mut closers: Vec<&'static str> = Vec::new();
    for mark in &span.marks {
        let (open, close) = match mark.as_str() {
            "strong" => ("<strong>".to_string(), "</strong>"),
            "em" => ("<em>".to_string(), "</em>"),
            "code" => ("<code>".to_string(), "</code>"),
            "underline" => ("<u>".to_string(), "</u>"),
            "strike-through" => ("<s>".to_string(), "</s>"),
            key => match mark_defs.iter().find(|d| d.key == key) {
                Some(MarkDef {
                    kind,
                    href: Some(href),
                    ..
                }) if kind == "link" && safe_href(href) => (
                    format!(
                        "<a href=\"{}\" rel=\"noopener\">",
                        encode_double_quoted_attribute(href)
                    ),
                    "</a>",
                ),
                _ => continue,
            },
        };
        out.push_str(&open);
        closers.push(close);
    }
    out.push_str(&encode_text(&span.text));
    for close in closers.iter().rev() {
        out.push_str(close);
    }
}

fn render_children(block: &TextBlock, out: &mut String) {
    for span in &block.children {
        render_span(span, &block.mark_defs, out);
    }
}

/// Render blocks to HTML, grouping consecutive list items into lists.
pub fn render(blocks: &[BodyBlock], images: &ImageUrls) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let wanted = match block {
            BodyBlock::Text(TextBlock {
                list_item: Some(kind),
                ..
            }) => Some(list_tag(kind)),
            _ => None,
        };
        if open_list != wanted {
            if let Some(tag) = open_list.take() {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = wanted {
                out.push_str(&format!("<{}>", tag));
                open_list = Some(tag);
            }
        }

        match block {
            BodyBlock::Text(text) if text.list_item.is_some() => {
                out.push_str("<li>");
                render_children(text, &mut out);
                out.push_str("</li>");
            }
            BodyBlock::Text(text) => {
                let tag = block_tag(&text.style);
                out.push_str(&format!("<{}>", tag));
                render_children(text, &mut out);
                out.push_str(&format!("</{}>", tag));
            }
            BodyBlock::Image(image) => {
                if let Some(src) = images.url_for(image, Some(1200)) {
                    out.push_str(&format!(
                        "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></figure>",
                        encode_double_quoted_attribute(&src),
                        encode_double_quoted_attribute(image.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            BodyBlock::Unknown => {}
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

/// Plain text of the first paragraph-ish block, for listing excerpts.
pub fn plain_text(blocks: &[BodyBlock], max_chars: usize) -> String {
    let text: String = blocks
        .iter()
        .filter_map(|b| match b {
            BodyBlock::Text(t) => Some(
                t.children
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<String>(),
            ),
            _ => None,
        })
        .find(|t| !t.trim().is_empty())
        .unwrap_or_default();

    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
