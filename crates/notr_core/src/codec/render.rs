//! HTML rendering of documents.
//!
//! Static markup is what a saved note looks like outside the editor. Live
//! markup additionally draws the decoration widgets, each tagged with its
//! document position so host input can be routed back.

use crate::decoration::{DecorationSet, Widget, WidgetKind};
use crate::model::document::Document;
use crate::model::node::{ImageAttrs, Mark, Node};
use std::fmt::Write;

enum Widgets<'a> {
    None,
    Live(&'a DecorationSet),
}

/// Markup of a stored note, without interactive widgets.
pub fn render_static(doc: &Document) -> String {
    let mut out = String::new();
    render_children(doc.root(), 0, &Widgets::None, &mut out);
    out
}

/// Markup for the live editor, with checkbox toggles and drag handles.
pub fn render_live(doc: &Document, decorations: &DecorationSet) -> String {
    let mut out = String::new();
    render_children(doc.root(), 0, &Widgets::Live(decorations), &mut out);
    out
}

/// Escapes text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn render_children(node: &Node, content_start: usize, widgets: &Widgets<'_>, out: &mut String) {
    let Some(content) = node.content() else {
        return;
    };
    let mut pos = content_start;
    for child in content.iter() {
        render_node(child, pos, widgets, out);
        pos += child.node_size();
    }
}

fn render_node(node: &Node, pos: usize, widgets: &Widgets<'_>, out: &mut String) {
    let inner = pos + 1;
    match node {
        Node::Doc { .. } => render_children(node, inner, widgets, out),
        Node::Paragraph { .. } => wrap("p", node, inner, widgets, out),
        Node::Heading { attrs, .. } => {
            let tag = format!("h{}", attrs.level);
            wrap(&tag, node, inner, widgets, out);
        }
        Node::Blockquote { .. } => wrap("blockquote", node, inner, widgets, out),
        Node::CodeBlock { .. } => {
            out.push_str("<pre><code>");
            render_children(node, inner, widgets, out);
            out.push_str("</code></pre>");
        }
        Node::HorizontalRule => out.push_str("<hr>"),
        Node::HardBreak => out.push_str("<br>"),
        Node::Image { attrs } => render_image(attrs, out),
        Node::BulletList { .. } => wrap("ul", node, inner, widgets, out),
        Node::OrderedList { attrs, .. } => {
            if attrs.order == 1 {
                out.push_str("<ol>");
            } else {
                let _ = write!(out, "<ol start=\"{}\">", attrs.order);
            }
            render_children(node, inner, widgets, out);
            out.push_str("</ol>");
        }
        Node::ListItem { .. } => wrap("li", node, inner, widgets, out),
        Node::TaskList { .. } => {
            out.push_str("<ul class=\"checklist\">");
            render_children(node, inner, widgets, out);
            out.push_str("</ul>");
        }
        Node::TaskItem { .. } => {
            out.push_str("<li>");
            if let Widgets::Live(set) = widgets {
                if set.find(pos, WidgetKind::DragHandle).is_some() {
                    let _ = write!(
                        out,
                        "<div class=\"checklist-drag-handle\" data-pos=\"{pos}\" aria-hidden=\"true\"></div>"
                    );
                }
            }
            render_children(node, inner, widgets, out);
            out.push_str("</li>");
        }
        Node::Checkbox { attrs } => render_checkbox(attrs.checked, pos, widgets, out),
        Node::Text { text, marks } => render_text(text, marks, out),
    }
}

fn wrap(tag: &str, node: &Node, inner: usize, widgets: &Widgets<'_>, out: &mut String) {
    let _ = write!(out, "<{tag}>");
    render_children(node, inner, widgets, out);
    let _ = write!(out, "</{tag}>");
}

fn render_checkbox(checked: bool, pos: usize, widgets: &Widgets<'_>, out: &mut String) {
    let live = match widgets {
        Widgets::Live(set) => set.find(pos, WidgetKind::CheckboxToggle),
        Widgets::None => None,
    };
    match live.map(|decoration| decoration.widget) {
        Some(Widget::CheckboxToggle { checked }) => {
            let checked_attr = if checked { " checked" } else { "" };
            let _ = write!(
                out,
                "<div class=\"checklist-toggle\" aria-hidden=\"true\"><input type=\"checkbox\" class=\"checklist-checkbox\" data-pos=\"{pos}\"{checked_attr}></div>"
            );
        }
        _ => {
            let state = if checked { "checked" } else { "unchecked" };
            let _ = write!(out, "<span class=\"taskbox {state}\"></span>");
        }
    }
}

fn render_image(attrs: &ImageAttrs, out: &mut String) {
    let _ = write!(out, "<img src=\"{}\"", escape_html(&attrs.src));
    if let Some(alt) = &attrs.alt {
        let _ = write!(out, " alt=\"{}\"", escape_html(alt));
    }
    if let Some(title) = &attrs.title {
        let _ = write!(out, " title=\"{}\"", escape_html(title));
    }
    out.push('>');
}

fn render_text(text: &str, marks: &[Mark], out: &mut String) {
    for mark in marks {
        match mark {
            Mark::Link { attrs } => {
                let _ = write!(out, "<a href=\"{}\"", escape_html(&attrs.href));
                if let Some(title) = &attrs.title {
                    let _ = write!(out, " title=\"{}\"", escape_html(title));
                }
                out.push('>');
            }
            Mark::Em => out.push_str("<em>"),
            Mark::Strong => out.push_str("<strong>"),
            Mark::Code => out.push_str("<code>"),
        }
    }
    out.push_str(&escape_html(text));
    for mark in marks.iter().rev() {
        out.push_str(match mark {
            Mark::Link { .. } => "</a>",
            Mark::Em => "</em>",
            Mark::Strong => "</strong>",
            Mark::Code => "</code>",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_html, render_live, render_static};
    use crate::decoration::compute_decorations;
    use crate::model::document::Document;
    use crate::model::node::{Fragment, LinkAttrs, Mark, Node, OrderedListAttrs};
    use crate::model::schema::SchemaId;
    use crate::session::state::DocVersion;

    #[test]
    fn freeform_markup_nests_marks_and_escapes_text() {
        let doc = Document::new(
            SchemaId::Text,
            Node::Doc {
                content: Fragment::from_nodes(vec![
                    Node::Paragraph {
                        content: Fragment::from_nodes(vec![
                            Node::text("a<b "),
                            Node::Text {
                                text: "link".to_string(),
                                marks: vec![
                                    Mark::Link {
                                        attrs: LinkAttrs {
                                            href: "https://x.test/?a=1&b=2".to_string(),
                                            title: None,
                                        },
                                    },
                                    Mark::Strong,
                                ],
                            },
                        ]),
                    },
                    Node::OrderedList {
                        attrs: OrderedListAttrs { order: 3 },
                        content: Fragment::from_nodes(vec![Node::ListItem {
                            content: Fragment::from_nodes(vec![Node::plain_paragraph("x")]),
                        }]),
                    },
                ]),
            },
        )
        .expect("valid");
        assert_eq!(
            render_static(&doc),
            "<p>a&lt;b <a href=\"https://x.test/?a=1&amp;b=2\"><strong>link</strong></a></p>\
             <ol start=\"3\"><li><p>x</p></li></ol>"
        );
    }

    #[test]
    fn static_task_markup_uses_taskbox_spans() {
        let html = render_static(&Document::empty(SchemaId::Task));
        assert_eq!(
            html,
            "<ul class=\"checklist\"><li><span class=\"taskbox unchecked\"></span><p></p></li></ul>"
        );
    }

    #[test]
    fn live_task_markup_carries_widget_positions() {
        let doc = Document::empty(SchemaId::Task);
        let html = render_live(&doc, &compute_decorations(&doc, DocVersion(0)));
        assert!(html.contains("class=\"checklist-drag-handle\" data-pos=\"1\""));
        assert!(html.contains("class=\"checklist-checkbox\" data-pos=\"2\""));
        assert!(!html.contains("taskbox"));
    }

    #[test]
    fn escapes_quotes() {
        assert_eq!(escape_html("\"'"), "&quot;&#39;");
    }
}
