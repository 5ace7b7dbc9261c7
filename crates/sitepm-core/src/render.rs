//! Display-ready messages and their HTML fragments.
//!
//! Action buttons carry a `data-action` attribute instead of inline handlers;
//! the view maps clicks back to a [`crate::ViewEvent`].

use crate::format::format_reply;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableMessage {
    /// Literal text, escaped on render.
    Plain(String),
    /// Formatter output plus the raw reply it was produced from.
    Formatted { html: String, source: String },
    Error(String),
    RiskAssessment { content: String, risks: Vec<String> },
    /// Budget line items in the order they were reported.
    BudgetReport {
        content: String,
        items: Vec<(String, String)>,
    },
}

impl RenderableMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        RenderableMessage::Plain(text.into())
    }

    /// Run a raw reply through the formatter.
    pub fn formatted(raw: impl Into<String>) -> Self {
        let source = raw.into();
        RenderableMessage::Formatted {
            html: format_reply(&source),
            source,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        RenderableMessage::Error(text.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderableMessage::Plain(_) => "plain",
            RenderableMessage::Formatted { .. } => "formatted",
            RenderableMessage::Error(_) => "error",
            RenderableMessage::RiskAssessment { .. } => "risk-assessment",
            RenderableMessage::BudgetReport { .. } => "budget-report",
        }
    }

    /// Text suitable for the clipboard or a plain-text terminal.
    pub fn text(&self) -> &str {
        match self {
            RenderableMessage::Plain(text) | RenderableMessage::Error(text) => text,
            RenderableMessage::Formatted { source, .. } => source,
            RenderableMessage::RiskAssessment { content, .. }
            | RenderableMessage::BudgetReport { content, .. } => content,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            RenderableMessage::Plain(text) => escape_html(text),
            RenderableMessage::Formatted { html, .. } => format!(
                concat!(
                    r#"<div class="formatted-response">"#,
                    r#"<div class="response-header">"#,
                    r#"<button class="copy-button" data-action="copy">"#,
                    r#"<span class="copy-icon">📋</span><span class="copy-text">Copy</span>"#,
                    r#"</button></div>"#,
                    r#"<div class="response-content"><p>{}</p></div>"#,
                    r#"</div>"#
                ),
                html
            ),
            RenderableMessage::Error(text) => format!(
                concat!(
                    r#"<div class="structured-message error">"#,
                    r#"<div class="error-content"><h3>Error</h3><p>{}</p></div>"#,
                    r#"<button class="retry-button" data-action="retry">"#,
                    r#"<span class="retry-icon">🔄</span> Retry</button>"#,
                    r#"</div>"#
                ),
                text
            ),
            RenderableMessage::RiskAssessment { content, risks } => format!(
                r#"<div class="structured-message risk-assessment"><h3>Risk Assessment</h3><p>{}</p>{}</div>"#,
                content,
                risk_list(risks)
            ),
            RenderableMessage::BudgetReport { content, items } => format!(
                r#"<div class="structured-message budget-report"><h3>Budget Report</h3><p>{}</p>{}</div>"#,
                content,
                budget_table(items)
            ),
        }
    }
}

fn risk_list(risks: &[String]) -> String {
    if risks.is_empty() {
        return "<p>No risks identified.</p>".to_string();
    }
    let items: String = risks.iter().map(|r| format!("<li>{r}</li>")).collect();
    format!("<ul>{items}</ul>")
}

fn budget_table(items: &[(String, String)]) -> String {
    if items.is_empty() {
        return "<p>No budget data available.</p>".to_string();
    }
    let rows: String = items
        .iter()
        .map(|(k, v)| format!("<tr><td>{k}</td><td>{v}</td></tr>"))
        .collect();
    format!("<table>{rows}</table>")
}

/// Escape text for use as HTML element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_is_escaped() {
        let msg = RenderableMessage::plain("<b>x</b> & y");
        assert_eq!(msg.to_html(), "&lt;b&gt;x&lt;/b&gt; &amp; y");
        assert_eq!(msg.kind(), "plain");
    }

    #[test]
    fn test_formatted_keeps_source() {
        let msg = RenderableMessage::formatted("**hi**");
        let RenderableMessage::Formatted { html, source } = &msg else {
            panic!("expected formatted message");
        };
        assert_eq!(html, "<strong>hi</strong>");
        assert_eq!(source, "**hi**");
        assert_eq!(msg.text(), "**hi**");
        assert!(msg
            .to_html()
            .contains(r#"<div class="response-content"><p><strong>hi</strong></p></div>"#));
        assert!(msg.to_html().contains(r#"data-action="copy""#));
    }

    #[test]
    fn test_error_has_retry_action() {
        let html = RenderableMessage::error("Error: boom").to_html();
        assert!(html.contains("<h3>Error</h3><p>Error: boom</p>"));
        assert!(html.contains(r#"data-action="retry""#));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn test_risk_assessment() {
        let empty = RenderableMessage::RiskAssessment {
            content: "Checked site".into(),
            risks: vec![],
        };
        assert!(empty.to_html().contains("<p>No risks identified.</p>"));

        let some = RenderableMessage::RiskAssessment {
            content: "Checked site".into(),
            risks: vec!["Open trench".into(), "High wind".into()],
        };
        assert!(some
            .to_html()
            .contains("<ul><li>Open trench</li><li>High wind</li></ul>"));
        assert_eq!(some.kind(), "risk-assessment");
    }

    #[test]
    fn test_budget_report_keeps_item_order() {
        let report = RenderableMessage::BudgetReport {
            content: "Q3".into(),
            items: vec![
                ("Steel".into(), "$40k".into()),
                ("Labor".into(), "$25k".into()),
            ],
        };
        assert!(report.to_html().contains(
            "<table><tr><td>Steel</td><td>$40k</td></tr><tr><td>Labor</td><td>$25k</td></tr></table>"
        ));

        let empty = RenderableMessage::BudgetReport {
            content: "Q3".into(),
            items: vec![],
        };
        assert!(empty.to_html().contains("<p>No budget data available.</p>"));
    }
}
