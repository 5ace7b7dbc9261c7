//! Intermediate line/block representation the formatting stages operate on.

/// A unit of reply text. Replies start out as one `Line` per input line and
/// stages progressively turn lines into structured blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Line(String),
    Table(Table),
    Checklist { checked: bool, text: String },
    List(Vec<String>),
    /// `depth` is the number of `#` markers (1..=3)
    Heading { depth: u8, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
    pub header: bool,
}

impl Block {
    /// Split raw text into one `Line` block per `\n`-separated line.
    pub fn lines(text: &str) -> Vec<Block> {
        text.split('\n').map(|l| Block::Line(l.to_string())).collect()
    }

    /// Apply `f` to every piece of inline text held by this block.
    pub fn map_text(self, f: impl Fn(&str) -> String) -> Block {
        match self {
            Block::Line(text) => Block::Line(f(&text)),
            Block::Table(table) => Block::Table(Table {
                rows: table
                    .rows
                    .into_iter()
                    .map(|row| Row {
                        cells: row.cells.iter().map(|c| f(c.as_str())).collect(),
                        header: row.header,
                    })
                    .collect(),
            }),
            Block::Checklist { checked, text } => Block::Checklist {
                checked,
                text: f(&text),
            },
            Block::List(items) => Block::List(items.iter().map(|i| f(i.as_str())).collect()),
            Block::Heading { depth, text } => Block::Heading {
                depth,
                text: f(&text),
            },
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Block::Line(text) => text.clone(),
            Block::Table(table) => table.to_html(),
            Block::Checklist { checked, text } => format!(
                r#"<div class="checklist-item"><input type="checkbox"{} disabled><span>{}</span></div>"#,
                if *checked { " checked" } else { "" },
                text
            ),
            Block::List(items) => {
                let mut html = String::from("<ul>");
                for item in items {
                    html.push_str("<li>");
                    html.push_str(item);
                    html.push_str("</li>");
                }
                html.push_str("</ul>");
                html
            }
            Block::Heading { depth, text } => {
                // # is the most prominent heading inside a reply, rendered as h2
                let level = depth + 1;
                format!("<h{level}>{text}</h{level}>")
            }
        }
    }
}

impl Table {
    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<table class="ai-table">"#);
        for row in &self.rows {
            let tag = if row.header { "th" } else { "td" };
            html.push_str("<tr>");
            for cell in &row.cells {
                html.push_str(&format!("<{tag}>{cell}</{tag}>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        html
    }
}

/// Join rendered blocks back into one string and convert the newlines between
/// them into paragraph and line breaks.
pub fn join_with_breaks(blocks: &[Block]) -> String {
    let joined = blocks
        .iter()
        .map(Block::to_html)
        .collect::<Vec<_>>()
        .join("\n");

    joined.replace("\n\n", "</p><p>").replace('\n', "<br>")
}
