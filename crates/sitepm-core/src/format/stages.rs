//! The individual reply formatting stages, in the order the pipeline runs them.

use regex::Regex;
use std::sync::LazyLock;

use super::block::{Block, Row, Table};

static CHECKLIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[\sx]\]\s(.+)$").unwrap());

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^- (.+)$").unwrap());

/// Most specific first so `###` is never taken by the `#` rule.
static HEADING_RES: LazyLock<[(u8, Regex); 3]> = LazyLock::new(|| {
    [
        (3, Regex::new(r"^###\s+(.+)$").unwrap()),
        (2, Regex::new(r"^##\s+(.+)$").unwrap()),
        (1, Regex::new(r"^#\s+(.+)$").unwrap()),
    ]
});

/// A single transform over the block sequence.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, blocks: Vec<Block>) -> Vec<Block>;
}

/// Groups contiguous pipe-delimited rows (`|a|b|`) into tables.
///
/// A row is a line whose trimmed form starts and ends with `|`. A markdown
/// separator row (`|---|:-:|`) directly under the first row is dropped and
/// marks that row as the header; anywhere else it is an ordinary row.
pub struct Tables;

impl Tables {
    fn parse_row(line: &str) -> Option<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.len() < 3 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
            return None;
        }
        let inner = &trimmed[1..trimmed.len() - 1];
        Some(inner.split('|').map(|c| c.trim().to_string()).collect())
    }

    fn is_separator(cells: &[String]) -> bool {
        cells.iter().all(|c| {
            !c.is_empty() && c.contains('-') && c.chars().all(|ch| ch == '-' || ch == ':')
        })
    }
}

impl Stage for Tables {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        let mut out = Vec::with_capacity(blocks.len());
        let mut current: Option<Table> = None;

        for block in blocks {
            let cells = match &block {
                Block::Line(line) => Self::parse_row(line),
                _ => None,
            };

            match cells {
                Some(cells) => {
                    let table = current.get_or_insert_with(Table::default);
                    if table.rows.len() == 1 && Self::is_separator(&cells) {
                        table.rows[0].header = true;
                        continue;
                    }
                    table.rows.push(Row {
                        cells,
                        header: false,
                    });
                }
                None => {
                    if let Some(table) = current.take() {
                        out.push(Block::Table(table));
                    }
                    out.push(block);
                }
            }
        }

        if let Some(table) = current.take() {
            out.push(Block::Table(table));
        }
        out
    }
}

/// `[ ] task` and `[x] task` lines become disabled checkboxes.
pub struct Checklists;

impl Stage for Checklists {
    fn name(&self) -> &'static str {
        "checklists"
    }

    fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        blocks
            .into_iter()
            .map(|block| match block {
                Block::Line(line) => {
                    let text = CHECKLIST_RE.captures(&line).map(|caps| caps[1].to_string());
                    match text {
                        Some(text) => Block::Checklist {
                            checked: line.contains("[x]"),
                            text,
                        },
                        None => Block::Line(line),
                    }
                }
                other => other,
            })
            .collect()
    }
}

/// `**text**` spans become `<strong>` in every piece of inline text.
pub struct Bold;

impl Bold {
    pub fn embolden(text: &str) -> String {
        BOLD_RE.replace_all(text, "<strong>$1</strong>").into_owned()
    }
}

impl Stage for Bold {
    fn name(&self) -> &'static str {
        "bold"
    }

    fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        blocks
            .into_iter()
            .map(|block| block.map_text(Self::embolden))
            .collect()
    }
}

/// `- item` lines become list items; contiguous items share one list.
pub struct Bullets;

impl Stage for Bullets {
    fn name(&self) -> &'static str {
        "bullets"
    }

    fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        let mut out = Vec::with_capacity(blocks.len());
        let mut items: Vec<String> = Vec::new();

        for block in blocks {
            let item = match &block {
                Block::Line(line) => BULLET_RE.captures(line).map(|caps| caps[1].to_string()),
                _ => None,
            };
            match item {
                Some(item) => items.push(item),
                None => {
                    if !items.is_empty() {
                        out.push(Block::List(std::mem::take(&mut items)));
                    }
                    out.push(block);
                }
            }
        }

        if !items.is_empty() {
            out.push(Block::List(items));
        }
        out
    }
}

/// `#`, `##` and `###` lines become headings.
pub struct Headings;

impl Stage for Headings {
    fn name(&self) -> &'static str {
        "headings"
    }

    fn apply(&self, blocks: Vec<Block>) -> Vec<Block> {
        blocks
            .into_iter()
            .map(|block| match block {
                Block::Line(line) => HEADING_RES
                    .iter()
                    .find_map(|(depth, re)| {
                        re.captures(&line).map(|caps| Block::Heading {
                            depth: *depth,
                            text: caps[1].to_string(),
                        })
                    })
                    .unwrap_or(Block::Line(line)),
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Block {
        Block::Line(s.to_string())
    }

    fn row(cells: &[&str]) -> Row {
        Row {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            header: false,
        }
    }

    #[test]
    fn test_tables_group_contiguous_rows() {
        let out = Tables.apply(Block::lines("|a|b|\n| c | d |\n|e|f|"));
        assert_eq!(
            out,
            vec![Block::Table(Table {
                rows: vec![row(&["a", "b"]), row(&["c", "d"]), row(&["e", "f"])],
            })]
        );
    }

    #[test]
    fn test_tables_blank_line_splits() {
        let out = Tables.apply(Block::lines("|a|\n\n|b|"));
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], Block::Table(_)));
        assert_eq!(out[1], line(""));
        assert!(matches!(out[2], Block::Table(_)));
    }

    #[test]
    fn test_tables_ignore_prose_pipes() {
        let out = Tables.apply(Block::lines("use a | b | c to pipe"));
        assert_eq!(out, vec![line("use a | b | c to pipe")]);
    }

    #[test]
    fn test_tables_malformed_rows_fall_through() {
        let out = Tables.apply(Block::lines("||\n|x\n|"));
        assert_eq!(out, vec![line("||"), line("|x"), line("|")]);
    }

    #[test]
    fn test_tables_separator_marks_header() {
        let out = Tables.apply(Block::lines("|Task|Owner|\n|---|:---:|\n|Pour|Ana|"));
        let Block::Table(table) = &out[0] else {
            panic!("expected table, got {:?}", out[0]);
        };
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].header);
        assert!(!table.rows[1].header);
    }

    #[test]
    fn test_tables_separator_mid_table_is_a_plain_row() {
        let out = Tables.apply(Block::lines("|Task|Days|\n|Pour|2|\n|---|---|\n|Cure|7|"));
        assert_eq!(
            out,
            vec![Block::Table(Table {
                rows: vec![
                    row(&["Task", "Days"]),
                    row(&["Pour", "2"]),
                    row(&["---", "---"]),
                    row(&["Cure", "7"]),
                ],
            })]
        );
    }

    #[test]
    fn test_tables_leading_separator_kept_as_row() {
        let out = Tables.apply(Block::lines("|---|"));
        assert_eq!(
            out,
            vec![Block::Table(Table {
                rows: vec![row(&["---"])],
            })]
        );
    }

    #[test]
    fn test_checklists() {
        let out = Checklists.apply(Block::lines("[x] done\n[ ] todo\n[X] upper\n[x]"));
        assert_eq!(
            out,
            vec![
                Block::Checklist {
                    checked: true,
                    text: "done".into()
                },
                Block::Checklist {
                    checked: false,
                    text: "todo".into()
                },
                line("[X] upper"),
                line("[x]"),
            ]
        );
    }

    #[test]
    fn test_checklist_checked_when_literal_marker_appears_later() {
        let out = Checklists.apply(Block::lines("[ ] see [x] above"));
        assert_eq!(
            out,
            vec![Block::Checklist {
                checked: true,
                text: "see [x] above".into()
            }]
        );
    }

    #[test]
    fn test_bold() {
        assert_eq!(Bold::embolden("**a** and **b**"), "<strong>a</strong> and <strong>b</strong>");
        assert_eq!(Bold::embolden("**open only"), "**open only");
        assert_eq!(Bold::embolden("**a** **b"), "<strong>a</strong> **b");
        assert_eq!(Bold::embolden("****"), "<strong></strong>");
    }

    #[test]
    fn test_bullets_group_contiguous_items() {
        let out = Bullets.apply(Block::lines("- one\n- two\ntext\n- three"));
        assert_eq!(
            out,
            vec![
                Block::List(vec!["one".into(), "two".into()]),
                line("text"),
                Block::List(vec!["three".into()]),
            ]
        );
    }

    #[test]
    fn test_bullets_need_space_and_text() {
        let out = Bullets.apply(Block::lines("-tight\n- \n--x"));
        assert_eq!(out, vec![line("-tight"), line("- "), line("--x")]);
    }

    #[test]
    fn test_headings_specificity() {
        let out = Headings.apply(Block::lines("### small\n## mid\n# big\n#nospace\n#### four"));
        assert_eq!(
            out,
            vec![
                Block::Heading {
                    depth: 3,
                    text: "small".into()
                },
                Block::Heading {
                    depth: 2,
                    text: "mid".into()
                },
                Block::Heading {
                    depth: 1,
                    text: "big".into()
                },
                line("#nospace"),
                line("#### four"),
            ]
        );
    }

    #[test]
    fn test_stages_leave_structured_blocks_alone() {
        let list = Block::List(vec!["# not a heading".into()]);
        assert_eq!(Headings.apply(vec![list.clone()]), vec![list]);
    }
}
