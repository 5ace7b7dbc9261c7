//! Reply formatting: turns the loosely structured markdown the model replies
//! with into an HTML fragment.
//!
//! The text is split into lines and run through an ordered list of stages.
//! Order matters: bold is applied before bullets and headings, so a heading
//! such as `# **Scope**` keeps its emphasis, and tables are detected before
//! anything else touches the pipe characters. The final step joins the blocks
//! and turns the remaining newlines into `</p><p>` and `<br>`; the caller is
//! expected to wrap the result in a paragraph.

mod block;
mod stages;

pub use block::{join_with_breaks, Block, Row, Table};
pub use stages::{Bold, Bullets, Checklists, Headings, Stage, Tables};

/// An ordered sequence of formatting stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            stages: vec![
                Box::new(Tables),
                Box::new(Checklists),
                Box::new(Bold),
                Box::new(Bullets),
                Box::new(Headings),
            ],
        }
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over the reply and return the structured blocks.
    pub fn blocks(&self, text: &str) -> Vec<Block> {
        self.stages
            .iter()
            .fold(Block::lines(text), |blocks, stage| stage.apply(blocks))
    }

    pub fn run(&self, text: &str) -> String {
        join_with_breaks(&self.blocks(text))
    }
}

/// Format a raw model reply into an HTML fragment.
pub fn format_reply(text: &str) -> String {
    Pipeline::default().run(text)
}
