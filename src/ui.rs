//! Terminal view with an optional HTML transcript page.
//!
//! Replies are printed as the raw text the model wrote; the rendered HTML of
//! every message goes to the transcript page, rewritten after each message so
//! it can be left open in a browser.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sitepm_core::render::escape_html;
use sitepm_core::{ChatError, RenderableMessage, Sender, View};
use tracing::warn;

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner on stderr while a reply is awaited. Hidden when stderr is not a
/// terminal.
pub fn thinking() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars(SPINNER_CHARS)
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("AI is thinking...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub struct ChatView<W: Write> {
    out: W,
    page: Option<TranscriptPage>,
    shown: usize,
}

struct TranscriptPage {
    path: PathBuf,
    title: String,
    fragments: Vec<String>,
}

impl<W: Write> ChatView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            page: None,
            shown: 0,
        }
    }

    pub fn with_transcript(mut self, path: PathBuf, title: &str) -> Self {
        self.page = Some(TranscriptPage {
            path,
            title: title.to_string(),
            fragments: Vec::new(),
        });
        self
    }

    /// Print text that is not part of the conversation.
    pub fn notice(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            warn!(error = %err, "failed to print notice");
        }
    }

    /// Keep a message the terminal already shows (the user's own input).
    pub fn record(&mut self, sender: Sender, message: &RenderableMessage) {
        self.append(sender, message);
    }

    /// Count the message and mirror it to the page. The count tracks the
    /// session transcript, so a page failure is only logged.
    fn append(&mut self, sender: Sender, message: &RenderableMessage) {
        self.shown += 1;
        if let Some(page) = &mut self.page {
            page.fragments.push(message_div(sender, message));
            if let Err(err) = page.write() {
                warn!(error = %err, "failed to update transcript page");
            }
        }
    }
}

impl<W: Write> View for ChatView<W> {
    fn show(&mut self, sender: Sender, message: &RenderableMessage) -> Result<(), ChatError> {
        let label = match (sender, message) {
            (Sender::User, _) => "you".to_string(),
            (Sender::Bot, RenderableMessage::Error(_)) => "error".to_string(),
            (Sender::Bot, RenderableMessage::Formatted { .. }) => format!("bot [{}]", self.shown),
            (Sender::Bot, _) => "bot".to_string(),
        };
        self.append(sender, message);
        writeln!(self.out, "{label}> {}\n", message.text())
            .map_err(|e| ChatError::Render(e.to_string()))
    }

    fn clear(&mut self) {
        self.shown = 0;
        if let Some(page) = &mut self.page {
            page.fragments.clear();
        }
    }
}

impl TranscriptPage {
    fn write(&self) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ChatError::Render(e.to_string()))?;
        }
        fs::write(&self.path, build_page(&self.title, &self.fragments.concat()))
            .map_err(|e| ChatError::Render(format!("{}: {}", self.path.display(), e)))
    }
}

fn message_div(sender: Sender, message: &RenderableMessage) -> String {
    let error = if matches!(message, RenderableMessage::Error(_)) {
        " error-message"
    } else {
        ""
    };
    format!(
        r#"<div class="message {}-message{}">{}</div>"#,
        sender.as_str(),
        error,
        message.to_html()
    )
}

/// Standalone page wrapping the rendered messages.
pub fn build_page(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#f5f5f2;color:#222;max-width:860px;margin:0 auto;padding:20px}}
.message{{padding:10px 14px;border-radius:10px;margin:10px 0;line-height:1.5}}
.user-message{{background:#fff3d6;margin-left:20%}}
.bot-message{{background:#fff;border:1px solid #ddd;margin-right:10%}}
.error-message{{border-color:#e55}}
.ai-table,.budget-report table{{border-collapse:collapse;margin:8px 0}}
.ai-table td,.ai-table th,.budget-report td{{border:1px solid #ccc;padding:4px 8px}}
.checklist-item{{display:flex;gap:6px;align-items:center}}
button[data-action]{{display:none}}
</style>
</head>
<body>
<h1>{title}</h1>
<div id="chatContainer">{body}</div>
</body>
</html>
"##,
        title = escape_html(title),
        body = body
    )
}
