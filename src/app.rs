use std::io::{self, IsTerminal, Stdout, Write};
use std::path::PathBuf;

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use sitepm_core::{
    ChatMessage, Config, FileStore, OpenRouterClient, Reaction, RenderableMessage, Sender,
    Session, Store, View, ViewEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::handler::{parse_input, Input, HELP};
use crate::ui::{self, ChatView};

pub struct App {
    pub session: Session<OpenRouterClient, FileStore>,
    pub view: ChatView<Stdout>,
    /// Prompts go through dialoguer only when stdin is a terminal.
    interactive: bool,
}

impl App {
    pub fn new(config: &Config, state_path: Option<PathBuf>) -> Result<Self> {
        let store = match state_path {
            Some(path) => FileStore::new(path),
            None => FileStore::open_default()?,
        };
        debug!(path = %store.path().display(), "using state file");

        let client = OpenRouterClient::new(&config.base_url, &config.model)
            .with_site(&config.site_url, &config.site_name);
        debug!(model = client.model(), "using model");

        let mut session = Session::new(client, store)
            .with_context_window(config.context_window)
            .with_api_key(config.resolve_api_key());
        session.restore();

        Ok(Self {
            session,
            view: ChatView::new(io::stdout()),
            interactive: io::stdin().is_terminal(),
        })
    }

    pub fn with_transcript(mut self, path: PathBuf, title: &str) -> Self {
        self.view = self.view.with_transcript(path, title);
        self
    }

    /// Interactive loop over stdin until EOF or `/quit`.
    pub async fn run_chat(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let greeting = self.session.greet();
        self.view.apply(&Reaction::Show(vec![(Sender::Bot, greeting)]));

        if !self.session.has_api_key() {
            self.prompt_for_api_key(&mut lines).await?;
        }
        self.view.notice("Type /help for commands.");

        loop {
            prompt("> ")?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line) {
                Input::Quit => break,
                Input::Empty => {}
                Input::Help => self.view.notice(HELP),
                Input::Unknown(cmd) => self.view.notice(&format!("Unknown command: {cmd}")),
                Input::Event(event) => {
                    if !self.confirmed(&event).await? {
                        self.view.notice("Cancelled.");
                        continue;
                    }

                    let spinner = matches!(event, ViewEvent::Submit(_) | ViewEvent::Retry)
                        .then(ui::thinking);
                    let reaction = self.session.handle(event).await;
                    if let Some(spinner) = spinner {
                        spinner.finish_and_clear();
                    }

                    match &reaction {
                        Reaction::Clipboard(text) => self.view.notice(text),
                        // the user's own text is already on screen
                        Reaction::Show(messages) => {
                            for (sender, message) in messages {
                                if *sender == Sender::User {
                                    self.view.record(*sender, message);
                                } else {
                                    self.view.show_or_report(*sender, message);
                                }
                            }
                        }
                        other => self.view.apply(other),
                    }
                    if !self.session.has_api_key() {
                        self.prompt_for_api_key(&mut lines).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Ask before destructive events. Piped input is taken as consent.
    async fn confirmed(&self, event: &ViewEvent) -> Result<bool> {
        let question = match event {
            ViewEvent::Clear => "Are you sure you want to clear the chat history?",
            ViewEvent::ResetApiKey => "Are you sure you want to reset your API key?",
            _ => return Ok(true),
        };
        if !self.interactive {
            return Ok(true);
        }

        let answer = tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(question)
                .default(false)
                .interact()
        })
        .await??;
        Ok(answer)
    }

    async fn prompt_for_api_key(&mut self, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
        let key = if self.interactive {
            tokio::task::spawn_blocking(|| {
                Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("Please enter your OpenRouter API key")
                    .allow_empty_password(true)
                    .interact()
            })
            .await??
        } else {
            prompt("Please enter your OpenRouter API key: ")?;
            lines.next_line().await?.unwrap_or_default()
        };
        let reaction = self.session.handle(ViewEvent::SetApiKey(key)).await;
        self.view.apply(&reaction);
        Ok(())
    }

    /// One question, one reply; returns the reply.
    pub async fn ask(&mut self, question: &str) -> RenderableMessage {
        let spinner = ui::thinking();
        let reply = self.session.send_message(question).await;
        spinner.finish_and_clear();
        reply
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.session.history()
    }

    pub fn set_key(&mut self, key: &str) -> RenderableMessage {
        self.session.set_api_key(key)
    }

    pub fn reset_key(&mut self) -> RenderableMessage {
        self.session.reset_api_key()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.session.clear();
        // clear() only logs store failures; surface them here
        if self.session.store().load_history()?.is_some() {
            anyhow::bail!("conversation history could not be removed");
        }
        Ok(())
    }
}

fn prompt(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(dir: &tempfile::TempDir) -> App {
        let mut app = App::new(&Config::new(), Some(dir.path().join("state.json"))).unwrap();
        app.interactive = false;
        app
    }

    #[tokio::test]
    async fn test_piped_input_consents_to_destructive_events() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        assert!(app.confirmed(&ViewEvent::Clear).await.unwrap());
        assert!(app.confirmed(&ViewEvent::ResetApiKey).await.unwrap());
        assert!(app.confirmed(&ViewEvent::Retry).await.unwrap());
    }

    #[test]
    fn test_clear_removes_stored_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("state.json"));
        store.save_history(&[ChatMessage::user("q")]).unwrap();

        let mut app = app(&dir);
        assert_eq!(app.history().len(), 1);
        app.clear().unwrap();
        assert!(app.history().is_empty());
        assert_eq!(store.load_history().unwrap(), None);
    }
}
