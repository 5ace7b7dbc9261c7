//! View boundary: what a front end receives and what it sends back.

use crate::error::ChatError;
use crate::render::RenderableMessage;
use crate::state::Sender;

/// User actions a view dispatches into a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Submit(String),
    /// The retry button on an error message.
    Retry,
    /// The copy button on the transcript entry at this index.
    Copy(usize),
    Clear,
    SetApiKey(String),
    ResetApiKey,
}

/// What the view should do after an event was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Append these messages.
    Show(Vec<(Sender, RenderableMessage)>),
    /// Remove everything displayed, then show this message.
    Reset(RenderableMessage),
    /// Put this text on the clipboard.
    Clipboard(String),
    Nothing,
}

/// Something that displays messages. Implementations own escaping of any
/// markup they embed.
pub trait View {
    fn show(&mut self, sender: Sender, message: &RenderableMessage) -> Result<(), ChatError>;

    fn clear(&mut self);

    /// Apply a reaction; display failures are shown in place of the message.
    fn apply(&mut self, reaction: &Reaction) {
        match reaction {
            Reaction::Show(messages) => {
                for (sender, message) in messages {
                    self.show_or_report(*sender, message);
                }
            }
            Reaction::Reset(message) => {
                self.clear();
                self.show_or_report(Sender::Bot, message);
            }
            Reaction::Clipboard(_) | Reaction::Nothing => {}
        }
    }

    fn show_or_report(&mut self, sender: Sender, message: &RenderableMessage) {
        if let Err(err) = self.show(sender, message) {
            tracing::warn!(error = %err, "failed to display message");
            if let Err(err) = self.show(Sender::Bot, &RenderableMessage::error(err.to_string())) {
                tracing::warn!(error = %err, "failed to display error message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        shown: Vec<(Sender, String)>,
        fail_formatted: bool,
        fail_all: bool,
    }

    impl View for Recorder {
        fn show(&mut self, sender: Sender, message: &RenderableMessage) -> Result<(), ChatError> {
            if self.fail_all || (self.fail_formatted && message.kind() == "formatted") {
                return Err(ChatError::Render("disk full".into()));
            }
            self.shown.push((sender, message.kind().to_string()));
            Ok(())
        }

        fn clear(&mut self) {
            self.shown.clear();
        }
    }

    #[test]
    fn test_apply_show_appends_in_order() {
        let mut view = Recorder::default();
        view.apply(&Reaction::Show(vec![
            (Sender::User, RenderableMessage::plain("q")),
            (Sender::Bot, RenderableMessage::formatted("a")),
        ]));
        assert_eq!(
            view.shown,
            vec![(Sender::User, "plain".into()), (Sender::Bot, "formatted".into())]
        );
    }

    #[test]
    fn test_apply_reset_clears_first() {
        let mut view = Recorder::default();
        view.apply(&Reaction::Show(vec![(Sender::User, RenderableMessage::plain("q"))]));
        view.apply(&Reaction::Reset(RenderableMessage::formatted("# Cleared")));
        assert_eq!(view.shown, vec![(Sender::Bot, "formatted".into())]);
    }

    #[test]
    fn test_display_failure_shows_error() {
        let mut view = Recorder {
            fail_formatted: true,
            ..Default::default()
        };
        view.apply(&Reaction::Show(vec![(Sender::Bot, RenderableMessage::formatted("a"))]));
        assert_eq!(view.shown, vec![(Sender::Bot, "error".into())]);
    }

    #[test]
    fn test_failed_error_fallback_is_swallowed() {
        let mut view = Recorder {
            fail_all: true,
            ..Default::default()
        };
        view.show_or_report(Sender::Bot, &RenderableMessage::formatted("a"));
        assert!(view.shown.is_empty());
    }

    #[test]
    fn test_clipboard_leaves_view_alone() {
        let mut view = Recorder::default();
        view.apply(&Reaction::Clipboard("text".into()));
        view.apply(&Reaction::Nothing);
        assert!(view.shown.is_empty());
    }
}
