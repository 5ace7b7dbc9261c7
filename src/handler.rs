use sitepm_core::ViewEvent;

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Event(ViewEvent),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "Commands:
  /retry          resend the last message
  /copy <n>       print the raw reply of transcript entry n
  /clear          erase the conversation
  /key <api-key>  store an OpenRouter API key
  /reset-key      remove the stored API key
  /help           show this help
  /quit           exit";

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Input::Event(ViewEvent::Submit(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "retry" => Input::Event(ViewEvent::Retry),
        "clear" => Input::Event(ViewEvent::Clear),
        "reset-key" => Input::Event(ViewEvent::ResetApiKey),
        "key" if !arg.is_empty() => Input::Event(ViewEvent::SetApiKey(arg.to_string())),
        "copy" => match arg.parse::<usize>() {
            Ok(index) => Input::Event(ViewEvent::Copy(index)),
            Err(_) => Input::Unknown(line.to_string()),
        },
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}
