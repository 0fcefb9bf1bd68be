//! An in-memory chat session on top of [`RelayClient`]
//!
//! The transcript lives only as long as the session. Switching persona starts a fresh
//! conversation, and every message is sent on its own: earlier turns are never replayed to the
//! relay.
use crate::adapter::RelayClient;
use crate::client::HttpClient;
use crate::mode::Mode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
}

impl fmt::Display for ChatEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        write!(f, "{prefix}> {}", self.text)
    }
}

#[derive(Debug)]
pub struct ChatSession<T: HttpClient> {
    client: RelayClient<T>,
    mode: Mode,
    transcript: Vec<ChatEntry>,
}

impl<T: HttpClient + Sync> ChatSession<T> {
    pub fn new(client: RelayClient<T>, mode: Mode) -> Self {
        Self {
            client,
            mode,
            transcript: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Sends `input` with the current persona and records both sides of the exchange.
    ///
    /// Blank input is ignored and yields `None`. Otherwise the bot's entry is returned; it holds
    /// the fallback reply if the relay call failed.
    pub async fn send(&mut self, input: &str) -> Option<&ChatEntry> {
        if input.trim().is_empty() {
            return None;
        }

        let reply = self
            .client
            .complete_or_fallback(input, self.mode.system_prompt())
            .await;

        self.transcript.push(ChatEntry {
            sender: Sender::User,
            text: input.to_string(),
        });
        self.transcript.push(ChatEntry {
            sender: Sender::Bot,
            text: reply,
        });
        self.transcript.last()
    }

    /// Switches persona. A change of persona clears the transcript.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            self.mode = mode;
            self.transcript.clear();
        }
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn render_transcript(&self) -> String {
        self.transcript
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    SetMode(Mode),
    Toggle,
    Clear,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Command::Send(line.to_string());
        }
        match trimmed {
            "/roast" => Command::SetMode(Mode::Roast),
            "/normal" => Command::SetMode(Mode::Normal),
            "/toggle" => Command::Toggle,
            "/clear" => Command::Clear,
            "/history" => Command::History,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type a message and press enter to send it.
  /roast     switch to roast mode (clears the conversation)
  /normal    switch to normal mode (clears the conversation)
  /toggle    switch to the other mode
  /clear     clear the conversation
  /history   print the conversation so far
  /help      show this help
  /quit      leave";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FALLBACK_REPLY;
    use crate::test_utils::MockHttpClient;
    use axum::http::StatusCode;
    use rstest::rstest;

    fn session(mock: &MockHttpClient, mode: Mode) -> ChatSession<MockHttpClient> {
        let client =
            RelayClient::with_client("http://relay.test/roast".parse().unwrap(), mock.clone());
        ChatSession::new(client, mode)
    }

    #[tokio::test]
    async fn blank_input_makes_no_call() {
        let mock = MockHttpClient::new(StatusCode::OK, r#"{"result": "unused"}"#);
        let mut chat = session(&mock, Mode::Normal);

        assert!(chat.send("   \t").await.is_none());
        assert!(chat.send("").await.is_none());
        assert!(mock.get_requests().is_empty());
        assert!(chat.transcript().is_empty());
    }

    #[tokio::test]
    async fn send_records_both_sides_with_mode_prompt() {
        let mock =
            MockHttpClient::new(StatusCode::OK, r#"{"result": "You call that a question?"}"#);
        let mut chat = session(&mock, Mode::Roast);

        let reply = chat.send("How do I sort a list?").await.unwrap().clone();
        assert_eq!(reply.sender, Sender::Bot);
        assert_eq!(reply.text, "You call that a question?");

        assert_eq!(
            chat.transcript(),
            &[
                ChatEntry {
                    sender: Sender::User,
                    text: "How do I sort a list?".into()
                },
                reply,
            ]
        );

        let body = mock.get_requests()[0].json();
        assert_eq!(body["systemPrompt"], Mode::Roast.system_prompt());
        assert_eq!(body["message"], "How do I sort a list?");
    }

    #[tokio::test]
    async fn failed_call_shows_fallback() {
        let mock = MockHttpClient::failing("connection refused");
        let mut chat = session(&mock, Mode::Normal);

        let reply = chat.send("Hello").await.unwrap();
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(chat.transcript().len(), 2);
    }

    #[tokio::test]
    async fn switching_mode_clears_transcript() {
        let mock = MockHttpClient::new(StatusCode::OK, r#"{"result": "hi"}"#);
        let mut chat = session(&mock, Mode::Normal);
        chat.send("Hello").await;

        chat.set_mode(Mode::Normal);
        assert_eq!(chat.transcript().len(), 2, "same mode keeps the conversation");

        assert_eq!(chat.toggle_mode(), Mode::Roast);
        assert!(chat.transcript().is_empty());

        chat.send("Hello again").await;
        let body = mock.get_requests()[1].json();
        assert_eq!(body["systemPrompt"], Mode::Roast.system_prompt());
    }

    #[tokio::test]
    async fn render_transcript_prefixes_senders() {
        let mock = MockHttpClient::new(StatusCode::OK, r#"{"result": "Hi there!"}"#);
        let mut chat = session(&mock, Mode::Normal);
        chat.send("Hello").await;

        assert_eq!(chat.render_transcript(), "you> Hello\nbot> Hi there!");
        chat.clear();
        assert_eq!(chat.render_transcript(), "");
    }

    #[rstest]
    #[case("hello", Command::Send("hello".into()))]
    #[case("  /roast ", Command::SetMode(Mode::Roast))]
    #[case("/normal", Command::SetMode(Mode::Normal))]
    #[case("/toggle", Command::Toggle)]
    #[case("/clear", Command::Clear)]
    #[case("/history", Command::History)]
    #[case("/help", Command::Help)]
    #[case("/exit", Command::Quit)]
    #[case("/dance", Command::Unknown("/dance".into()))]
    fn parses_commands(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(line), expected);
    }
}
