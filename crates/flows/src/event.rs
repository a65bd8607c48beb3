//! Inbound events and their classification.
//!
//! Commands are typed by users (case-sensitive, with an optional `@BotName`
//! suffix on the command word). Actions arrive only through inline choice
//! payloads the bot itself issued, so a malformed action is a bug, not user
//! error.

use courier_common::{ChatKind, Result, UserIdentity};

/// A message received from the platform, already stripped of transport
/// details.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub message_id: i32,
    pub chat_kind: ChatKind,
    /// Title of the originating chat, when the platform supplies one.
    pub chat_title: Option<String>,
    /// Absent when the event originated from a channel rather than a user.
    pub sender: Option<UserIdentity>,
    pub text: Option<String>,
}

/// An inline-choice selection.
#[derive(Debug, Clone)]
pub struct InboundAction {
    pub from: UserIdentity,
    /// Chat holding the message the choice was attached to.
    pub chat_id: i64,
    /// Id of that message, when still available.
    pub message_id: Option<i32>,
    pub data: String,
}

/// A recognized user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Create(Option<String>),
    Group,
    Join(Option<String>),
}

/// Parse a command from message text. Returns `None` for anything that is
/// not a recognized command, including free text.
pub fn parse_command(text: &str) -> Option<Command> {
    let rest = text.trim().strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let word = parts.next()?;
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    // `/join@SomeBot` addresses a specific bot in a group; the suffix does
    // not change the command.
    let name = word.split('@').next()?;

    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "cancel" => Some(Command::Cancel),
        "create" => Some(Command::Create(arg)),
        "group" => Some(Command::Group),
        "join" => Some(Command::Join(arg)),
        _ => None,
    }
}

/// A decoded action payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Approve { user_id: i64, handle: String },
    Deny { user_id: i64, handle: String },
    Relay { message_id: i32, from_chat: i64, to_chat: i64 },
}

impl Action {
    /// Decode an action payload. `Ok(None)` for payloads this bot never
    /// issues; `Err` when a known verb carries unparseable arguments.
    pub fn parse(data: &str) -> Result<Option<Self>> {
        let mut parts = data.split_whitespace();
        let action = match parts.next() {
            Some("/approve") => {
                let (Some(user_id), Some(handle)) = (parts.next(), parts.next()) else {
                    return Ok(None);
                };
                Self::Approve {
                    user_id: user_id.parse()?,
                    handle: handle.to_string(),
                }
            },
            Some("/deny") => {
                let (Some(user_id), Some(handle)) = (parts.next(), parts.next()) else {
                    return Ok(None);
                };
                Self::Deny {
                    user_id: user_id.parse()?,
                    handle: handle.to_string(),
                }
            },
            Some("/relay") => {
                let (Some(message_id), Some(from_chat), Some(to_chat)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    return Ok(None);
                };
                Self::Relay {
                    message_id: message_id.parse()?,
                    from_chat: from_chat.parse()?,
                    to_chat: to_chat.parse()?,
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(action))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("/start", Command::Start)]
    #[case("/help", Command::Help)]
    #[case("/cancel", Command::Cancel)]
    #[case("/create", Command::Create(None))]
    #[case("/create pluto42", Command::Create(Some("pluto42".into())))]
    #[case("/create   pluto42  ", Command::Create(Some("pluto42".into())))]
    #[case("/group", Command::Group)]
    #[case("/join", Command::Join(None))]
    #[case("/join pluto42", Command::Join(Some("pluto42".into())))]
    #[case("/join@CourierBot pluto42", Command::Join(Some("pluto42".into())))]
    #[case("/group@CourierBot", Command::Group)]
    fn recognizes_commands(#[case] text: &str, #[case] expected: Command) {
        assert_eq!(parse_command(text), Some(expected));
    }

    #[rstest]
    #[case("hello")]
    #[case("/Join pluto42")]
    #[case("/CREATE")]
    #[case("/unknown")]
    #[case("join pluto42")]
    #[case("")]
    fn rejects_non_commands(#[case] text: &str) {
        assert_eq!(parse_command(text), None);
    }

    #[test]
    fn parses_approve_and_deny() {
        assert_eq!(
            Action::parse("/approve 42 pluto42").unwrap(),
            Some(Action::Approve {
                user_id: 42,
                handle: "pluto42".into()
            })
        );
        assert_eq!(
            Action::parse("/deny -7 pluto42").unwrap(),
            Some(Action::Deny {
                user_id: -7,
                handle: "pluto42".into()
            })
        );
    }

    #[test]
    fn parses_relay_triple() {
        assert_eq!(
            Action::parse("/relay 17 100 -100200").unwrap(),
            Some(Action::Relay {
                message_id: 17,
                from_chat: 100,
                to_chat: -100200
            })
        );
    }

    #[test]
    fn unknown_payloads_are_ignored() {
        assert_eq!(Action::parse("model_switch:3").unwrap(), None);
        assert_eq!(Action::parse("/approve").unwrap(), None);
        assert_eq!(Action::parse("").unwrap(), None);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(Action::parse("/approve abc pluto42").is_err());
        assert!(Action::parse("/relay 1 2 xyz").is_err());
    }
}
