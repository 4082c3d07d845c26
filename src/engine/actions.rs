use crate::api::protocol;
use crate::engine::errors::ArenaError;

/// Команда игрока внутри партии (после того как турнир сверил id партии).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameCommand {
    Ack,
    /// Сырой текст хода, как прислал клиент.
    Move(String),
    Resign,
    /// Текст чата (слова после id партии).
    Say(String),
    /// Любой другой action – отвечаем INFO, не падаем.
    Other(String),
}

impl GameCommand {
    /// Разобрать (ACTION, "<id> ...").
    pub fn parse(action: &str, text: &str) -> Result<Self, ArenaError> {
        let rest = text
            .trim()
            .split_once(' ')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");

        let cmd = match action {
            protocol::ACK => GameCommand::Ack,
            protocol::RESIGN => GameCommand::Resign,
            protocol::MOVE => {
                if rest.is_empty() {
                    return Err(ArenaError::protocol("No move provided"));
                }
                GameCommand::Move(rest.to_string())
            }
            protocol::SAY => GameCommand::Say(protocol::tokens(rest).join(" ")),
            other => GameCommand::Other(other.to_string()),
        };
        Ok(cmd)
    }
}
