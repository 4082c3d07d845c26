use crate::domain::{PlayerId, Sessions, Timestamp};
use crate::infra::persistence::GameArchive;

/// Всё, что партия и турнир трогают снаружи за одну операцию:
/// реестр игроков (рассылка, смена состояний), архив и "сейчас".
///
/// Время читается один раз на входе в менеджер и дальше не меняется,
/// так что переход целиком происходит в одной точке времени.
pub struct GameContext<'a> {
    pub sessions: &'a mut Sessions,
    pub archive: &'a mut dyn GameArchive,
    pub now: Timestamp,
}

impl<'a> GameContext<'a> {
    pub fn new(sessions: &'a mut Sessions, archive: &'a mut dyn GameArchive, now: Timestamp) -> Self {
        Self {
            sessions,
            archive,
            now,
        }
    }

    pub fn send(&self, id: PlayerId, action: &str, text: &str) {
        self.sessions.send(id, action, text);
    }
}
