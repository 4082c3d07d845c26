// src/tournament/lobby.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::api::protocol;
use crate::api::queries::TournamentSummary;
use crate::chess::{GameRecord, RecordError};
use crate::domain::tournament::MAX_NAME_LEN;
use crate::domain::{
    Player, PlayerHandle, PlayerId, PlayerState, Sessions, Standing, Timestamp, Tournament,
    TournamentConfig,
};
use crate::engine::{ArenaError, Game, GameContext, RandomSource};
use crate::infra::{Clock, GameArchive, SystemRng};

/// Верхний уровень координатора:
/// - хранит турниры по имени;
/// - владеет реестром подключённых игроков;
/// - разбирает входящие строки и маршрутизирует их;
/// - гоняет периодические проходы (пары, таймауты, часы);
/// - пишет завершённые партии в архив и восстанавливает их при старте.
///
/// Все мутации идут через `&mut self`, то есть строго по одной.
pub struct Manager<R: RandomSource = SystemRng> {
    tournaments: BTreeMap<String, Tournament>,
    sessions: Sessions,
    archive: Box<dyn GameArchive + Send>,
    clock: Box<dyn Clock + Send>,
    rng: R,
}

impl Manager<SystemRng> {
    pub fn new(archive: Box<dyn GameArchive + Send>, clock: Box<dyn Clock + Send>) -> Self {
        Self::with_rng(archive, clock, SystemRng)
    }
}

impl<R: RandomSource> Manager<R> {
    pub fn with_rng(
        archive: Box<dyn GameArchive + Send>,
        clock: Box<dyn Clock + Send>,
        rng: R,
    ) -> Self {
        Self {
            tournaments: BTreeMap::new(),
            sessions: Sessions::new(),
            archive,
            clock,
            rng,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ---------- турниры ----------

    /// Создать турнир.
    ///
    /// Имя: после trim от 1 до 49 символов, без пробелов, не занято.
    pub fn create_tournament(
        &mut self,
        name: &str,
        games_per_pair: u32,
        time_limit: f64,
        increment: f64,
    ) -> Result<(), ArenaError> {
        let config = TournamentConfig::new(games_per_pair, time_limit, increment);
        let now = self.clock.now();
        self.register_tournament(name, config, now)
    }

    fn register_tournament(
        &mut self,
        name: &str,
        config: TournamentConfig,
        created_at: Timestamp,
    ) -> Result<(), ArenaError> {
        let name = name.trim();
        let len = name.chars().count();
        if len == 0 || len >= MAX_NAME_LEN {
            return Err(ArenaError::config(
                "Tournament name must be between 1 and 50 characters",
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ArenaError::config("Bad tournament name"));
        }
        if self.tournaments.contains_key(name) {
            return Err(ArenaError::config(format!(
                "Tournament of name {name} already exists"
            )));
        }
        config.validate()?;

        info!(
            tournament = name,
            games_per_pair = config.games_per_pair,
            time_control = %config.time_control,
            "tournament created"
        );
        self.tournaments
            .insert(name.to_string(), Tournament::new(name, config, created_at));
        Ok(())
    }

    pub fn tournament(&self, name: &str) -> Option<&Tournament> {
        self.tournaments.get(name)
    }

    pub fn tournaments(&self) -> impl Iterator<Item = &Tournament> {
        self.tournaments.values()
    }

    pub fn standings(&self, name: &str) -> Option<BTreeMap<String, Standing>> {
        self.tournaments.get(name).map(Tournament::standings)
    }

    /// Сводки по всем турнирам (для `--report`).
    pub fn summaries(&self) -> Vec<TournamentSummary> {
        self.tournaments
            .values()
            .map(TournamentSummary::from_tournament)
            .collect()
    }

    /// Поиск партии по всем турнирам.
    pub fn game_for_id(&self, game_id: &str) -> Option<&Game> {
        self.tournaments.values().find_map(|t| t.game(game_id))
    }

    // ---------- игроки ----------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Новое подключение: игрок в состоянии Connecting.
    pub fn player_connected(&mut self, id: PlayerId, handle: Box<dyn PlayerHandle>) {
        debug!(player = id, "player connected");
        self.sessions.insert(Player::new(id, handle));
    }

    /// Подключение закрыто: выйти из турнира (форфейт текущей партии)
    /// и отписаться от всех наблюдаемых партий.
    pub fn player_disconnected(&mut self, id: PlayerId) {
        let Some(player) = self.sessions.remove(id) else {
            return;
        };
        debug!(player = id, name = player.display_name(), "player disconnected");

        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);

        if let Some(t) = player
            .tournament
            .as_ref()
            .and_then(|name| tournaments.get_mut(name))
        {
            t.remove_player(&mut ctx, &player);
        }

        for game_id in &player.observing_games {
            if let Some(game) = tournaments.values_mut().find_map(|t| t.game_mut(game_id)) {
                game.remove_observer(&mut ctx, id);
            }
        }
    }

    // ---------- входящие сообщения ----------

    /// Сырая строка от транспорта.
    ///
    /// Ошибки Config/Protocol/NotFound: игрок получает INFO с текстом ошибки,
    /// после чего соединение закрывается.
    pub fn receive_line(&mut self, id: PlayerId, line: &str) {
        let Some((action, text)) = protocol::parse_line(line) else {
            return;
        };
        self.receive(id, &action, &text);
    }

    /// То же для уже разобранной пары (message-framed транспорт).
    pub fn receive(&mut self, id: PlayerId, action: &str, text: &str) {
        let action = action.to_uppercase();
        if let Err(err) = self.dispatch(id, &action, text.trim()) {
            self.sessions.send(id, protocol::INFO, &err.to_string());
            if err.is_fatal() {
                warn!(player = id, action = %action, error = %err, "closing connection");
                self.sessions.force_disconnect(id);
            }
        }
    }

    /// Маршрутизация по состоянию игрока.
    pub fn dispatch(&mut self, id: PlayerId, action: &str, text: &str) -> Result<(), ArenaError> {
        let parts = protocol::tokens(text);

        match action {
            protocol::DISCONNECT => {
                self.sessions.force_disconnect(id);
                return Ok(());
            }
            protocol::WATCH | protocol::UNWATCH => {
                if parts.len() != 1 {
                    return Err(ArenaError::protocol("Bad game id"));
                }
                return self.watch(id, parts[0], action == protocol::WATCH);
            }
            _ => {}
        }

        let player = self
            .sessions
            .get(id)
            .ok_or_else(|| ArenaError::not_found(format!("Player {id} is not connected")))?;

        if player.state == PlayerState::Connecting {
            if action != protocol::JOIN {
                return Err(ArenaError::protocol("First message must be a JOIN or WATCH"));
            }
            if parts.len() != 2 {
                return Err(ArenaError::protocol("Bad name or tournament"));
            }
            let (tournament_name, name) = (parts[0], parts[1]);
            if name.chars().count() >= MAX_NAME_LEN {
                return Err(ArenaError::protocol("Player name too long"));
            }
            return self.join(id, tournament_name, name);
        }

        let tournament_name = player
            .tournament
            .clone()
            .ok_or_else(|| ArenaError::protocol("Player is not in a tournament"))?;

        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let tournament = tournaments
            .get_mut(&tournament_name)
            .ok_or_else(|| ArenaError::not_found(format!("Tournament {tournament_name} not found")))?;
        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);
        tournament.route_message(&mut ctx, id, action, text)
    }

    fn join(&mut self, id: PlayerId, tournament_name: &str, name: &str) -> Result<(), ArenaError> {
        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let tournament = tournaments.get_mut(tournament_name).ok_or_else(|| {
            ArenaError::protocol(format!("Tournament {tournament_name} not found"))
        })?;
        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);
        tournament.add_player(&mut ctx, id, name)
    }

    fn watch(&mut self, id: PlayerId, game_id: &str, attach: bool) -> Result<(), ArenaError> {
        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let game = tournaments
            .values_mut()
            .find_map(|t| t.game_mut(game_id))
            .ok_or_else(|| ArenaError::not_found(format!("No game found with id {game_id}")))?;

        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);
        if attach {
            game.add_observer(&mut ctx, id);
        } else {
            game.remove_observer(&mut ctx, id);
        }
        Ok(())
    }

    // ---------- периодические проходы ----------

    /// Подбор пар (раз в 3 секунды).
    pub fn sweep_pairings(&mut self) {
        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            rng,
            ..
        } = self;
        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);
        for t in tournaments.values_mut() {
            t.update_pairings(&mut ctx, rng);
        }
    }

    /// Таймауты ACK и флаги (раз в секунду).
    pub fn sweep_timeouts(&mut self) {
        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let mut ctx = GameContext::new(sessions, archive.as_mut(), now);
        for t in tournaments.values_mut() {
            t.check_timeouts(&mut ctx);
        }
    }

    /// CLOCK_UPDATE по идущим партиям (раз в 5 секунд).
    pub fn sweep_clocks(&mut self) {
        let now = self.clock.now();
        let Self {
            tournaments,
            sessions,
            archive,
            ..
        } = self;
        let ctx = GameContext::new(sessions, archive.as_mut(), now);
        for t in tournaments.values() {
            t.send_clock_updates(&ctx);
        }
    }

    // ---------- архив ----------

    /// Реплей архива. Первая запись турнира задаёт его конфиг.
    ///
    /// На первой битой записи чтение потока прекращается, всё прочитанное
    /// до неё остаётся. Возвращает число восстановленных партий.
    pub fn load_history<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = Result<GameRecord, RecordError>>,
    {
        let mut loaded = 0;
        for record in records {
            let restored = record.and_then(|r| self.restore_record(&r));
            if let Err(err) = restored {
                warn!(error = %err, loaded, "stopping history replay at malformed record");
                break;
            }
            loaded += 1;
        }
        info!(games = loaded, tournaments = self.tournaments.len(), "history loaded");
        loaded
    }

    /// Восстановить одну завершённую партию (и её турнир, если он ещё не известен).
    pub fn restore_record(&mut self, record: &GameRecord) -> Result<(), RecordError> {
        let game = Game::from_record(record)?;

        if !self.tournaments.contains_key(&record.tournament) {
            let config = TournamentConfig {
                games_per_pair: record.games_per_pair,
                time_control: record.time_control,
            };
            self.register_tournament(&record.tournament, config, record.tournament_created_at)
                .map_err(|err| RecordError::BadHeader {
                    name: "Event",
                    value: format!("{}: {err}", record.tournament),
                })?;
        }

        let tournament = self
            .tournaments
            .get_mut(&record.tournament)
            .ok_or(RecordError::MissingHeader("Event"))?;
        tournament.created_at = record.tournament_created_at;
        tournament.restore_game(game);
        Ok(())
    }
}
