// src/domain/tournament.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::protocol;
use crate::domain::{GameId, Player, PlayerId, PlayerState, Timestamp};
use crate::engine::{ArenaError, Game, GameContext, GameState, RandomSource, Seat};
use crate::infra::next_game_id;
use crate::time_ctrl::TimeControl;
use crate::tournament::pairing::{plan_pairings, Candidate};

/// Максимальная длина имени турнира / игрока (не включительно).
pub const MAX_NAME_LEN: usize = 50;

/// Неизменяемые параметры турнира.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TournamentConfig {
    /// Сколько партий максимум играет каждая пара.
    pub games_per_pair: u32,
    pub time_control: TimeControl,
}

impl TournamentConfig {
    pub fn new(games_per_pair: u32, time_limit: f64, increment: f64) -> Self {
        Self {
            games_per_pair,
            time_control: TimeControl::new(time_limit, increment),
        }
    }

    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.games_per_pair == 0 {
            return Err(ArenaError::config("games_per_pair must be at least 1"));
        }
        self.time_control.validate().map_err(ArenaError::Config)
    }
}

impl Default for TournamentConfig {
    /// 2 партии на пару, 5 минут без добавления.
    fn default() -> Self {
        Self {
            games_per_pair: 2,
            time_control: TimeControl::standard(),
        }
    }
}

/// Строка турнирной таблицы.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Standing {
    pub played: u32,
    pub score: f64,
}

/// Турнир: ростер (имя -> подключение) и все его партии.
///
/// Завершённые партии не удаляются: по ним считаются таблица и счётчики пар.
#[derive(Debug)]
pub struct Tournament {
    pub name: String,
    pub config: TournamentConfig,
    pub created_at: Timestamp,
    roster: BTreeMap<String, PlayerId>,
    games: HashMap<GameId, Game>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, config: TournamentConfig, created_at: Timestamp) -> Self {
        Self {
            name: name.into(),
            config,
            created_at,
            roster: BTreeMap::new(),
            games: HashMap::new(),
        }
    }

    // ---------- ростер ----------

    pub fn active_players(&self) -> usize {
        self.roster.len()
    }

    pub fn roster(&self) -> impl Iterator<Item = (&String, &PlayerId)> {
        self.roster.iter()
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.roster.contains_key(name)
    }

    fn broadcast(&self, ctx: &GameContext<'_>, text: &str) {
        for &id in self.roster.values() {
            ctx.send(id, protocol::INFO, text);
        }
    }

    /// Записать игрока в турнир под именем `name`.
    ///
    /// Остальные участники получают INFO о новом игроке.
    pub fn add_player(
        &mut self,
        ctx: &mut GameContext<'_>,
        id: PlayerId,
        name: &str,
    ) -> Result<(), ArenaError> {
        if self.roster.contains_key(name) {
            return Err(ArenaError::protocol(format!(
                "Player with name {name} already in tournament"
            )));
        }

        let text = format!(
            "Player {} joined tournament ({} active players)",
            name,
            self.roster.len() + 1
        );
        info!(tournament = %self.name, player = id, name, "player joined");
        self.broadcast(ctx, &text);

        let player = ctx
            .sessions
            .get_mut(id)
            .ok_or_else(|| ArenaError::not_found(format!("Player {id} is not connected")))?;
        player.name = Some(name.to_string());
        player.tournament = Some(self.name.clone());
        player.state = PlayerState::WaitingPairing;

        self.roster.insert(name.to_string(), id);
        Ok(())
    }

    /// Игрок ушёл (уже вынут из реестра сессий).
    ///
    /// Текущая партия, если есть, получает отключение (форфейт или abort).
    pub fn remove_player(&mut self, ctx: &mut GameContext<'_>, player: &Player) {
        let name = player.display_name().to_string();
        if self.roster.get(&name) == Some(&player.id) {
            self.roster.remove(&name);
        }

        let text = format!(
            "Player {} left tournament ({} active players)",
            name,
            self.roster.len()
        );
        info!(tournament = %self.name, player = player.id, name = %name, "player left");
        self.broadcast(ctx, &text);

        if let Some(game) = player
            .current_game
            .as_ref()
            .and_then(|gid| self.games.get_mut(gid))
        {
            game.player_disconnected(ctx, player.id);
        }
    }

    // ---------- маршрутизация ----------

    /// Сообщение игрока, уже вышедшего из Connecting.
    ///
    /// Первый токен текста обязан совпадать с id текущей партии. Несовпадение
    /// прощается только в WaitingPairing / InGameNeedsAck: это гонки
    /// со спариванием и ACK-таймаутом.
    pub fn route_message(
        &mut self,
        ctx: &mut GameContext<'_>,
        id: PlayerId,
        action: &str,
        text: &str,
    ) -> Result<(), ArenaError> {
        let game_id = text
            .split_whitespace()
            .next()
            .ok_or_else(|| ArenaError::protocol("No game id provided"))?;

        let player = ctx
            .sessions
            .get(id)
            .ok_or_else(|| ArenaError::not_found(format!("Player {id} is not connected")))?;

        let current = match player.current_game.as_deref() {
            Some(current) if current == game_id => current.to_string(),
            _ => {
                let msg = format!(
                    "Game id in message ({game_id}) does not match id of active game"
                );
                return match player.state {
                    PlayerState::WaitingPairing | PlayerState::InGameNeedsAck => {
                        debug!(tournament = %self.name, player = id, action, "stale game id ignored");
                        ctx.send(
                            id,
                            protocol::INFO,
                            &format!("Ignoring message of type {action}. {msg}"),
                        );
                        Ok(())
                    }
                    _ => Err(ArenaError::Protocol(msg)),
                };
            }
        };

        let game = self
            .games
            .get_mut(&current)
            .ok_or_else(|| ArenaError::not_found(format!("No game found with id {current}")))?;
        game.handle_message(ctx, id, action, text)
    }

    // ---------- спаривание ----------

    /// Сколько завершённых партий сыграно с `white` белыми против `black`.
    pub fn pairing_count(&self, white: &str, black: &str) -> u32 {
        self.games
            .values()
            .filter(|g| g.state() == GameState::Finished)
            .filter(|g| g.white() == white && g.black() == black)
            .count() as u32
    }

    /// Периодический подбор пар.
    pub fn update_pairings<R: RandomSource>(&mut self, ctx: &mut GameContext<'_>, rng: &mut R) {
        let mut candidates: Vec<Candidate> = self
            .roster
            .iter()
            .filter(|(_, &id)| {
                ctx.sessions
                    .get(id)
                    .map(|p| p.is_free(ctx.now))
                    .unwrap_or(false)
            })
            .map(|(name, &id)| Candidate {
                id,
                name: name.clone(),
            })
            .collect();
        if candidates.len() < 2 {
            return;
        }
        rng.shuffle(&mut candidates);

        let plan = plan_pairings(
            &candidates,
            |w, b| self.pairing_count(w, b),
            self.config.games_per_pair,
        );
        for pairing in plan {
            self.start_game(
                ctx,
                Seat::new(pairing.white.id, pairing.white.name),
                Seat::new(pairing.black.id, pairing.black.name),
            );
        }
    }

    /// Создать партию и разослать объявление пары.
    pub fn start_game(&mut self, ctx: &mut GameContext<'_>, white: Seat, black: Seat) -> GameId {
        let game = Game::new(
            next_game_id(),
            &self.name,
            self.created_at,
            &self.config,
            white,
            black,
            ctx.now,
        );
        let id = game.id.clone();

        for seat in game.seats() {
            if let Some(p) = seat.session.and_then(|sid| ctx.sessions.get_mut(sid)) {
                p.current_game = Some(id.clone());
                p.state = PlayerState::InGameNeedsAck;
            }
        }
        game.send_paired(ctx);
        info!(
            tournament = %self.name,
            game_id = %id,
            white = %game.white(),
            black = %game.black(),
            "starting game"
        );

        self.games.insert(id.clone(), game);
        id
    }

    // ---------- время ----------

    pub fn check_timeouts(&mut self, ctx: &mut GameContext<'_>) {
        for game in self.games.values_mut() {
            if matches!(game.state(), GameState::NeedsAck | GameState::InProgress) {
                game.check_timeout(ctx);
            }
        }
    }

    pub fn send_clock_updates(&self, ctx: &GameContext<'_>) {
        for game in self.games.values() {
            if game.state() == GameState::InProgress {
                game.send_clock_updates(ctx);
            }
        }
    }

    // ---------- партии и таблица ----------

    pub fn game(&self, id: &str) -> Option<&Game> {
        self.games.get(id)
    }

    pub fn game_mut(&mut self, id: &str) -> Option<&mut Game> {
        self.games.get_mut(id)
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    /// Партия из архива.
    pub fn restore_game(&mut self, game: Game) {
        self.games.insert(game.id.clone(), game);
    }

    fn games_in(&self, state: GameState) -> Vec<&Game> {
        let mut games: Vec<&Game> = self.games.values().filter(|g| g.state() == state).collect();
        games.sort_by(|a, b| a.created_at().total_cmp(&b.created_at()));
        games
    }

    /// Завершённые партии в порядке создания.
    pub fn completed_games(&self) -> Vec<&Game> {
        self.games_in(GameState::Finished)
    }

    /// Идущие партии в порядке создания.
    pub fn active_games(&self) -> Vec<&Game> {
        self.games_in(GameState::InProgress)
    }

    /// Таблица: все участники ростера с нуля + очки по завершённым партиям.
    pub fn standings(&self) -> BTreeMap<String, Standing> {
        let mut table: BTreeMap<String, Standing> = self
            .roster
            .keys()
            .map(|name| (name.clone(), Standing::default()))
            .collect();

        for game in self.games.values().filter(|g| g.state() == GameState::Finished) {
            let outcomes = game.outcomes();
            for (i, seat) in game.seats().iter().enumerate() {
                let row = table.entry(seat.name.clone()).or_default();
                row.played += 1;
                row.score += outcomes[i];
            }
        }
        table
    }
}
