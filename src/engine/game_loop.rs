// src/engine/game_loop.rs
//! Протокольная машина состояний одной партии.
//!
//! NeedsAck -> InProgress -> Finished, плюс выход в Aborted из первых двух.
//! Игроков партия знает только по `PlayerId`, всё остальное (рассылка,
//! смена состояний игроков, архив, текущее время) приходит через `GameContext`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::protocol;
use crate::chess::{normalize_move, to_uci, ChessBoard, GameRecord, RecordError, Side};
use crate::domain::{GameId, PlayerId, PlayerState, Timestamp, TournamentConfig};
use crate::engine::actions::GameCommand;
use crate::engine::context::GameContext;
use crate::engine::errors::ArenaError;
use crate::time_ctrl::{GameClock, TimeControl, ACK_TIMEOUT_SECS};

/// Причины прерывания партии.
pub const ABORT_NOT_ACKED: &str = "not acked in time";
pub const ABORT_OPPONENT_LEFT: &str = "opponent disconnected before ack";

/// Причины окончания, которые выставляет сама партия (не доска).
pub const STATUS_OUT_OF_TIME: &str = "Out of time";
pub const STATUS_RESIGNATION: &str = "Resignation";
pub const STATUS_DISCONNECT: &str = "Resignation by disconnect";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameState {
    NeedsAck,
    InProgress,
    Finished,
    Aborted,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Finished | GameState::Aborted)
    }
}

/// Место за доской: имя живёт дольше соединения (standings, архив).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seat {
    pub name: String,
    /// None у партий из архива и после отключения игрока.
    pub session: Option<PlayerId>,
}

impl Seat {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session: Some(id),
        }
    }

    fn offline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session: None,
        }
    }
}

/// Одна партия турнира.
#[derive(Debug)]
pub struct Game {
    pub id: GameId,
    pub tournament: String,
    pub tournament_created_at: Timestamp,
    pub games_per_pair: u32,
    pub time_control: TimeControl,
    /// 0 = белые, 1 = чёрные.
    seats: [Seat; 2],
    clock: GameClock,
    outcomes: [f64; 2],
    status: String,
    state: GameState,
    board: ChessBoard,
    observers: BTreeSet<PlayerId>,
    created_at: Timestamp,
    acked: [bool; 2],
}

impl Game {
    pub fn new(
        id: GameId,
        tournament: &str,
        tournament_created_at: Timestamp,
        config: &TournamentConfig,
        white: Seat,
        black: Seat,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            tournament: tournament.to_string(),
            tournament_created_at,
            games_per_pair: config.games_per_pair,
            time_control: config.time_control,
            seats: [white, black],
            clock: GameClock::new(config.time_control),
            outcomes: [0.0, 0.0],
            status: "*".to_string(),
            state: GameState::NeedsAck,
            board: ChessBoard::new(),
            observers: BTreeSet::new(),
            created_at: now,
            acked: [false, false],
        }
    }

    /// Восстановить завершённую партию из архива.
    pub fn from_record(record: &GameRecord) -> Result<Self, RecordError> {
        let board = ChessBoard::from_san_moves(&record.moves)?;
        Ok(Self {
            id: record.game_id.clone(),
            tournament: record.tournament.clone(),
            tournament_created_at: record.tournament_created_at,
            games_per_pair: record.games_per_pair,
            time_control: record.time_control,
            seats: [
                Seat::offline(record.white.clone()),
                Seat::offline(record.black.clone()),
            ],
            clock: GameClock::new(record.time_control),
            outcomes: record.outcomes,
            status: record.termination.clone(),
            state: GameState::Finished,
            board,
            observers: BTreeSet::new(),
            created_at: record.created_at,
            acked: [true, true],
        })
    }

    // ---------- чтение ----------

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn outcomes(&self) -> [f64; 2] {
        self.outcomes
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn board(&self) -> &ChessBoard {
        &self.board
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    pub fn white(&self) -> &str {
        &self.seats[0].name
    }

    pub fn black(&self) -> &str {
        &self.seats[1].name
    }

    /// Индекс ходящей стороны.
    pub fn cur_index(&self) -> usize {
        self.clock.cur_index
    }

    pub fn observers(&self) -> &BTreeSet<PlayerId> {
        &self.observers
    }

    /// Место игрока за доской, если он участник.
    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.session == Some(id))
    }

    /// Остатки времени с учётом текущего раздумья.
    pub fn live_times(&self, now: Timestamp) -> [f64; 2] {
        self.clock.live_times(now)
    }

    /// `<id> <white> <black> <whiteTime> <blackTime> <fen>`.
    pub fn state_str(&self, now: Timestamp) -> String {
        format!("{} {}", self.id, self.position_str(now))
    }

    /// То же без id (хвост PLAYER_MOVED).
    fn position_str(&self, now: Timestamp) -> String {
        let times = self.clock.live_times(now);
        format!(
            "{} {} {:.2} {:.2} {}",
            self.seats[0].name,
            self.seats[1].name,
            times[0],
            times[1],
            self.board.fen()
        )
    }

    /// `Game over: 1-0 Checkmate`; пусто, пока партия не окончена.
    pub fn outcome_str(&self) -> String {
        if self.state != GameState::Finished {
            return String::new();
        }
        format!("Game over: {} {}", self.score_str(), self.status)
    }

    fn score_str(&self) -> String {
        format!("{}-{}", self.outcomes[0], self.outcomes[1])
    }

    /// Запись для архива.
    pub fn to_record(&self) -> GameRecord {
        GameRecord {
            game_id: self.id.clone(),
            tournament: self.tournament.clone(),
            tournament_created_at: self.tournament_created_at,
            games_per_pair: self.games_per_pair,
            time_control: self.time_control,
            white: self.seats[0].name.clone(),
            black: self.seats[1].name.clone(),
            created_at: self.created_at,
            termination: self.status.clone(),
            outcomes: self.outcomes,
            moves: self.board.san_history().to_vec(),
        }
    }

    // ---------- рассылка ----------

    fn send_players(&self, ctx: &GameContext<'_>, action: &str, text: &str) {
        for seat in &self.seats {
            if let Some(id) = seat.session {
                ctx.send(id, action, text);
            }
        }
    }

    /// Обоим игрокам и всем наблюдателям.
    fn send_all(&self, ctx: &GameContext<'_>, action: &str, text: &str) {
        self.send_players(ctx, action, text);
        for &id in &self.observers {
            ctx.send(id, action, text);
        }
    }

    fn send_to_seat(&self, ctx: &GameContext<'_>, idx: usize, action: &str, text: &str) {
        if let Some(id) = self.seats[idx].session {
            ctx.send(id, action, text);
        }
    }

    /// Объявление пары: INFO + GAME_PAIRED.
    pub fn send_paired(&self, ctx: &GameContext<'_>) {
        self.send_all(ctx, protocol::INFO, "Paired with player for game");
        let text = format!(
            "{} {} {} {:.2} {:.2}",
            self.id,
            self.seats[0].name,
            self.seats[1].name,
            self.time_control.time_limit,
            self.time_control.increment
        );
        self.send_all(ctx, protocol::GAME_PAIRED, &text);
    }

    pub fn send_clock_updates(&self, ctx: &GameContext<'_>) {
        let text = self.state_str(ctx.now);
        self.send_all(ctx, protocol::CLOCK_UPDATE, &text);
    }

    fn prompt_mover(&self, ctx: &GameContext<'_>) {
        let text = self.state_str(ctx.now);
        self.send_to_seat(ctx, self.clock.cur_index, protocol::YOUR_MOVE, &text);
    }

    // ---------- наблюдатели ----------

    /// Подключить наблюдателя и сразу отправить ему снимок партии.
    pub fn add_observer(&mut self, ctx: &mut GameContext<'_>, id: PlayerId) {
        info!(game_id = %self.id, player = id, "adding observer");
        ctx.send(id, protocol::GAME_STATE, &self.state_str(ctx.now));
        self.observers.insert(id);
        if let Some(p) = ctx.sessions.get_mut(id) {
            p.observing_games.insert(self.id.clone());
        }
    }

    pub fn remove_observer(&mut self, ctx: &mut GameContext<'_>, id: PlayerId) {
        info!(game_id = %self.id, player = id, "removing observer");
        self.observers.remove(&id);
        if let Some(p) = ctx.sessions.get_mut(id) {
            p.observing_games.remove(&self.id);
        }
    }

    // ---------- входящие сообщения ----------

    /// Сообщение участника партии (id уже сверен турниром).
    pub fn handle_message(
        &mut self,
        ctx: &mut GameContext<'_>,
        player: PlayerId,
        action: &str,
        text: &str,
    ) -> Result<(), ArenaError> {
        let idx = self
            .seat_of(player)
            .ok_or_else(|| ArenaError::protocol(format!("Not a player in game {}", self.id)))?;

        match self.state {
            GameState::NeedsAck => {
                self.on_pending_message(ctx, idx, action);
                Ok(())
            }
            GameState::InProgress => {
                if self.check_timeout(ctx) {
                    return Ok(());
                }
                let cmd = GameCommand::parse(action, text)?;
                self.on_play_message(ctx, idx, cmd);
                Ok(())
            }
            GameState::Finished | GameState::Aborted => {
                debug!(game_id = %self.id, player, action, "message for closed game");
                Ok(())
            }
        }
    }

    fn on_pending_message(&mut self, ctx: &mut GameContext<'_>, idx: usize, action: &str) {
        if action != protocol::ACK {
            let text = format!("ignoring message type {action} while waiting for ack");
            self.send_to_seat(ctx, idx, protocol::INFO, &text);
            return;
        }
        self.player_acknowledged(ctx, idx);
    }

    fn player_acknowledged(&mut self, ctx: &mut GameContext<'_>, idx: usize) {
        self.acked[idx] = true;
        if let Some(p) = self.seats[idx].session.and_then(|id| ctx.sessions.get_mut(id)) {
            p.state = PlayerState::InGameAcked;
        }

        if !self.acked.iter().all(|&a| a) {
            self.send_to_seat(
                ctx,
                idx,
                protocol::INFO,
                "Waiting for opponent to acknowledge game",
            );
            return;
        }

        self.send_all(
            ctx,
            protocol::INFO,
            "Both players have acknowledged game. Starting...",
        );
        self.send_all(ctx, protocol::GAME_STARTED, &self.state_str(ctx.now));

        for seat in &self.seats {
            if let Some(p) = seat.session.and_then(|id| ctx.sessions.get_mut(id)) {
                p.state = PlayerState::Playing;
            }
        }
        self.state = GameState::InProgress;
        self.clock.start(ctx.now);
        info!(game_id = %self.id, white = %self.seats[0].name, black = %self.seats[1].name, "game started");

        self.prompt_mover(ctx);
    }

    fn on_play_message(&mut self, ctx: &mut GameContext<'_>, idx: usize, cmd: GameCommand) {
        match cmd {
            GameCommand::Say(words) => {
                let text = format!("{} {}", self.seats[idx].name, words);
                self.send_all(ctx, protocol::SAID, text.trim_end());
            }
            GameCommand::Move(raw) => {
                if idx != self.clock.cur_index {
                    self.send_to_seat(ctx, idx, protocol::INFO, "Ignoring message. It's not your move");
                    return;
                }
                self.make_move(ctx, &raw);
            }
            GameCommand::Resign => {
                if idx != self.clock.cur_index {
                    self.send_to_seat(ctx, idx, protocol::INFO, "Ignoring message. It's not your move");
                    return;
                }
                self.resign(ctx, idx);
            }
            GameCommand::Ack => self.ignore(ctx, idx, protocol::ACK),
            GameCommand::Other(action) => self.ignore(ctx, idx, &action),
        }
    }

    fn ignore(&self, ctx: &GameContext<'_>, idx: usize, action: &str) {
        let text = format!("ignoring message type {action}.");
        self.send_to_seat(ctx, idx, protocol::INFO, &text);
    }

    fn make_move(&mut self, ctx: &mut GameContext<'_>, raw: &str) {
        let mover = self.clock.cur_index;
        let clean = normalize_move(Side::from_index(mover), raw);
        let uci = to_uci(&clean);

        let san = match self.board.play_uci(&uci) {
            Ok(san) => san,
            Err(err) => {
                debug!(game_id = %self.id, mover, raw, error = %err, "rejected move");
                let rejection = ArenaError::IllegalMove(raw.to_string()).to_string();
                self.send_to_seat(ctx, mover, protocol::INFO, &rejection);
                self.prompt_mover(ctx);
                return;
            }
        };

        self.clock.complete_move(ctx.now);
        debug!(game_id = %self.id, mover, %san, "move applied");

        let text = format!(
            "{} {} {} {}",
            self.id,
            self.seats[mover].name,
            clean,
            self.position_str(ctx.now)
        );
        self.send_all(ctx, protocol::PLAYER_MOVED, &text);

        if let Some(termination) = self.board.termination() {
            if termination.is_draw() {
                info!(game_id = %self.id, reason = termination.reason(), "draw");
                self.outcomes = [0.5, 0.5];
            } else {
                info!(game_id = %self.id, winner = %self.seats[mover].name, "checkmate");
                self.outcomes[mover] = 1.0;
            }
            self.finish(ctx, termination.reason());
            return;
        }

        self.clock.switch_side();
        self.prompt_mover(ctx);
    }

    fn resign(&mut self, ctx: &mut GameContext<'_>, idx: usize) {
        info!(game_id = %self.id, player = %self.seats[idx].name, "resignation");
        self.outcomes[idx] = 0.0;
        self.outcomes[1 - idx] = 1.0;
        self.finish(ctx, STATUS_RESIGNATION);
    }

    // ---------- время ----------

    /// Проверка таймаутов. Возвращает `true`, если партия закрылась.
    pub fn check_timeout(&mut self, ctx: &mut GameContext<'_>) -> bool {
        match self.state {
            GameState::NeedsAck => {
                if ctx.now - self.created_at <= ACK_TIMEOUT_SECS {
                    return false;
                }
                info!(game_id = %self.id, "game timed out before ack, aborting");
                let laggards: Vec<PlayerId> = (0..2)
                    .filter(|&i| !self.acked[i])
                    .filter_map(|i| self.seats[i].session)
                    .collect();

                let acked = self.acked;
                self.abort_with(ctx, ABORT_NOT_ACKED, |i| acked[i]);

                for id in laggards {
                    ctx.send(
                        id,
                        protocol::INFO,
                        "You did not ack a game in time. You will be terminated.",
                    );
                    ctx.sessions.force_disconnect(id);
                }
                true
            }
            GameState::InProgress => {
                if !self.clock.is_flagged(ctx.now) {
                    return false;
                }
                let loser = self.clock.cur_index;
                info!(game_id = %self.id, player = %self.seats[loser].name, "out of time");

                self.clock.stop(ctx.now);
                self.send_clock_updates(ctx);

                self.outcomes[loser] = 0.0;
                self.outcomes[1 - loser] = 1.0;
                self.finish(ctx, STATUS_OUT_OF_TIME);
                true
            }
            GameState::Finished | GameState::Aborted => false,
        }
    }

    // ---------- отключение ----------

    /// Участник отключился: в NeedsAck партия прерывается, в InProgress – форфейт.
    pub fn player_disconnected(&mut self, ctx: &mut GameContext<'_>, player: PlayerId) {
        let Some(idx) = self.seat_of(player) else {
            return;
        };
        self.seats[idx].session = None;

        match self.state {
            GameState::NeedsAck => self.abort(ctx, ABORT_OPPONENT_LEFT),
            GameState::InProgress => {
                info!(game_id = %self.id, player = %self.seats[idx].name, "forfeit by disconnect");
                self.outcomes[idx] = 0.0;
                self.outcomes[1 - idx] = 1.0;
                self.finish(ctx, STATUS_DISCONNECT);
            }
            GameState::Finished | GameState::Aborted => {}
        }
    }

    // ---------- терминальные переходы ----------

    /// Партия окончена: архив, итоговая рассылка, игроки обратно в очередь.
    pub fn finish(&mut self, ctx: &mut GameContext<'_>, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.clock.stop(ctx.now);
        self.state = GameState::Finished;
        self.status = reason.to_string();

        if let Err(err) = ctx.archive.save_game(&self.to_record()) {
            error!(game_id = %self.id, error = %err, "failed to persist finished game");
        }

        info!(
            game_id = %self.id,
            result = %self.score_str(),
            status = %self.status,
            "game over"
        );

        self.send_all(ctx, protocol::INFO, &self.outcome_str());
        let text = format!("{} {} {}", self.id, self.score_str(), self.status);
        self.send_all(ctx, protocol::GAME_OVER, &text);

        self.release_players(ctx, |_| true);
    }

    /// Прервать партию без результата. Оставшиеся в сессии игроки
    /// возвращаются в очередь.
    pub fn abort(&mut self, ctx: &mut GameContext<'_>, reason: &str) {
        self.abort_with(ctx, reason, |_| true);
    }

    /// `current_game` снимается у обоих, в очередь идут только те, для кого `requeue`.
    fn abort_with(
        &mut self,
        ctx: &mut GameContext<'_>,
        reason: &str,
        requeue: impl Fn(usize) -> bool,
    ) {
        if self.state.is_terminal() {
            return;
        }
        self.clock.stop(ctx.now);
        self.state = GameState::Aborted;
        self.status = reason.to_string();
        info!(game_id = %self.id, reason, "game aborted");

        self.send_all(ctx, protocol::GAME_ABORTED, reason);
        self.send_all(ctx, protocol::INFO, &format!("Game aborted: {reason}"));

        self.release_players(ctx, requeue);
    }

    fn release_players(&self, ctx: &mut GameContext<'_>, requeue: impl Fn(usize) -> bool) {
        for (i, seat) in self.seats.iter().enumerate() {
            let Some(p) = seat.session.and_then(|id| ctx.sessions.get_mut(id)) else {
                continue;
            };
            if p.current_game.as_deref() != Some(self.id.as_str()) {
                continue;
            }
            if requeue(i) {
                p.release(ctx.now);
            } else {
                p.current_game = None;
            }
        }
    }
}
