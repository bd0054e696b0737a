//! The hub: all shared game state and the handler for every message type.
//!
//! One [`Hub`] sits behind one lock. Each handler runs to completion
//! against it and returns the messages to send as a list of
//! [`Delivery`]s, which the caller posts to the notifier's outboxes.
//! Handlers validate before they mutate, so a rejected message leaves the
//! hub untouched.
//!
//! ```text
//! ClientMessage ─▶ Hub::dispatch ─▶ handler ─▶ Outcome { deliveries, bot_moves }
//!                                                   │             │
//!                                           Notifier::post     BotController::schedule
//! ```

use std::collections::HashMap;

use broadside_battle::{Battle, BattleConfig, Placement, TurnResult};
use broadside_protocol::{
    AddShipsRequest, AttackFeedback, AttackRequest, AttackStatus, ClientMessage, CreateGame,
    Finish, GameId, JoinRoomRequest, Position, RandomAttackRequest, RegRequest, RegResponse,
    ServerMessage, StartGame, Turn, UserId,
};
use broadside_room::{FilledRoom, Lobby};
use broadside_session::{User, UserDirectory};
use broadside_transport::{Connection, ConnectionId, Peer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use crate::bot::{BotController, BotMove, bot_fleet};
use crate::notifier::Delivery;
use crate::ServerConfig;

/// What one handler produced.
struct Outcome<C> {
    deliveries: Vec<Delivery<C>>,
    bot_moves: Vec<BotMove>,
}

impl<C> Outcome<C> {
    fn none() -> Self {
        Self {
            deliveries: Vec::new(),
            bot_moves: Vec::new(),
        }
    }

    fn send(&mut self, delivery: Delivery<C>) {
        self.deliveries.push(delivery);
    }
}

/// All server state: users, open rooms, battles, connected peers and bot
/// timers.
pub struct Hub<C> {
    users: UserDirectory,
    lobby: Lobby,
    battles: HashMap<GameId, Battle>,
    peers: HashMap<ConnectionId, Peer<C>>,
    bots: BotController,
    battle_config: BattleConfig,
    next_game_id: u64,
    rng: StdRng,
}

impl<C: Connection> Hub<C> {
    /// Creates an empty hub. Due bot attacks are sent to `bot_moves`.
    pub fn new(config: &ServerConfig, bot_moves: mpsc::UnboundedSender<BotMove>) -> Self {
        Self {
            users: UserDirectory::new(),
            lobby: Lobby::new(),
            battles: HashMap::new(),
            peers: HashMap::new(),
            bots: BotController::new(config.bot_delay, bot_moves),
            battle_config: config.battle,
            next_game_id: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Tracks a newly accepted connection.
    pub fn connect(&mut self, peer: Peer<C>) {
        tracing::debug!(conn_id = %peer.id(), "peer connected");
        self.peers.insert(peer.id(), peer);
    }

    /// Routes one decoded message from `conn` to its handler.
    ///
    /// Everything except `reg` needs a registered connection; anything
    /// else is logged and dropped.
    pub fn dispatch(&mut self, conn: ConnectionId, msg: ClientMessage) -> Vec<Delivery<C>> {
        let kind = msg.kind();
        let outcome = match msg {
            ClientMessage::Reg(req) => self.register(conn, req),
            other => match self.users.user_by_connection(conn).cloned() {
                None => {
                    tracing::debug!(%conn, kind, "message from unregistered connection dropped");
                    Outcome::none()
                }
                Some(user) => match other {
                    ClientMessage::Reg(_) => Outcome::none(),
                    ClientMessage::CreateRoom => self.create_room(&user),
                    ClientMessage::AddUserToRoom(req) => self.add_user_to_room(&user, req),
                    ClientMessage::AddShips(req) => self.add_ships(&user, req),
                    ClientMessage::Attack(req) => self.attack(&user, req),
                    ClientMessage::RandomAttack(req) => self.random_attack(&user, req),
                    ClientMessage::SinglePlay => self.single_play(&user),
                },
            },
        };
        self.finish(outcome)
    }

    /// Cleans up after a closed connection: unbinds its user and closes
    /// the rooms they were waiting in.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Delivery<C>> {
        self.peers.remove(&conn);
        let Some(user) = self.users.detach(conn) else {
            return Vec::new();
        };
        tracing::info!(%conn, user_id = %user, "user disconnected");

        let mut outcome = Outcome::none();
        if !self.lobby.remove_rooms_of(user).is_empty() {
            outcome.send(self.room_listing_for_all());
        }
        self.finish(outcome)
    }

    /// Plays a due bot attack, unless the battle moved on meanwhile.
    pub fn bot_turn(&mut self, mv: BotMove) -> Vec<Delivery<C>> {
        self.bots.complete(mv.game_id);
        let due = self.battles.get(&mv.game_id).is_some_and(|battle| {
            !battle.is_finished() && battle.current_turn() == Some(mv.bot)
        });
        if !due {
            tracing::debug!(game_id = %mv.game_id, bot = %mv.bot, "stale bot move ignored");
            return Vec::new();
        }
        let outcome = self.resolve_attack(mv.game_id, mv.bot, None);
        self.finish(outcome)
    }

    /// Stops every bot timer and hands back the live peers so the caller
    /// can close them.
    pub fn shutdown(&mut self) -> Vec<Peer<C>> {
        self.bots.cancel_all();
        self.peers
            .drain()
            .map(|(_, peer)| peer)
            .filter(Peer::is_live)
            .collect()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn battle(&self, id: GameId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    pub fn battle_count(&self) -> usize {
        self.battles.len()
    }

    /// Number of tracked peers, detached bot peers included.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of armed bot timers.
    pub fn pending_bot_moves(&self) -> usize {
        self.bots.pending()
    }

    // -----------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------

    fn register(&mut self, conn: ConnectionId, req: RegRequest) -> Outcome<C> {
        let mut outcome = Outcome::none();
        let Some(peer) = self.peers.get(&conn).cloned() else {
            tracing::debug!(%conn, "reg from untracked connection dropped");
            return outcome;
        };

        match self.users.register(&req.name, &req.password, conn) {
            Ok((user, returning)) => {
                tracing::info!(user_id = %user.id, name = %user.name, returning, "registered");
                outcome.send(Delivery::to(
                    peer.clone(),
                    ServerMessage::Reg(RegResponse {
                        name: user.name,
                        index: Some(user.id),
                        error: false,
                        error_text: None,
                    }),
                ));
                outcome.send(Delivery::to(
                    peer.clone(),
                    ServerMessage::UpdateRoom(self.lobby.open_rooms()),
                ));
                outcome.send(Delivery::to(
                    peer,
                    ServerMessage::UpdateWinners(self.users.winners()),
                ));
            }
            Err(e) => {
                tracing::debug!(%conn, name = %req.name, error = %e, "registration rejected");
                outcome.send(Delivery::to(
                    peer,
                    ServerMessage::Reg(RegResponse {
                        name: req.name,
                        index: None,
                        error: true,
                        error_text: Some(e.to_string()),
                    }),
                ));
            }
        }
        outcome
    }

    fn create_room(&mut self, user: &User) -> Outcome<C> {
        self.lobby.create_room(user.to_room_user());
        let mut outcome = Outcome::none();
        outcome.send(self.room_listing_for_all());
        outcome
    }

    fn add_user_to_room(&mut self, user: &User, req: JoinRoomRequest) -> Outcome<C> {
        let filled = match self.lobby.join_room(req.index_room, user.to_room_user()) {
            Ok(filled) => filled,
            Err(e) => {
                tracing::debug!(user_id = %user.id, error = %e, "join rejected");
                return Outcome::none();
            }
        };

        let game_id = self.open_battle(&filled);
        let mut outcome = Outcome::none();
        outcome.send(self.room_listing_for_all());
        for player in &filled.players {
            self.send_create_game(&mut outcome, game_id, player.index);
        }
        outcome
    }

    fn add_ships(&mut self, user: &User, req: AddShipsRequest) -> Outcome<C> {
        if req.index_player != user.id {
            tracing::debug!(user_id = %user.id, claimed = %req.index_player, "add_ships for another player dropped");
            return Outcome::none();
        }
        let Some(battle) = self.battles.get_mut(&req.game_id) else {
            tracing::debug!(game_id = %req.game_id, "add_ships for unknown battle dropped");
            return Outcome::none();
        };

        match battle.add_ships(user.id, &req.ships, &mut self.rng) {
            Ok(Placement::Waiting) => Outcome::none(),
            Ok(Placement::Started { first_turn }) => self.announce_start(req.game_id, first_turn),
            Err(e) => {
                tracing::debug!(game_id = %req.game_id, user_id = %user.id, error = %e, "fleet rejected");
                Outcome::none()
            }
        }
    }

    fn attack(&mut self, user: &User, req: AttackRequest) -> Outcome<C> {
        if req.index_player != user.id {
            tracing::debug!(user_id = %user.id, claimed = %req.index_player, "attack for another player dropped");
            return Outcome::none();
        }
        self.resolve_attack(req.game_id, user.id, Some(Position::new(req.x, req.y)))
    }

    fn random_attack(&mut self, user: &User, req: RandomAttackRequest) -> Outcome<C> {
        if req.index_player != user.id {
            tracing::debug!(user_id = %user.id, claimed = %req.index_player, "randomAttack for another player dropped");
            return Outcome::none();
        }
        self.resolve_attack(req.game_id, user.id, None)
    }

    fn single_play(&mut self, user: &User) -> Outcome<C> {
        let fleet = match bot_fleet(&self.battle_config) {
            Ok(fleet) => fleet,
            Err(e) => {
                tracing::warn!(error = %e, "no bot fleet fits the battle rules");
                return Outcome::none();
            }
        };

        let bot_peer = Peer::detached();
        let bot = self.users.create_bot(bot_peer.id());
        self.peers.insert(bot_peer.id(), bot_peer);

        let room = self.lobby.create_fresh_room(user.to_room_user());
        let filled = match self.lobby.join_room(room.id, bot.to_room_user()) {
            Ok(filled) => filled,
            Err(e) => {
                tracing::warn!(room_id = %room.id, error = %e, "could not seat bot");
                return Outcome::none();
            }
        };

        let game_id = self.open_battle(&filled);
        let placed = self
            .battles
            .get_mut(&game_id)
            .map(|battle| battle.add_ships(bot.id, &fleet, &mut self.rng));
        if let Some(Err(e)) = placed {
            tracing::warn!(%game_id, error = %e, "bot fleet rejected");
        }
        tracing::info!(%game_id, user_id = %user.id, bot = %bot.id, "single-player battle created");

        let mut outcome = Outcome::none();
        if !filled.closed_rooms.is_empty() {
            outcome.send(self.room_listing_for_all());
        }
        self.send_create_game(&mut outcome, game_id, user.id);
        outcome
    }

    // -----------------------------------------------------------------
    // Shared steps
    // -----------------------------------------------------------------

    fn open_battle(&mut self, filled: &FilledRoom) -> GameId {
        self.next_game_id += 1;
        let game_id = GameId(self.next_game_id);
        let [a, b] = &filled.players;
        self.battles
            .insert(game_id, Battle::new(game_id, [a.index, b.index], self.battle_config));
        tracing::info!(%game_id, room_id = %filled.room_id, "battle created");
        game_id
    }

    /// `start_game` to each player with their own fleet, then `turn` to
    /// both.
    fn announce_start(&self, game_id: GameId, first_turn: UserId) -> Outcome<C> {
        let mut outcome = Outcome::none();
        let Some(battle) = self.battles.get(&game_id) else {
            return outcome;
        };
        let players = battle.players();
        for player in players {
            let ships = battle.ships_of(player).unwrap_or_default();
            if let Some(peer) = self.peer_of(player) {
                outcome.send(Delivery::to(
                    peer,
                    ServerMessage::StartGame(StartGame {
                        ships,
                        current_player_index: first_turn,
                    }),
                ));
            }
        }
        outcome.send(Delivery::to_all(
            self.peers_of(&players),
            ServerMessage::Turn(Turn {
                current_player: first_turn,
            }),
        ));
        self.queue_bot_move(&mut outcome, game_id, first_turn);
        outcome
    }

    fn resolve_attack(
        &mut self,
        game_id: GameId,
        attacker: UserId,
        target: Option<Position>,
    ) -> Outcome<C> {
        let Some(battle) = self.battles.get_mut(&game_id) else {
            tracing::debug!(%game_id, "attack on unknown battle dropped");
            return Outcome::none();
        };
        let result = match battle.play_turn(attacker, target, &mut self.rng) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(%game_id, %attacker, error = %e, "attack rejected");
                return Outcome::none();
            }
        };
        let players = battle.players();
        let both = self.peers_of(&players);

        let mut outcome = Outcome::none();
        for feedback in attack_feedback(&result) {
            outcome.send(Delivery::to_all(both.clone(), ServerMessage::Attack(feedback)));
        }

        match result.next_turn {
            None => {
                self.bots.cancel(game_id);
                self.release_bots(&players);
                if let Err(e) = self.users.record_win(attacker) {
                    tracing::warn!(%game_id, error = %e, "could not record win");
                }
                outcome.send(Delivery::to_all(
                    both,
                    ServerMessage::Finish(Finish {
                        win_player: attacker,
                    }),
                ));
                outcome.send(Delivery::to_all(
                    self.live_peers(),
                    ServerMessage::UpdateWinners(self.users.winners()),
                ));
            }
            Some(next) => {
                outcome.send(Delivery::to_all(
                    both,
                    ServerMessage::Turn(Turn {
                        current_player: next,
                    }),
                ));
                self.queue_bot_move(&mut outcome, game_id, next);
            }
        }
        outcome
    }

    fn send_create_game(&self, outcome: &mut Outcome<C>, game_id: GameId, player: UserId) {
        if let Some(peer) = self.peer_of(player) {
            outcome.send(Delivery::to(
                peer,
                ServerMessage::CreateGame(CreateGame {
                    id_game: game_id,
                    id_player: player,
                }),
            ));
        }
    }

    fn queue_bot_move(&self, outcome: &mut Outcome<C>, game_id: GameId, turn: UserId) {
        if self.users.get(turn).is_some_and(|u| u.is_bot) {
            outcome.bot_moves.push(BotMove { game_id, bot: turn });
        }
    }

    /// Drops the detached peers of bots whose battle is over.
    fn release_bots(&mut self, players: &[UserId]) {
        for &player in players {
            if !self.users.get(player).is_some_and(|u| u.is_bot) {
                continue;
            }
            if let Some(conn) = self.users.connection_of(player) {
                self.peers.remove(&conn);
                tracing::debug!(bot = %player, %conn, "bot peer released");
            }
        }
    }

    fn room_listing_for_all(&self) -> Delivery<C> {
        Delivery::to_all(
            self.live_peers(),
            ServerMessage::UpdateRoom(self.lobby.open_rooms()),
        )
    }

    fn finish(&mut self, outcome: Outcome<C>) -> Vec<Delivery<C>> {
        for mv in outcome.bot_moves {
            self.bots.schedule(mv);
        }
        outcome.deliveries
    }

    // -----------------------------------------------------------------
    // Peer lookup
    // -----------------------------------------------------------------

    fn peer_of(&self, user: UserId) -> Option<Peer<C>> {
        self.users
            .connection_of(user)
            .and_then(|conn| self.peers.get(&conn))
            .cloned()
    }

    fn peers_of(&self, users: &[UserId]) -> Vec<Peer<C>> {
        users.iter().filter_map(|u| self.peer_of(*u)).collect()
    }

    /// Every connected client, registered or not.
    fn live_peers(&self) -> Vec<Peer<C>> {
        self.peers.values().filter(|p| p.is_live()).cloned().collect()
    }
}

/// The `attack` messages for one resolved turn.
///
/// A kill reports every cell of the ship as `killed`, starting with the
/// cell just hit, then every revealed neighbor as `miss`.
fn attack_feedback(result: &TurnResult) -> Vec<AttackFeedback> {
    let feedback = |status, position| AttackFeedback {
        current_player: result.attacker,
        status,
        position,
    };
    let Some(sunk) = &result.sunk else {
        return vec![feedback(result.status, result.position)];
    };

    let mut out = vec![feedback(AttackStatus::Killed, result.position)];
    out.extend(
        sunk.cells
            .iter()
            .filter(|c| **c != result.position)
            .map(|c| feedback(AttackStatus::Killed, *c)),
    );
    out.extend(sunk.neighbors.iter().map(|c| feedback(AttackStatus::Miss, *c)));
    out
}
