//! The user directory: every player the server has ever seen.
//!
//! `UserDirectory` is not thread-safe by itself. It is owned by the
//! dispatcher hub, which is the only thing that touches it, behind the
//! hub's lock.

use std::collections::HashMap;

use broadside_protocol::{UserId, Winner};
use broadside_transport::ConnectionId;

use crate::{SessionError, User};

/// In-memory registry of users.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ [connected] ──detach()──→ [disconnected]
///                     ↑                          │
///                     └──── register() again ────┘
/// ```
///
/// Users are never removed.
#[derive(Debug, Default)]
pub struct UserDirectory {
    /// All users, keyed by id.
    users: HashMap<UserId, User>,

    /// Human users by name. Bots are not indexed, so a human can never
    /// collide with or log into a bot account.
    by_name: HashMap<String, UserId>,

    /// Which user each live connection is bound to.
    by_connection: HashMap<ConnectionId, UserId>,

    next_id: u64,
}

impl UserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a user in, creating the account on first use.
    ///
    /// Returns the user and whether the account already existed. The
    /// connection is (re)attached either way: if the user was reachable on
    /// another connection, that binding is dropped, and if this connection
    /// was bound to another user, that user is detached.
    ///
    /// # Errors
    /// - [`SessionError::InvalidCredentials`]: empty name or password
    /// - [`SessionError::AuthFailed`]: name exists, password differs
    pub fn register(
        &mut self,
        name: &str,
        password: &str,
        connection: ConnectionId,
    ) -> Result<(User, bool), SessionError> {
        if name.is_empty() {
            return Err(SessionError::InvalidCredentials("name is empty".into()));
        }
        if password.is_empty() {
            return Err(SessionError::InvalidCredentials(
                "password is empty".into(),
            ));
        }

        if let Some(&id) = self.by_name.get(name) {
            let matches = self
                .users
                .get(&id)
                .is_some_and(|u| u.password_matches(password));
            if !matches {
                tracing::info!(%id, name, "login rejected: wrong password");
                return Err(SessionError::AuthFailed(name.to_string()));
            }
            self.attach(id, connection);
            tracing::info!(%id, name, %connection, "user logged in again");
            return self.get(id).cloned().map(|u| (u, true)).ok_or(SessionError::NotFound(id));
        }

        let id = self.allocate_id();
        self.users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                password: password.to_string(),
                wins: 0,
                connection: None,
                is_bot: false,
            },
        );
        self.by_name.insert(name.to_string(), id);
        self.attach(id, connection);
        tracing::info!(%id, name, %connection, "user registered");

        self.get(id)
            .cloned()
            .map(|u| (u, false))
            .ok_or(SessionError::NotFound(id))
    }

    /// Creates a synthetic bot user bound to the given (detached) connection.
    pub fn create_bot(&mut self, connection: ConnectionId) -> User {
        let id = self.allocate_id();
        let bot = User {
            id,
            name: format!("Bot-{}", id.0),
            password: String::new(),
            wins: 0,
            connection: Some(connection),
            is_bot: true,
        };
        self.users.insert(id, bot.clone());
        tracing::debug!(%id, "bot user created");
        bot
    }

    /// Increments a user's win count and returns the new total.
    pub fn record_win(&mut self, id: UserId) -> Result<u32, SessionError> {
        let user = self.users.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        user.wins += 1;
        tracing::info!(%id, name = %user.name, wins = user.wins, "win recorded");
        Ok(user.wins)
    }

    /// Unbinds a closed connection. Returns the user it belonged to.
    pub fn detach(&mut self, connection: ConnectionId) -> Option<UserId> {
        let id = self.by_connection.remove(&connection)?;
        if let Some(user) = self.users.get_mut(&id) {
            if user.connection == Some(connection) {
                user.connection = None;
            }
        }
        tracing::debug!(%id, %connection, "user detached");
        Some(id)
    }

    /// Looks up a user by id.
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Looks up the user bound to a connection.
    pub fn user_by_connection(&self, connection: ConnectionId) -> Option<&User> {
        self.by_connection
            .get(&connection)
            .and_then(|id| self.users.get(id))
    }

    /// The connection a user is currently reachable on.
    pub fn connection_of(&self, id: UserId) -> Option<ConnectionId> {
        self.users.get(&id).and_then(|u| u.connection)
    }

    /// The leaderboard: human users with at least one win, most wins
    /// first, ties broken by name.
    pub fn winners(&self) -> Vec<Winner> {
        let mut ranked: Vec<&User> = self
            .users
            .values()
            .filter(|u| !u.is_bot && u.wins > 0)
            .collect();
        ranked.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
        ranked
            .into_iter()
            .map(|u| Winner {
                name: u.name.clone(),
                wins: u.wins,
            })
            .collect()
    }

    /// Number of users, bots included.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn allocate_id(&mut self) -> UserId {
        self.next_id += 1;
        UserId(self.next_id)
    }

    fn attach(&mut self, id: UserId, connection: ConnectionId) {
        // This connection may have been logged in as someone else.
        if let Some(previous) = self.by_connection.insert(connection, id) {
            if previous != id {
                if let Some(user) = self.users.get_mut(&previous) {
                    user.connection = None;
                }
            }
        }
        if let Some(user) = self.users.get_mut(&id) {
            if let Some(old) = user.connection.replace(connection) {
                if old != connection {
                    self.by_connection.remove(&old);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_register_new_user_starts_with_zero_wins() {
        let mut dir = UserDirectory::new();
        let (user, returning) = dir.register("ann", "pw", conn(1)).unwrap();
        assert!(!returning);
        assert_eq!(user.name, "ann");
        assert_eq!(user.wins, 0);
        assert_eq!(user.connection, Some(conn(1)));
        assert!(!user.is_bot);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_register_ids_are_unique() {
        let mut dir = UserDirectory::new();
        let (a, _) = dir.register("ann", "pw", conn(1)).unwrap();
        let (b, _) = dir.register("bob", "pw", conn(2)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_register_returning_user_reattaches_connection() {
        let mut dir = UserDirectory::new();
        let (first, _) = dir.register("ann", "pw", conn(1)).unwrap();
        dir.detach(conn(1));
        assert_eq!(dir.connection_of(first.id), None);

        let (again, returning) = dir.register("ann", "pw", conn(2)).unwrap();
        assert!(returning);
        assert_eq!(again.id, first.id);
        assert_eq!(dir.connection_of(first.id), Some(conn(2)));
        assert_eq!(dir.user_by_connection(conn(2)).unwrap().id, first.id);
    }

    #[test]
    fn test_register_wrong_password_is_auth_error() {
        let mut dir = UserDirectory::new();
        dir.register("ann", "pw", conn(1)).unwrap();
        let err = dir.register("ann", "nope", conn(2)).unwrap_err();
        assert!(matches!(err, SessionError::AuthFailed(name) if name == "ann"));
        // The failed attempt must not steal the binding.
        assert!(dir.user_by_connection(conn(2)).is_none());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_register_empty_credentials_rejected() {
        let mut dir = UserDirectory::new();
        assert!(matches!(
            dir.register("", "pw", conn(1)),
            Err(SessionError::InvalidCredentials(_))
        ));
        assert!(matches!(
            dir.register("ann", "", conn(1)),
            Err(SessionError::InvalidCredentials(_))
        ));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_names_are_taken_verbatim() {
        let mut dir = UserDirectory::new();
        let (ann, _) = dir.register("ann", "pw", conn(1)).unwrap();
        let (spaced, returning) = dir.register(" ann", "other", conn(2)).unwrap();
        assert!(!returning);
        assert_ne!(spaced.id, ann.id);
        assert_eq!(spaced.name, " ann");
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_login_from_second_connection_moves_binding() {
        let mut dir = UserDirectory::new();
        let (ann, _) = dir.register("ann", "pw", conn(1)).unwrap();
        dir.register("ann", "pw", conn(2)).unwrap();
        assert!(dir.user_by_connection(conn(1)).is_none());
        assert_eq!(dir.connection_of(ann.id), Some(conn(2)));

        // Closing the stale connection does not detach the new one.
        assert_eq!(dir.detach(conn(1)), None);
        assert_eq!(dir.connection_of(ann.id), Some(conn(2)));
    }

    #[test]
    fn test_switching_user_on_same_connection_detaches_previous() {
        let mut dir = UserDirectory::new();
        let (ann, _) = dir.register("ann", "pw", conn(1)).unwrap();
        let (bob, _) = dir.register("bob", "pw", conn(1)).unwrap();
        assert_eq!(dir.connection_of(ann.id), None);
        assert_eq!(dir.user_by_connection(conn(1)).unwrap().id, bob.id);
    }

    #[test]
    fn test_record_win_and_leaderboard_order() {
        let mut dir = UserDirectory::new();
        let (ann, _) = dir.register("ann", "pw", conn(1)).unwrap();
        let (bob, _) = dir.register("bob", "pw", conn(2)).unwrap();
        dir.register("cid", "pw", conn(3)).unwrap();

        dir.record_win(bob.id).unwrap();
        assert_eq!(dir.record_win(bob.id).unwrap(), 2);
        dir.record_win(ann.id).unwrap();

        let winners = dir.winners();
        assert_eq!(winners.len(), 2, "users without wins are not listed");
        assert_eq!(winners[0].name, "bob");
        assert_eq!(winners[0].wins, 2);
        assert_eq!(winners[1].name, "ann");
    }

    #[test]
    fn test_record_win_unknown_user() {
        let mut dir = UserDirectory::new();
        assert!(matches!(
            dir.record_win(UserId(99)),
            Err(SessionError::NotFound(UserId(99)))
        ));
    }

    #[test]
    fn test_bots_are_not_name_indexed_or_ranked() {
        let mut dir = UserDirectory::new();
        let bot = dir.create_bot(conn(50));
        assert!(bot.is_bot);
        dir.record_win(bot.id).unwrap();
        assert!(dir.winners().is_empty());

        // A human may pick the bot's display name.
        let (human, returning) = dir.register(&bot.name, "pw", conn(1)).unwrap();
        assert!(!returning);
        assert_ne!(human.id, bot.id);
    }
}
