use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Header carrying the session token on authenticated requests.
pub const SESSION_HEADER: &str = "x-session-token";

/// The account resolved from the session token, inserted by the middleware and
/// passed explicitly into every service call.
#[derive(Debug, Clone, Copy)]
pub struct SessionAccount(pub Uuid);

/// Maps issued tokens to account ids. Tokens live until logout or restart.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Uuid>>>,
}

impl SessionStore {
    pub fn open(&self, account_id: Uuid) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), account_id);
        token
    }

    pub fn account(&self, token: &str) -> Option<Uuid> {
        self.sessions.lock().unwrap().get(token).copied()
    }

    pub fn close(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_open_resolve_close() {
        let sessions = SessionStore::default();
        let account_id = Uuid::new_v4();

        let token = sessions.open(account_id);
        assert_eq!(sessions.account(&token), Some(account_id));
        assert_eq!(sessions.account("unknown-token"), None);

        sessions.close(&token);
        assert_eq!(sessions.account(&token), None);
    }

    #[test]
    fn test_tokens_are_unique_per_login() {
        let sessions = SessionStore::default();
        let account_id = Uuid::new_v4();

        let first = sessions.open(account_id);
        let second = sessions.open(account_id);
        assert_ne!(first, second);

        sessions.close(&first);
        assert_eq!(sessions.account(&second), Some(account_id));
    }
}
