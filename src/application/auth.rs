use crate::domain::models::User;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::session_store::SessionStore;
use crate::infrastructure::storage::KeyValueStore;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const USERS_KEY: &str = "users";
pub const EMAIL_TAKEN_MESSAGE: &str = "Este e-mail já está cadastrado.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    name: String,
    email: String,
    salt: String,
    password_digest: String,
}

impl UserRecord {
    fn as_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(User),
    EmailTaken,
}

pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn KeyValueStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { store, sessions }
    }

    fn load_records(&self) -> Result<Vec<UserRecord>, InfraError> {
        let Some(raw) = self.store.read(USERS_KEY)? else {
            return Ok(Vec::new());
        };
        // A corrupt user blob means starting over, same as an absent one.
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    fn save_records(&self, records: &[UserRecord]) -> Result<(), InfraError> {
        let raw = serde_json::to_string(records)?;
        self.store.write(USERS_KEY, &raw)
    }

    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        id: String,
    ) -> Result<RegisterOutcome, InfraError> {
        let name = name.trim();
        let email = normalize_email(email);

        let mut records = self.load_records()?;
        if records
            .iter()
            .any(|record| normalize_email(&record.email) == email)
        {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let salt = generate_salt();
        let record = UserRecord {
            id,
            name: name.to_string(),
            email,
            password_digest: digest_password(&salt, password),
            salt,
        };
        let user = record.as_user();
        records.push(record);
        self.save_records(&records)?;

        self.sessions.save_session(&user)?;
        Ok(RegisterOutcome::Registered(user))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Option<User>, InfraError> {
        let email = normalize_email(email);
        let records = self.load_records()?;
        let Some(record) = records
            .iter()
            .find(|record| normalize_email(&record.email) == email)
        else {
            return Ok(None);
        };

        if digest_password(&record.salt, password) != record.password_digest {
            return Ok(None);
        }

        let user = record.as_user();
        self.sessions.save_session(&user)?;
        Ok(Some(user))
    }

    pub fn logout(&self) -> Result<(), InfraError> {
        self.sessions.clear_session()
    }

    pub fn current_user(&self) -> Result<Option<User>, InfraError> {
        self.sessions.load_session()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::session_store::InMemorySessionStore;
    use crate::infrastructure::storage::InMemoryKeyValueStore;

    fn service() -> (AuthService, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::default());
        let service = AuthService::new(
            Arc::new(InMemoryKeyValueStore::default()),
            sessions.clone(),
        );
        (service, sessions)
    }

    #[test]
    fn register_then_login_roundtrip() {
        let (service, sessions) = service();

        let outcome = service
            .register("Preguiça", "preguica@example.com", "senha123", "usr-1".to_string())
            .expect("register");
        let RegisterOutcome::Registered(user) = outcome else {
            panic!("expected registration to succeed");
        };
        assert_eq!(user.id, "usr-1");
        assert_eq!(sessions.load_session().expect("load"), Some(user.clone()));

        service.logout().expect("logout");
        assert_eq!(service.current_user().expect("current"), None);

        let logged_in = service
            .login("preguica@example.com", "senha123")
            .expect("login");
        assert_eq!(logged_in, Some(user));
    }

    #[test]
    fn duplicate_email_is_rejected_with_portuguese_message_available() {
        let (service, _) = service();
        service
            .register("A", "preguica@example.com", "senha123", "usr-1".to_string())
            .expect("first register");

        let outcome = service
            .register("B", " Preguica@Example.com ", "outra", "usr-2".to_string())
            .expect("second register");
        assert_eq!(outcome, RegisterOutcome::EmailTaken);
        assert_eq!(EMAIL_TAKEN_MESSAGE, "Este e-mail já está cadastrado.");
    }

    #[test]
    fn wrong_password_and_unknown_email_both_yield_none() {
        let (service, _) = service();
        service
            .register("A", "preguica@example.com", "senha123", "usr-1".to_string())
            .expect("register");

        assert_eq!(
            service.login("preguica@example.com", "errada").expect("login"),
            None
        );
        assert_eq!(
            service.login("ninguem@example.com", "senha123").expect("login"),
            None
        );
    }

    #[test]
    fn passwords_are_stored_salted_not_plaintext() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        let service = AuthService::new(store.clone(), Arc::new(InMemorySessionStore::default()));
        service
            .register("A", "preguica@example.com", "senha123", "usr-1".to_string())
            .expect("register");

        let raw = store.read("users").expect("read").expect("users blob");
        assert!(!raw.contains("senha123"));

        let records: Vec<UserRecord> = serde_json::from_str(&raw).expect("parse records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].salt.len(), 32);
        assert_eq!(records[0].password_digest.len(), 64);
    }

    #[test]
    fn corrupt_users_blob_reads_as_empty() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        store.write("users", "not json").expect("write");
        let service = AuthService::new(store, Arc::new(InMemorySessionStore::default()));

        assert_eq!(
            service.login("preguica@example.com", "senha123").expect("login"),
            None
        );
        let outcome = service
            .register("A", "preguica@example.com", "senha123", "usr-1".to_string())
            .expect("register");
        assert!(matches!(outcome, RegisterOutcome::Registered(_)));
    }
}
