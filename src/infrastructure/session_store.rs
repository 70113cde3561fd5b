use crate::domain::models::User;
use crate::infrastructure::error::InfraError;
use std::sync::Mutex;

pub trait SessionStore: Send + Sync {
    fn save_session(&self, user: &User) -> Result<(), InfraError>;
    fn load_session(&self) -> Result<Option<User>, InfraError>;
    fn clear_session(&self) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service_name: String,
    account_name: String,
}

impl KeyringSessionStore {
    pub fn new(service_name: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            account_name: account_name.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, InfraError> {
        keyring::Entry::new(&self.service_name, &self.account_name)
            .map_err(|error| InfraError::Session(error.to_string()))
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new("slothorganize.session", "default")
    }
}

impl SessionStore for KeyringSessionStore {
    fn save_session(&self, user: &User) -> Result<(), InfraError> {
        let payload =
            serde_json::to_string(user).map_err(|error| InfraError::Session(error.to_string()))?;
        self.entry()?
            .set_password(&payload)
            .map_err(|error| InfraError::Session(error.to_string()))
    }

    fn load_session(&self) -> Result<Option<User>, InfraError> {
        let payload = match self.entry()?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(error) => return Err(InfraError::Session(error.to_string())),
        };

        let user = serde_json::from_str::<User>(&payload)
            .map_err(|error| InfraError::Session(error.to_string()))?;
        Ok(Some(user))
    }

    fn clear_session(&self) -> Result<(), InfraError> {
        match self.entry()?.delete_credential() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(InfraError::Session(error.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: Mutex<Option<User>>,
}

impl SessionStore for InMemorySessionStore {
    fn save_session(&self, user: &User) -> Result<(), InfraError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Session(format!("in-memory lock poisoned: {error}")))?;
        *guard = Some(user.clone());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<User>, InfraError> {
        let guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Session(format!("in-memory lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn clear_session(&self) -> Result<(), InfraError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|error| InfraError::Session(format!("in-memory lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }
}
