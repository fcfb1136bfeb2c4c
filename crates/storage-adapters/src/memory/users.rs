use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use domains::{
    DomainError, NewUser, PhotoChange, ProfileUpdate, Result, User, UserId, UserRepository,
};

use super::MemoryStore;

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = self.emails.get(&email.to_lowercase()).map(|id| *id);
        Ok(id.and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.code.as_deref() == Some(code))
            .map(|u| u.clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let id = match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => {
                return Err(DomainError::Conflict(format!("e-mail {} is taken", user.email)))
            }
            Entry::Vacant(slot) => {
                let id = self.user_ids.next();
                slot.insert(id);
                id
            }
        };
        let user = User {
            id,
            is_moderator: user.is_moderator,
            reg_time: user.reg_time,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            code: None,
            photo: None,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<()> {
        let old_email = self
            .users
            .get(&id)
            .map(|u| u.email.to_lowercase())
            .ok_or_else(|| DomainError::not_found("User", id))?;

        let new_email = update.email.to_lowercase();
        if new_email != old_email {
            match self.emails.entry(new_email) {
                Entry::Occupied(_) => {
                    return Err(DomainError::Conflict(format!("e-mail {} is taken", update.email)))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&old_email);
        }

        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.name = update.name;
        user.email = update.email;
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        match update.photo {
            PhotoChange::Keep => {}
            PhotoChange::Remove => user.photo = None,
            PhotoChange::Set(path) => user.photo = Some(path),
        }
        Ok(())
    }

    async fn set_code(&self, id: UserId, code: Option<String>) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.code = code;
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}
