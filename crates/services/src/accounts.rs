//! # Accounts
//!
//! Registration, credential checks and session issuance on top of the
//! identity ports. The hashing and token formats belong to the adapters.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, NewUser, PasswordHasher, Principal, Role, Session, SessionTokens,
    User, UserRepository,
};

pub const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

/// Sign-up form fields.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    fn validate(&self) -> DomainResult<(String, String)> {
        let username = self.username.trim();
        let email = self.email.trim().to_lowercase();

        if !USERNAME_LEN.contains(&username.chars().count()) {
            return Err(DomainError::validation(
                "Username must be between 3 and 32 characters",
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(DomainError::validation(
                "Username may only contain letters, digits, '_', '-' and '.'",
            ));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(DomainError::validation("A valid email address is required")),
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok((username.to_string(), email))
    }
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn SessionTokens>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, form: &Registration) -> DomainResult<User> {
        let (username, email) = form.validate()?;
        let password_hash = self.hasher.hash(&form.password)?;
        let user = self
            .users
            .create(NewUser {
                id: Uuid::new_v4(),
                username,
                email,
                password_hash,
                roles: vec![Role::User],
                created_at: Utc::now(),
            })
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Accepts either the username or the email address as `login`.
    pub async fn login(&self, login: &str, password: &str) -> DomainResult<Principal> {
        let user = self.users.find_by_login(login.trim()).await?;
        match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => {
                info!(user_id = %user.id, "login succeeded");
                Ok(user.principal())
            }
            _ => {
                warn!(login = %login.trim(), "login failed");
                Err(DomainError::Unauthenticated)
            }
        }
    }

    /// Like [`login`](Self::login), but only admins get through.
    pub async fn admin_login(&self, login: &str, password: &str) -> DomainResult<Principal> {
        let principal = self.login(login, password).await?;
        if !principal.is_admin() {
            warn!(user_id = %principal.user_id, "non-admin attempted admin login");
            return Err(DomainError::Unauthenticated);
        }
        Ok(principal)
    }

    /// Opens a session for `principal`, returning the signed token and its id.
    pub fn start_session(&self, principal: &Principal) -> DomainResult<(String, Uuid)> {
        let session_id = Uuid::new_v4();
        let token = self.tokens.issue(principal, session_id)?;
        Ok((token, session_id))
    }

    /// Verifies `token` and reloads its user. Sessions of deleted users are
    /// rejected; the principal reflects the stored username and roles.
    pub async fn authenticate(&self, token: &str) -> DomainResult<Session> {
        let (claimed, session_id) = self.tokens.verify(token)?;
        let Some(user) = self.users.find(claimed.user_id).await? else {
            warn!(user_id = %claimed.user_id, "session for a deleted user");
            return Err(DomainError::Unauthenticated);
        };
        Ok(Session {
            principal: user.principal(),
            session_id,
        })
    }

    /// Creates the admin account if missing and makes sure it holds the
    /// admin role. Safe to run on every deploy.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> DomainResult<User> {
        let existing = self.users.find_by_login(email).await?;
        let user = match existing {
            Some(user) => user,
            None => {
                self.register(&Registration {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await?
            }
        };

        if !user.roles.contains(&Role::Admin) {
            self.users.grant_role(user.id, Role::Admin).await?;
            info!(user_id = %user.id, "admin role granted");
        }
        self.users
            .find(user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user.id))
    }
}
