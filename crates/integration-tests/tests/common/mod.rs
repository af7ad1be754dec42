//! Shared fixtures: an in-memory application with real token and forgery
//! adapters, plus helpers for minting users and sessions.

#![allow(dead_code)]

#[cfg(feature = "web-axum")]
pub mod http;

use std::sync::Arc;

use fake::faker::name::en::FirstName;
use fake::Fake;
use uuid::Uuid;

use auth_adapters::{HmacCsrfGuard, JwtSessions};
use domains::{
    CsrfGuard, DomainResult, PasswordHasher, Post, PostDraft, User,
};
use services::{AppServices, Registration, Repositories};
use storage_adapters::InMemoryStore;

pub const PASSWORD: &str = "password123";
pub const ADMIN_EMAIL: &str = "admin@blog.com";
pub const ADMIN_PASSWORD: &str = "Admin@123";

/// Cheap stand-in for Argon2 so fixtures stay fast.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> DomainResult<String> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain$") == Some(password)
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub services: AppServices,
    pub csrf: Arc<HmacCsrfGuard>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let services = AppServices::new(
            Repositories::from_store(store.clone()),
            Arc::new(PlainHasher),
            Arc::new(JwtSessions::new(
                b"integration-jwt-secret",
                chrono::Duration::minutes(30),
            )),
        );
        let csrf = Arc::new(
            HmacCsrfGuard::new(b"integration-csrf-secret").expect("hmac accepts any key length"),
        );
        Self {
            store,
            services,
            csrf,
        }
    }

    /// Registers a user with a random, valid username.
    pub async fn user(&self) -> User {
        let username = unique_username();
        self.services
            .accounts
            .register(&Registration {
                email: format!("{username}@example.com"),
                username,
                password: PASSWORD.to_string(),
            })
            .await
            .expect("registration succeeds")
    }

    pub async fn admin(&self) -> User {
        self.services
            .accounts
            .ensure_admin("admin", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("admin seeded")
    }

    pub async fn post(&self, author: &User, title: &str, category: &str) -> Post {
        self.services
            .posts
            .create(
                &author.principal(),
                &PostDraft::new(title, format!("{title} body"), category),
            )
            .await
            .expect("post created")
    }

    /// A session cookie header value and the matching forgery token.
    pub fn session(&self, user: &User) -> SessionFixture {
        let (token, session_id) = self
            .services
            .accounts
            .start_session(&user.principal())
            .expect("session issued");
        SessionFixture {
            cookie: format!("inkwell_session={token}"),
            csrf: self.csrf.issue(&session_id.to_string()),
        }
    }

    /// An anonymous visitor: the anon cookie and its forgery token.
    pub fn anonymous(&self) -> SessionFixture {
        let id = Uuid::new_v4().to_string();
        SessionFixture {
            cookie: format!("inkwell_anon={id}"),
            csrf: self.csrf.issue(&id),
        }
    }
}

pub struct SessionFixture {
    pub cookie: String,
    pub csrf: String,
}

pub fn unique_username() -> String {
    let first: String = FirstName().fake();
    let first: String = first.chars().filter(char::is_ascii_alphanumeric).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", first.to_lowercase(), &suffix[..8])
}
