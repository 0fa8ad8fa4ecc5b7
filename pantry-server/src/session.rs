use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRef, FromRequestParts};
use axum::{async_trait, http::request::Parts};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use dashmap::DashMap;
use pantry_client::Kitchen;
use tokio::sync::Mutex;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_ID_BYTES: usize = 16;

pub type SessionID = String;
pub type KitchenHandle = Arc<Mutex<Kitchen>>;

struct Session {
    kitchen: KitchenHandle,
    last_seen: Instant,
}

/// Every visitor's kitchen, keyed by their session cookie.
/// Held in memory only; a restart starts everyone over.
#[derive(Clone, Default)]
pub struct Sessions {
    kitchens: Arc<DashMap<SessionID, Session>>,
}

impl Sessions {
    pub fn new_id() -> SessionID {
        hex::encode(rand::random::<[u8; SESSION_ID_BYTES]>())
    }

    /// Only ids shaped like the ones we hand out are accepted.
    pub fn is_valid_id(id: &str) -> bool {
        hex::decode(id).is_ok_and(|bytes| bytes.len() == SESSION_ID_BYTES)
    }

    /// The kitchen for a session, stocked with staples on first use.
    pub fn kitchen(&self, id: &str) -> KitchenHandle {
        let mut session = self.kitchens.entry(id.to_string()).or_insert_with(|| Session {
            kitchen: Arc::new(Mutex::new(Kitchen::new())),
            last_seen: Instant::now(),
        });
        session.last_seen = Instant::now();
        session.kitchen.clone()
    }

    /// The kitchen for a session, if it already has one.
    pub fn get(&self, id: &str) -> Option<KitchenHandle> {
        let mut session = self.kitchens.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(session.kitchen.clone())
    }

    /// Forget kitchens nobody has touched for `max_idle`.
    /// A kitchen that is locked or busy generating is always kept.
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let before = self.kitchens.len();
        self.kitchens.retain(|_, session| {
            if session.last_seen.elapsed() < max_idle {
                return true;
            }
            match session.kitchen.try_lock() {
                Ok(kitchen) => kitchen.is_busy(),
                Err(_) => true,
            }
        });
        before.saturating_sub(self.kitchens.len())
    }

    /// Sweep idle kitchens every `every` for as long as the server runs.
    pub fn spawn_sweeper(&self, every: Duration, max_idle: Duration) {
        let sessions = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                let removed = sessions.sweep(max_idle);
                if removed > 0 {
                    tracing::info!("Dropped {} idle kitchens, {} remain", removed, sessions.len());
                }
            }
        });
    }

    pub fn len(&self) -> usize {
        self.kitchens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kitchens.is_empty()
    }
}

/// The current visitor. Use this as a request guard to get their kitchen.
///
/// Handlers must send `jar` back so a newly issued session cookie reaches the browser.
pub struct Visitor {
    pub id: SessionID,
    pub jar: CookieJar,
    sessions: Sessions,
}

impl Visitor {
    /// The visitor's kitchen, created if this is their first change.
    pub fn kitchen(&self) -> KitchenHandle {
        self.sessions.kitchen(&self.id)
    }

    /// The visitor's kitchen if one is stored. Reading never creates one.
    pub fn existing_kitchen(&self) -> Option<KitchenHandle> {
        self.sessions.get(&self.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Visitor
where
    Sessions: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Sessions::from_ref(state);
        let mut jar = CookieJar::from_request_parts(parts, state).await?;
        let id = match jar.get(SESSION_COOKIE) {
            Some(cookie) if Sessions::is_valid_id(cookie.value()) => cookie.value().to_string(),
            _ => {
                let id = Sessions::new_id();
                tracing::info!("Starting a new kitchen session");
                let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .path("/");
                jar = jar.add(cookie);
                id
            }
        };
        Ok(Visitor { id, jar, sessions })
    }
}
