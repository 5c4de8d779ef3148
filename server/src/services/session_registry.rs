// server/src/services/session_registry.rs

//! Live login sessions, one per account.

use crate::errors::AppError;
use baoleme_core::domain::Role;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const ALREADY_LOGGED_IN: &str = "该用户已登录，请先登出";

/// An account key. Ids are only unique within a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
  pub role: Role,
  pub id: i64,
}

impl Principal {
  pub fn new(role: Role, id: i64) -> Self {
    Self { role, id }
  }
}

struct Session {
  principal: Principal,
  expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Sessions {
  by_token: HashMap<String, Session>,
  by_principal: HashMap<Principal, String>,
}

impl Sessions {
  fn remove_token(&mut self, token: &str) -> Option<Principal> {
    let session = self.by_token.remove(token)?;
    if self.by_principal.get(&session.principal).map(String::as_str) == Some(token) {
      self.by_principal.remove(&session.principal);
    }
    Some(session.principal)
  }

  /// Drops every expired session, including those whose account never returns.
  fn prune(&mut self, now: DateTime<Utc>) -> usize {
    let before = self.by_token.len();
    self.by_token.retain(|_, session| session.expires_at > now);
    let by_token = &self.by_token;
    self.by_principal.retain(|_, token| by_token.contains_key(token));
    before - self.by_token.len()
  }

  fn live_token(&mut self, principal: Principal, now: DateTime<Utc>) -> Option<&str> {
    let token = self.by_principal.get(&principal)?.clone();
    let expired = self.by_token.get(&token).map_or(true, |s| s.expires_at <= now);
    if expired {
      self.remove_token(&token);
      self.by_principal.remove(&principal);
      return None;
    }
    self.by_principal.get(&principal).map(String::as_str)
  }
}

pub struct SessionRegistry {
  ttl: Duration,
  inner: RwLock<Sessions>,
}

impl SessionRegistry {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      inner: RwLock::new(Sessions::default()),
    }
  }

  /// Records a login. Fails while the account still has a live session.
  #[instrument(name = "session_registry::open", skip(self, token), fields(role = %principal.role, id = principal.id), err(Display))]
  pub fn open(&self, principal: Principal, token: &str) -> Result<(), AppError> {
    self.open_at(principal, token, Utc::now())
  }

  pub fn open_at(&self, principal: Principal, token: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    let mut sessions = self.inner.write();
    let pruned = sessions.prune(now);
    if pruned > 0 {
      debug!(pruned, "Expired sessions swept.");
    }
    if sessions.live_token(principal, now).is_some() {
      return Err(AppError::Conflict(ALREADY_LOGGED_IN.to_string()));
    }
    sessions.by_token.insert(
      token.to_string(),
      Session {
        principal,
        expires_at: now + self.ttl,
      },
    );
    sessions.by_principal.insert(principal, token.to_string());
    debug!("Session opened.");
    Ok(())
  }

  /// Swaps the account's session for `new_token`, e.g. after a rename.
  pub fn replace(&self, principal: Principal, new_token: &str) {
    let mut sessions = self.inner.write();
    if let Some(old) = sessions.by_principal.get(&principal).cloned() {
      sessions.remove_token(&old);
    }
    sessions.by_token.insert(
      new_token.to_string(),
      Session {
        principal,
        expires_at: Utc::now() + self.ttl,
      },
    );
    sessions.by_principal.insert(principal, new_token.to_string());
  }

  /// The account behind `token`, if the session is still live. Expired entries are dropped.
  pub fn resolve(&self, token: &str) -> Option<Principal> {
    self.resolve_at(token, Utc::now())
  }

  pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<Principal> {
    {
      let sessions = self.inner.read();
      match sessions.by_token.get(token) {
        None => return None,
        Some(session) if session.expires_at > now => return Some(session.principal),
        Some(_) => {}
      }
    }
    self.inner.write().remove_token(token);
    None
  }

  pub fn close(&self, token: &str) -> Option<Principal> {
    self.inner.write().remove_token(token)
  }

  /// Ends whatever session the account has, used when the account is deleted.
  pub fn close_principal(&self, principal: Principal) {
    let mut sessions = self.inner.write();
    if let Some(token) = sessions.by_principal.remove(&principal) {
      sessions.by_token.remove(&token);
    }
  }

  pub fn len(&self) -> usize {
    self.inner.read().by_token.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn registry() -> SessionRegistry {
    SessionRegistry::new(Duration::hours(24))
  }

  #[test]
  fn second_login_is_refused_until_logout() {
    let sessions = registry();
    let alice = Principal::new(Role::User, 1);
    sessions.open(alice, "t1").unwrap();

    let err = sessions.open(alice, "t2").unwrap_err();
    assert!(matches!(err, AppError::Conflict(m) if m == ALREADY_LOGGED_IN));

    assert_eq!(sessions.close("t1"), Some(alice));
    assert!(sessions.open(alice, "t2").is_ok());
    assert_eq!(sessions.resolve("t2"), Some(alice));
    assert_eq!(sessions.resolve("t1"), None);
  }

  #[test]
  fn roles_have_separate_namespaces() {
    let sessions = registry();
    sessions.open(Principal::new(Role::User, 7), "u").unwrap();
    sessions.open(Principal::new(Role::Rider, 7), "r").unwrap();
    assert_eq!(sessions.resolve("r"), Some(Principal::new(Role::Rider, 7)));
    assert_eq!(sessions.len(), 2);
  }

  #[test]
  fn sessions_expire_lazily() {
    let sessions = registry();
    let bob = Principal::new(Role::Merchant, 3);
    let start = Utc::now();
    sessions.open_at(bob, "old", start).unwrap();

    let later = start + Duration::hours(25);
    assert_eq!(sessions.resolve_at("old", later), None);
    assert_eq!(sessions.len(), 0);
    assert!(sessions.open_at(bob, "new", later).is_ok());
  }

  #[test]
  fn replace_revokes_the_previous_token() {
    let sessions = registry();
    let carol = Principal::new(Role::User, 9);
    sessions.open(carol, "before").unwrap();
    sessions.replace(carol, "after");
    assert_eq!(sessions.resolve("before"), None);
    assert_eq!(sessions.resolve("after"), Some(carol));

    sessions.close_principal(carol);
    assert_eq!(sessions.resolve("after"), None);
  }

  #[test]
  fn opening_a_session_sweeps_abandoned_ones() {
    let sessions = registry();
    let start = Utc::now();
    sessions.open_at(Principal::new(Role::User, 1), "gone-1", start).unwrap();
    sessions.open_at(Principal::new(Role::Rider, 2), "gone-2", start).unwrap();
    assert_eq!(sessions.len(), 2);

    let later = start + Duration::hours(25);
    sessions.open_at(Principal::new(Role::Merchant, 3), "fresh", later).unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions.inner.read().by_principal.len(), 1);
    assert_eq!(sessions.resolve_at("fresh", later), Some(Principal::new(Role::Merchant, 3)));
  }
}
