//! Authentication-aware navigation guard
//!
//! [`NavigationGuard`] runs before every transition and decides, from the
//! target's [`RouteMeta`](crate::navigation::RouteMeta) and the session state:
//!
//! - `requires_auth` and anonymous: try a token refresh; if that fails,
//!   remember the target as the pending redirect and send the visitor to the
//!   route's `redirect_to` (or the configured default).
//! - `guest_only` and authenticated: redirect away the same way.
//! - anything else: allow.
//!
//! A redirect whose target is the route being entered would loop, so it is
//! turned into [`NavigationDecision::Block`].
//!
//! Each evaluation takes a ticket. If a newer evaluation starts while this one
//! is suspended on the refresh, this one returns
//! [`NavigationDecision::Superseded`] and leaves no trace.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::navigation::{NavigationDecision, NavigationHook, Route};
use crate::session::SessionController;

/// Pre-navigation hook enforcing route authentication requirements.
///
/// Holds a weak reference to its controller; the router owns the guard and
/// the controller owns the router, so a strong one would never be freed.
/// Once the controller is gone, protected routes are blocked and everything
/// else is allowed.
#[derive(Debug)]
pub struct NavigationGuard {
    session: Weak<SessionController>,
    ticket: AtomicU64,
}

impl NavigationGuard {
    /// Creates a guard bound to `session`.
    pub fn new(session: &Arc<SessionController>) -> Self {
        Self {
            session: Arc::downgrade(session),
            ticket: AtomicU64::new(0),
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.ticket.load(Ordering::SeqCst) == ticket
    }

    fn redirect_target(session: &SessionController, to: &Route) -> String {
        to.meta
            .redirect_to
            .clone()
            .unwrap_or_else(|| session.config().default_redirect.clone())
    }
}

#[async_trait::async_trait]
impl NavigationHook for NavigationGuard {
    async fn before_navigate(&self, to: &Route, _from: Option<&Route>) -> NavigationDecision {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(session) = self.session.upgrade() else {
            if to.meta.requires_auth {
                tracing::warn!("Session gone; blocking protected route {}", to.path);
                return NavigationDecision::Block;
            }
            return NavigationDecision::Allow;
        };

        if to.meta.requires_auth && !session.is_authenticated() {
            let refreshed = session.try_refresh_token().await;
            if !self.is_current(ticket) {
                tracing::debug!("Navigation to {} superseded", to.full_path);
                return NavigationDecision::Superseded;
            }
            if refreshed {
                return NavigationDecision::Allow;
            }

            let target = Self::redirect_target(&session, to);
            if target == to.path {
                tracing::warn!(
                    "Route {} requires auth but redirects to itself; blocking",
                    to.path
                );
                return NavigationDecision::Block;
            }
            session.set_pending_redirect(to.full_path.clone());
            tracing::debug!("Unauthenticated visit to {}, redirecting to {}", to.full_path, target);
            return NavigationDecision::Redirect(target);
        }

        if to.meta.guest_only && session.is_authenticated() {
            let target = Self::redirect_target(&session, to);
            if target == to.path {
                tracing::warn!("Guest-only route {} redirects to itself; blocking", to.path);
                return NavigationDecision::Block;
            }
            return NavigationDecision::Redirect(target);
        }

        NavigationDecision::Allow
    }
}
