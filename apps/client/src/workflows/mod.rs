//! Feature workflows: one state machine per product surface.
//!
//! Every workflow publishes its view state through a `watch` channel so a
//! host can re-render on change. Handlers take `&self`, never hold a lock
//! across an await, and ignore a second trigger while the first is still
//! in flight.

pub mod applications;
pub mod cover_letter;
pub mod cv_optimizer;
pub mod dashboard;
pub mod photo;
pub mod settings;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::errors::ApiError;

/// Status of one user-triggered action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
    /// Refused by the entitlement gate, locally or by a 402.
    Gated,
}

impl Phase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Phase::InFlight)
    }

    /// Replaces the phase unless a request is still in flight.
    pub(crate) fn settle(&mut self, next: Phase) {
        if !self.is_in_flight() {
            *self = next;
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Phase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// 402 becomes `Gated`; anything else the given user-facing message.
    pub(crate) fn from_error(err: &ApiError, message: &str) -> Self {
        if err.is_payment_required() {
            Phase::Gated
        } else {
            Phase::Failed(message.to_string())
        }
    }
}

/// The "upgrade to premium" modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradePrompt {
    pub visible: bool,
    pub subscribing: bool,
}

pub(crate) trait HasUpgradePrompt {
    fn upgrade_mut(&mut self) -> &mut UpgradePrompt;
}

/// Mounted flag shared between a workflow and whoever displays it.
///
/// Requests are never aborted; once unmounted, their completions are dropped.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    mounted: Arc<AtomicBool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// View state plus lifecycle, the plumbing every workflow shares.
pub(crate) struct ViewState<V> {
    tx: watch::Sender<V>,
    lifecycle: Lifecycle,
}

impl<V: Clone> ViewState<V> {
    pub(crate) fn new(initial: V, lifecycle: Lifecycle) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx, lifecycle }
    }

    pub(crate) fn get(&self) -> V {
        self.tx.borrow().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<V> {
        self.tx.subscribe()
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    /// Direct user edits (typing, selecting).
    pub(crate) fn modify(&self, f: impl FnOnce(&mut V)) {
        self.tx.send_modify(f);
    }

    /// Completion of an async action. Dropped after unmount.
    pub(crate) fn apply(&self, f: impl FnOnce(&mut V)) -> bool {
        if !self.lifecycle.is_mounted() {
            debug!("Dropping completion for unmounted workflow");
            return false;
        }
        self.tx.send_modify(f);
        true
    }

    /// Moves the phase to `InFlight` unless it already is.
    /// Returns false when the trigger should be ignored.
    pub(crate) fn begin(&self, phase: impl FnOnce(&mut V) -> &mut Phase) -> bool {
        self.try_modify(|v| {
            let p = phase(v);
            if p.is_in_flight() {
                false
            } else {
                *p = Phase::InFlight;
                true
            }
        })
    }

    /// Conditional edit; `f` returns whether it changed anything.
    /// Always false once unmounted.
    pub(crate) fn try_modify(&self, f: impl FnOnce(&mut V) -> bool) -> bool {
        if !self.lifecycle.is_mounted() {
            return false;
        }
        self.tx.send_if_modified(f)
    }
}

impl<V: Clone + HasUpgradePrompt> ViewState<V> {
    pub(crate) fn show_upgrade(&self) {
        self.tx.send_modify(|v| v.upgrade_mut().visible = true);
    }

    pub(crate) fn dismiss_upgrade(&self) {
        self.tx.send_modify(|v| v.upgrade_mut().visible = false);
    }

    /// Starts checkout and returns the URL the host should open.
    /// `subscribing` stays set on success since the host navigates away.
    pub(crate) async fn checkout(
        &self,
        api: &ApiClient,
        success_url: &str,
        cancel_url: &str,
    ) -> Option<String> {
        let started = self.tx.send_if_modified(|v| {
            let prompt = v.upgrade_mut();
            if prompt.subscribing {
                false
            } else {
                prompt.subscribing = true;
                true
            }
        });
        if !started {
            return None;
        }

        match api.subscriptions().checkout(success_url, cancel_url).await {
            Ok(session) => Some(session.checkout_url),
            Err(e) => {
                warn!("Checkout failed: {e}");
                self.apply(|v| v.upgrade_mut().subscribing = false);
                None
            }
        }
    }
}
