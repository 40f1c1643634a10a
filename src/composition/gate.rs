//! At-most-once realization gate shared by the sync and async paths.
//!
//! The first caller to find the gate `Uncomputed` receives a [`Pending`]
//! token and performs realization. Everyone else waits for the token to
//! settle: async callers on a watch channel, sync callers on a condvar.
//! Dropping the token without completing it returns the gate to
//! `Uncomputed` so a later caller can retry.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tokio::sync::watch;

use super::Provider;
use crate::error::{CompositionError, Result};

pub(crate) type Providers = Arc<[Provider]>;

enum State {
    Uncomputed,
    Pending(watch::Receiver<()>),
    Ready(Providers),
    Disposed,
}

pub(crate) enum Entry<'a> {
    Ready(Providers),
    Realize(Pending<'a>),
}

pub(crate) struct Gate {
    state: Mutex<State>,
    settled: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Uncomputed),
            settled: Condvar::new(),
        }
    }

    /// Blocks while another caller is realizing.
    pub(crate) fn enter_sync(&self) -> Result<Entry<'_>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                State::Ready(providers) => return Ok(Entry::Ready(providers.clone())),
                State::Disposed => return Err(CompositionError::Disposed),
                State::Pending(_) => self.settled.wait(&mut state),
                State::Uncomputed => return Ok(Entry::Realize(self.begin(&mut state))),
            }
        }
    }

    pub(crate) async fn enter(&self) -> Result<Entry<'_>> {
        loop {
            let mut pending = {
                let mut state = self.state.lock();
                match &*state {
                    State::Ready(providers) => return Ok(Entry::Ready(providers.clone())),
                    State::Disposed => return Err(CompositionError::Disposed),
                    State::Pending(rx) => rx.clone(),
                    State::Uncomputed => return Ok(Entry::Realize(self.begin(&mut state))),
                }
            };
            // Resolves once the realizing caller drops its sender, whether it
            // completed or gave up.
            let _ = pending.changed().await;
        }
    }

    fn begin(&self, state: &mut State) -> Pending<'_> {
        let (tx, rx) = watch::channel(());
        *state = State::Pending(rx);
        Pending {
            gate: self,
            notify: Some(tx),
        }
    }

    pub(crate) fn providers(&self) -> Option<Providers> {
        match &*self.state.lock() {
            State::Ready(providers) => Some(providers.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_realized(&self) -> bool {
        matches!(*self.state.lock(), State::Ready(_))
    }

    pub(crate) fn is_disposed(&self) -> bool {
        matches!(*self.state.lock(), State::Disposed)
    }

    /// Move to `Disposed`, returning the providers if any were realized.
    ///
    /// Waits for a pending realization to settle first.
    pub(crate) fn close(&self) -> Option<Providers> {
        let mut state = self.state.lock();
        while matches!(*state, State::Pending(_)) {
            self.settled.wait(&mut state);
        }
        match std::mem::replace(&mut *state, State::Disposed) {
            State::Ready(providers) => Some(providers),
            _ => None,
        }
    }
}

/// Token held by the caller performing realization.
pub(crate) struct Pending<'a> {
    gate: &'a Gate,
    notify: Option<watch::Sender<()>>,
}

impl Pending<'_> {
    pub(crate) fn complete(mut self, providers: Providers) -> Providers {
        {
            let mut state = self.gate.state.lock();
            *state = State::Ready(providers.clone());
            self.gate.settled.notify_all();
        }
        self.notify.take();
        providers
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.notify.is_some() {
            let mut state = self.gate.state.lock();
            if matches!(*state, State::Pending(_)) {
                *state = State::Uncomputed;
            }
            self.gate.settled.notify_all();
        }
    }
}
