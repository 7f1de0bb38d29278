//! Hand-off of resolved favorite state to the presentation layer.
//!
//! # Design
//! Requests cannot be cancelled, so a screen that switches movies (or goes
//! away) while a request is in flight still receives the late result.
//! `FavoriteProjector` stamps every selection with a generation number and
//! drops results whose selection is no longer the active one. Only `Ok`
//! outcomes reach the sink; a failed request leaves the last acknowledged
//! state on screen.
//!
//! Applies are serialised end to end (state write and sink call), so the
//! last value the sink saw is always `current()`. The sink may read the
//! projector but must not call `apply` from inside `favorite_changed`.

use std::sync::{Mutex, MutexGuard};

use crate::error::ApiError;
use crate::types::Movie;

/// Receives favorite state changes, e.g. to tint a button.
///
/// Invoked on whichever thread applies the result; hopping to a UI thread is
/// the implementor's job.
pub trait FavoriteSink: Send + Sync {
    fn favorite_changed(&self, movie_id: i64, favorite: bool);
}

impl<F> FavoriteSink for F
where
    F: Fn(i64, bool) + Send + Sync,
{
    fn favorite_changed(&self, movie_id: i64, favorite: bool) {
        self(movie_id, favorite)
    }
}

/// Ticket identifying which selection a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub movie_id: i64,
    generation: u64,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    active: Option<i64>,
    favorite: Option<bool>,
}

pub struct FavoriteProjector<S> {
    sink: S,
    state: Mutex<State>,
    notify: Mutex<()>,
}

impl<S: FavoriteSink> FavoriteProjector<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: Mutex::new(State::default()),
            notify: Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Every write to State is a single assignment; a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `movie` the active selection; its favorite state is unknown until
    /// a result is applied.
    pub fn select(&self, movie: &Movie) -> Selection {
        let mut state = self.state();
        state.generation += 1;
        state.active = Some(movie.id);
        state.favorite = None;
        Selection {
            movie_id: movie.id,
            generation: state.generation,
        }
    }

    /// Drop the active selection; every outstanding result becomes stale.
    pub fn clear(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.active = None;
        state.favorite = None;
    }

    /// Displayed favorite state of the active selection, if known.
    pub fn current(&self) -> Option<bool> {
        self.state().favorite
    }

    pub fn is_current(&self, selection: &Selection) -> bool {
        let state = self.state();
        state.generation == selection.generation && state.active == Some(selection.movie_id)
    }

    /// Apply a request outcome. Returns whether the sink was notified.
    pub fn apply(&self, selection: &Selection, outcome: &Result<bool, ApiError>) -> bool {
        let favorite = match outcome {
            Ok(favorite) => *favorite,
            Err(e) => {
                log::warn!(
                    "keeping favorite state for movie {}: {e}",
                    selection.movie_id
                );
                return false;
            }
        };
        let _notifying = self.notify.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        {
            let mut state = self.state();
            if state.generation != selection.generation || state.active != Some(selection.movie_id) {
                log::debug!("discarding stale favorite result for movie {}", selection.movie_id);
                return false;
            }
            state.favorite = Some(favorite);
        }
        self.sink.favorite_changed(selection.movie_id, favorite);
        true
    }
}
