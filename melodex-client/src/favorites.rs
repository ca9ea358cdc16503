//! Client-side favorites cache
//!
//! [`FavoritesSync`] mirrors the session user's favorites, newest first, and
//! only changes after the server confirms an action. Membership checks go
//! through a `spotify_id` index kept alongside the list.
//!
//! Conflict rules:
//! - 409 on add means the item is already favorited: the list is re-fetched,
//!   and if that fails the item is marked favorited without a store id.
//! - 404 on remove means the record is already gone: the entry is dropped.
//!
//! A list fetched while an add/remove was confirmed is applied, then the
//! changes confirmed during the fetch are replayed over it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use melodex_common::api::AddFavoriteRequest;
use melodex_common::{FavoriteSong, NewFavorite, Track};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::guard::InFlight;
use crate::transport::{AddOutcome, FavoritesTransport, RemoveOutcome};

/// A server-confirmed change to the cache
#[derive(Debug, Clone)]
enum Change {
    Added(FavoriteSong),
    Removed(String),
    /// Favorited per a conflict, store id unknown
    Marked(String),
}

#[derive(Debug, Default)]
struct Cache {
    /// Newest first
    favorites: Vec<FavoriteSong>,
    /// spotify_id -> store id
    index: HashMap<String, String>,
    /// Confirmed favorites whose store id is not known yet
    unresolved: HashSet<String>,
    /// Bumped on every confirmed change
    version: u64,
    /// Bumped on `clear`; lists fetched under an older epoch are dropped
    epoch: u64,
    active_loads: usize,
    /// Changes confirmed while a load was outstanding
    journal: Vec<(u64, Change)>,
}

impl Cache {
    fn replace(&mut self, favorites: Vec<FavoriteSong>) {
        self.index = favorites
            .iter()
            .map(|f| (f.spotify_id.clone(), f.id.clone()))
            .collect();
        self.favorites = favorites;
        self.unresolved.clear();
    }

    fn reset(&mut self) {
        self.favorites.clear();
        self.index.clear();
        self.unresolved.clear();
        self.journal.clear();
        self.epoch += 1;
    }

    /// Apply a confirmed change and keep it for outstanding loads
    fn record(&mut self, change: Change) {
        self.version += 1;
        self.apply(&change);
        if self.active_loads > 0 {
            self.journal.push((self.version, change));
        }
    }

    fn apply(&mut self, change: &Change) {
        match change {
            Change::Added(favorite) => self.prepend(favorite.clone()),
            Change::Removed(favorite_id) => self.remove_by_id(favorite_id),
            Change::Marked(spotify_id) => {
                if !self.contains(spotify_id) {
                    self.unresolved.insert(spotify_id.clone());
                }
            }
        }
    }

    fn prepend(&mut self, favorite: FavoriteSong) {
        self.unresolved.remove(&favorite.spotify_id);
        if let Some(old_id) = self
            .index
            .insert(favorite.spotify_id.clone(), favorite.id.clone())
        {
            self.favorites.retain(|f| f.id != old_id);
        }
        self.favorites.insert(0, favorite);
    }

    fn remove_by_id(&mut self, favorite_id: &str) {
        if let Some(pos) = self.favorites.iter().position(|f| f.id == favorite_id) {
            let removed = self.favorites.remove(pos);
            self.index.remove(&removed.spotify_id);
        }
    }

    fn spotify_id_of(&self, favorite_id: &str) -> Option<String> {
        self.favorites
            .iter()
            .find(|f| f.id == favorite_id)
            .map(|f| f.spotify_id.clone())
    }

    fn contains(&self, spotify_id: &str) -> bool {
        self.index.contains_key(spotify_id) || self.unresolved.contains(spotify_id)
    }
}

/// Favorites cache bound to one session
///
/// Generic over the transport so the synchronization rules can be exercised
/// without a server.
pub struct FavoritesSync<T> {
    transport: T,
    cache: Mutex<Cache>,
    in_flight: InFlight,
}

impl<T: FavoritesTransport> FavoritesSync<T> {
    /// Empty cache; call [`load`](Self::load) to populate it
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: Mutex::new(Cache::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the cache with the server's list
    ///
    /// On failure the cache is left as it was. Adds and removes confirmed
    /// while the list was in flight are re-applied on top of it.
    pub async fn load(&self) -> SyncResult<()> {
        let ticket = LoadTicket::start(&self.cache);

        let favorites = self.transport.list().await?;

        // Declared after `ticket`, so released before its drop re-locks
        let mut cache = self.lock();
        if cache.epoch != ticket.epoch {
            debug!("Discarding favorites list fetched before the cache was cleared");
            return Ok(());
        }

        let replay: Vec<Change> = cache
            .journal
            .iter()
            .filter(|(version, _)| *version > ticket.version)
            .map(|(_, change)| change.clone())
            .collect();

        debug!(count = favorites.len(), replayed = replay.len(), "Loaded favorites");
        cache.replace(favorites);
        for change in &replay {
            cache.apply(change);
        }
        Ok(())
    }

    /// Re-fetch the list, e.g. after another device changed it
    pub async fn refresh(&self) -> SyncResult<()> {
        self.load().await
    }

    /// Whether a load is outstanding
    pub fn is_loading(&self) -> bool {
        self.lock().active_loads > 0
    }

    /// Whether `spotify_id` is favorited as of the latest confirmed action
    pub fn is_favorite(&self, spotify_id: &str) -> bool {
        self.lock().contains(spotify_id)
    }

    /// Whether an add/remove for `spotify_id` is in flight
    pub fn is_pending(&self, spotify_id: &str) -> bool {
        self.in_flight.contains(spotify_id)
    }

    /// Snapshot of the cached favorites, newest first
    pub fn favorites(&self) -> Vec<FavoriteSong> {
        self.lock().favorites.clone()
    }

    /// Store id of the cached favorite for `spotify_id`
    pub fn favorite_id(&self, spotify_id: &str) -> Option<String> {
        self.lock().index.get(spotify_id).cloned()
    }

    /// Drop all cached state, e.g. on logout
    pub fn clear(&self) {
        self.lock().reset();
    }

    /// Add `song` once the server confirms it
    ///
    /// A conflict is not an error: the item ends up favorited either way.
    pub async fn add(&self, song: NewFavorite) -> SyncResult<()> {
        let spotify_id = song.spotify_id.clone();
        let _guard = self
            .in_flight
            .try_acquire(&spotify_id)
            .ok_or_else(|| SyncError::ActionInFlight(spotify_id.clone()))?;

        let request = AddFavoriteRequest::from(song);
        match self.transport.add(&request).await? {
            AddOutcome::Created(favorite) => {
                info!(spotify_id = %spotify_id, favorite_id = %favorite.id, "Favorite added");
                self.lock().record(Change::Added(favorite));
            }
            AddOutcome::AlreadyExists => {
                debug!(spotify_id = %spotify_id, "Already a favorite, refreshing list");
                if let Err(e) = self.load().await {
                    warn!("Failed to refresh favorites after conflict: {}", e);
                }

                let mut cache = self.lock();
                if !cache.contains(&spotify_id) {
                    cache.record(Change::Marked(spotify_id));
                }
            }
        }

        Ok(())
    }

    /// Remove the favorite with store id `favorite_id`
    ///
    /// The in-flight key is the cached `spotify_id` of that record. For a
    /// record not in the cache the store id itself is the key, so it does
    /// not block an add of the same track; use
    /// [`remove_track`](Self::remove_track) when the `spotify_id` is known.
    pub async fn remove(&self, favorite_id: &str) -> SyncResult<()> {
        let key = self
            .lock()
            .spotify_id_of(favorite_id)
            .unwrap_or_else(|| favorite_id.to_string());
        self.remove_keyed(&key, favorite_id).await
    }

    /// Remove record `favorite_id` of track `spotify_id`
    pub async fn remove_track(&self, spotify_id: &str, favorite_id: &str) -> SyncResult<()> {
        self.remove_keyed(spotify_id, favorite_id).await
    }

    async fn remove_keyed(&self, key: &str, favorite_id: &str) -> SyncResult<()> {
        let _guard = self
            .in_flight
            .try_acquire(key)
            .ok_or_else(|| SyncError::ActionInFlight(key.to_string()))?;

        match self.transport.remove(favorite_id).await? {
            RemoveOutcome::Removed => {
                info!(favorite_id = %favorite_id, "Favorite removed");
            }
            RemoveOutcome::NotFound => {
                debug!(favorite_id = %favorite_id, "Favorite already gone");
            }
        }

        self.lock().record(Change::Removed(favorite_id.to_string()));
        Ok(())
    }

    /// Flip the favorite state of `track`
    ///
    /// Returns whether the track is a favorite afterwards.
    pub async fn toggle(&self, track: &Track) -> SyncResult<bool> {
        if !self.is_favorite(&track.id) {
            self.add(NewFavorite::from(track)).await?;
            return Ok(self.is_favorite(&track.id));
        }

        let favorite_id = match self.favorite_id(&track.id) {
            Some(id) => id,
            None => {
                // Favorited after a conflict without a known store id
                self.load().await?;
                match self.favorite_id(&track.id) {
                    Some(id) => id,
                    None => return Ok(self.is_favorite(&track.id)),
                }
            }
        };

        self.remove_track(&track.id, &favorite_id).await?;
        Ok(self.is_favorite(&track.id))
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An outstanding load, counted for [`FavoritesSync::is_loading`]
///
/// Holds the cache version and epoch seen when the fetch started.
struct LoadTicket<'a> {
    cache: &'a Mutex<Cache>,
    version: u64,
    epoch: u64,
}

impl<'a> LoadTicket<'a> {
    fn start(cache: &'a Mutex<Cache>) -> Self {
        let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard.active_loads += 1;
        Self {
            cache,
            version: guard.version,
            epoch: guard.epoch,
        }
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.active_loads = cache.active_loads.saturating_sub(1);
        if cache.active_loads == 0 {
            cache.journal.clear();
        }
    }
}
