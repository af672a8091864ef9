//! Leaderboard with on-device fallback
//!
//! Scores go to a remote board (Supabase REST) when one is configured. When
//! it is not, or a remote call fails, everything falls back to a local
//! board in the key-value store that keeps each player's best score. Every
//! result says which path served it so the page can show a warning banner.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_USERNAME;
use crate::error::LeaderboardError;
use crate::persistence::{self, KeyValueStore};

/// Storage key of the local fallback board
pub const LOCAL_KEY: &str = "ll_leaderboard";
/// Entries returned by a leaderboard fetch
pub const MAX_ENTRIES: usize = 20;

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// Best first, at most [`MAX_ENTRIES`]
    pub scores: Vec<ScoreEntry>,
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalBest {
    pub best: u64,
    pub fallback: bool,
}

/// Trim a typed name, falling back to the house name when blank
pub fn normalize_username(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sort best-first and cap at [`MAX_ENTRIES`]
pub fn rank(mut scores: Vec<ScoreEntry>) -> Vec<ScoreEntry> {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores.truncate(MAX_ENTRIES);
    scores
}

/// Best-score-per-player board kept in a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct LocalBoard<S> {
    store: S,
}

impl<S: KeyValueStore> LocalBoard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every stored row, unsorted. Corrupt data reads as empty.
    pub fn entries(&self) -> Vec<ScoreEntry> {
        persistence::load_json(&self.store, LOCAL_KEY)
    }

    /// Record `score`, keeping the higher of it and any previous best
    pub fn upsert(&self, username: &str, score: u64, created_at: Option<String>) {
        let mut entries = self.entries();
        match entries.iter_mut().find(|e| e.username == username) {
            Some(existing) => {
                existing.score = existing.score.max(score);
                existing.created_at = created_at;
            }
            None => entries.push(ScoreEntry {
                id: Some(format!("local-{}", entries.len() + 1)),
                username: username.to_string(),
                score,
                created_at,
            }),
        }
        persistence::save_json(&self.store, LOCAL_KEY, &entries);
    }

    pub fn top(&self) -> Vec<ScoreEntry> {
        rank(self.entries())
    }

    pub fn best(&self, username: &str) -> u64 {
        self.entries()
            .iter()
            .find(|e| e.username == username)
            .map(|e| e.score)
            .unwrap_or(0)
    }
}

/// A remote leaderboard backend
#[allow(async_fn_in_trait)]
pub trait RemoteBoard {
    async fn insert(&self, username: &str, score: u64) -> Result<(), LeaderboardError>;
    /// Best-first, at most `limit` rows
    async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError>;
    /// Highest score recorded for `username`, 0 if none
    async fn best(&self, username: &str) -> Result<u64, LeaderboardError>;
}

/// Backend type for a local-only leaderboard. Cannot be constructed.
#[derive(Debug, Clone, Copy)]
pub enum NoRemote {}

impl RemoteBoard for NoRemote {
    async fn insert(&self, _: &str, _: u64) -> Result<(), LeaderboardError> {
        match *self {}
    }

    async fn top(&self, _: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        match *self {}
    }

    async fn best(&self, _: &str) -> Result<u64, LeaderboardError> {
        match *self {}
    }
}

/// Connection details for the Supabase REST endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Accept a URL and key unless either is blank or still a placeholder
    pub fn from_parts(url: &str, anon_key: &str) -> Option<Self> {
        let usable = |s: &str| !s.trim().is_empty() && !s.contains("YOUR_SUPABASE");
        if usable(url) && usable(anon_key) {
            Some(Self {
                url: url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
            })
        } else {
            None
        }
    }

    /// Read the build-time environment (`SUPABASE_URL`, `SUPABASE_ANON_KEY`)
    pub fn from_build_env() -> Option<Self> {
        Self::from_parts(
            option_env!("SUPABASE_URL").unwrap_or_default(),
            option_env!("SUPABASE_ANON_KEY").unwrap_or_default(),
        )
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/leaderboard", self.url)
    }
}

/// Supabase PostgREST client over `fetch`
#[cfg(target_arch = "wasm32")]
pub struct SupabaseBoard {
    config: SupabaseConfig,
}

#[cfg(target_arch = "wasm32")]
mod rest {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::SupabaseConfig;
    use crate::error::LeaderboardError;

    fn transport(e: JsValue) -> LeaderboardError {
        LeaderboardError::Transport(format!("{:?}", e))
    }

    /// Issue a request and return the response body
    pub async fn send(
        config: &SupabaseConfig,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<String, LeaderboardError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = body.as_deref() {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(url, &opts).map_err(transport)?;
        let headers = request.headers();
        headers.set("apikey", &config.anon_key).map_err(transport)?;
        headers
            .set("Authorization", &format!("Bearer {}", config.anon_key))
            .map_err(transport)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(transport)?;
        headers.set("Prefer", "return=minimal").map_err(transport)?;

        let window = web_sys::window()
            .ok_or_else(|| LeaderboardError::Transport("no window".to_string()))?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(transport)?;
        let response: Response = value.dyn_into().map_err(transport)?;
        if !response.ok() {
            return Err(LeaderboardError::Status(response.status()));
        }
        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        Ok(text.as_string().unwrap_or_default())
    }

    pub fn encode(s: &str) -> String {
        String::from(js_sys::encode_uri_component(s))
    }
}

#[cfg(target_arch = "wasm32")]
impl SupabaseBoard {
    pub fn new(config: SupabaseConfig) -> Self {
        Self { config }
    }
}

#[cfg(target_arch = "wasm32")]
impl RemoteBoard for SupabaseBoard {
    async fn insert(&self, username: &str, score: u64) -> Result<(), LeaderboardError> {
        let body = serde_json::json!({ "username": username, "score": score }).to_string();
        rest::send(&self.config, "POST", &self.config.table_url(), Some(body)).await?;
        Ok(())
    }

    async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        let url = format!(
            "{}?select=id,username,score,created_at&order=score.desc&limit={}",
            self.config.table_url(),
            limit
        );
        let body = rest::send(&self.config, "GET", &url, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn best(&self, username: &str) -> Result<u64, LeaderboardError> {
        #[derive(Deserialize)]
        struct Row {
            score: u64,
        }
        let url = format!(
            "{}?select=score&username=eq.{}&order=score.desc&limit=1",
            self.config.table_url(),
            rest::encode(username)
        );
        let body = rest::send(&self.config, "GET", &url, None).await?;
        let rows: Vec<Row> = serde_json::from_str(&body)?;
        Ok(rows.first().map(|r| r.score).unwrap_or(0))
    }
}

/// Leaderboard facade: remote when available, local otherwise
pub struct Leaderboard<S, R = NoRemote> {
    local: LocalBoard<S>,
    remote: Option<R>,
}

impl<S: KeyValueStore> Leaderboard<S, NoRemote> {
    /// Local-only board
    pub fn local(store: S) -> Self {
        Self {
            local: LocalBoard::new(store),
            remote: None,
        }
    }
}

impl<S: KeyValueStore, R: RemoteBoard> Leaderboard<S, R> {
    pub fn new(store: S, remote: Option<R>) -> Self {
        Self {
            local: LocalBoard::new(store),
            remote,
        }
    }

    /// True when results come from the device only
    pub fn needs_warning(&self) -> bool {
        self.remote.is_none()
    }

    pub fn local_board(&self) -> &LocalBoard<S> {
        &self.local
    }

    pub async fn submit_score(&self, username: &str, score: u64) -> Submission {
        let username = normalize_username(username);
        if let Some(remote) = &self.remote {
            match remote.insert(&username, score).await {
                Ok(()) => return Submission { fallback: false },
                Err(e) => log::warn!("Remote score submit failed, saving locally: {}", e),
            }
        }
        self.local
            .upsert(&username, score, Some(crate::platform::timestamp_string()));
        log::info!("Score {} for {} saved on device", score, username);
        Submission { fallback: true }
    }

    pub async fn fetch_leaderboard(&self) -> Standings {
        if let Some(remote) = &self.remote {
            match remote.top(MAX_ENTRIES).await {
                Ok(scores) => {
                    return Standings {
                        scores: rank(scores),
                        fallback: false,
                    };
                }
                Err(e) => log::warn!("Remote leaderboard fetch failed: {}", e),
            }
        }
        Standings {
            scores: self.local.top(),
            fallback: true,
        }
    }

    pub async fn fetch_user_best(&self, username: &str) -> PersonalBest {
        let username = normalize_username(username);
        if let Some(remote) = &self.remote {
            match remote.best(&username).await {
                Ok(best) => {
                    return PersonalBest {
                        best,
                        fallback: false,
                    };
                }
                Err(e) => log::warn!("Remote best lookup failed: {}", e),
            }
        }
        PersonalBest {
            best: self.local.best(&username),
            fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use pollster::block_on;
    use std::cell::RefCell;

    /// Remote that always fails
    struct Offline;

    impl RemoteBoard for Offline {
        async fn insert(&self, _: &str, _: u64) -> Result<(), LeaderboardError> {
            Err(LeaderboardError::Transport("offline".into()))
        }

        async fn top(&self, _: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
            Err(LeaderboardError::Status(503))
        }

        async fn best(&self, _: &str) -> Result<u64, LeaderboardError> {
            Err(LeaderboardError::Transport("offline".into()))
        }
    }

    /// Remote keeping every submission
    #[derive(Default)]
    struct InMemoryRemote {
        rows: RefCell<Vec<ScoreEntry>>,
    }

    impl RemoteBoard for InMemoryRemote {
        async fn insert(&self, username: &str, score: u64) -> Result<(), LeaderboardError> {
            self.rows.borrow_mut().push(ScoreEntry {
                id: None,
                username: username.to_string(),
                score,
                created_at: None,
            });
            Ok(())
        }

        async fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
            let mut rows = rank(self.rows.borrow().clone());
            rows.truncate(limit);
            Ok(rows)
        }

        async fn best(&self, username: &str) -> Result<u64, LeaderboardError> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|r| r.username == username)
                .map(|r| r.score)
                .max()
                .unwrap_or(0))
        }
    }

    #[test]
    fn test_local_submit_reports_fallback() {
        let board = Leaderboard::local(MemoryStore::new());
        assert!(board.needs_warning());
        assert!(block_on(board.submit_score("ada", 120)).fallback);
    }

    #[test]
    fn test_local_keeps_best_per_user() {
        let board = Leaderboard::local(MemoryStore::new());
        block_on(board.submit_score("ada", 300));
        block_on(board.submit_score("ada", 120));
        block_on(board.submit_score("bob", 50));

        let best = block_on(board.fetch_user_best("ada"));
        assert_eq!(best, PersonalBest { best: 300, fallback: true });
        assert_eq!(board.local_board().entries().len(), 2);

        block_on(board.submit_score("ada", 450));
        assert_eq!(block_on(board.fetch_user_best("ada")).best, 450);
        assert_eq!(block_on(board.fetch_user_best("nobody")).best, 0);
    }

    #[test]
    fn test_local_standings_sorted_and_capped() {
        let board = Leaderboard::local(MemoryStore::new());
        for i in 0..30u64 {
            block_on(board.submit_score(&format!("pilot{i}"), (i * 37) % 101));
        }
        let standings = block_on(board.fetch_leaderboard());
        assert!(standings.fallback);
        assert_eq!(standings.scores.len(), MAX_ENTRIES);
        assert!(standings.scores.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_blank_username_uses_default() {
        let board = Leaderboard::local(MemoryStore::new());
        block_on(board.submit_score("   ", 10));
        let scores = block_on(board.fetch_leaderboard()).scores;
        assert_eq!(scores[0].username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_corrupt_local_board_is_empty() {
        let store = MemoryStore::new();
        store.set(LOCAL_KEY, "[{\"username\":");
        let board = Leaderboard::local(store);
        assert!(block_on(board.fetch_leaderboard()).scores.is_empty());
        // Writing over corrupt data starts a fresh board
        block_on(board.submit_score("ada", 5));
        assert_eq!(block_on(board.fetch_user_best("ada")).best, 5);
    }

    #[test]
    fn test_remote_failure_falls_back() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(store.clone(), Some(Offline));
        assert!(!board.needs_warning());
        assert!(block_on(board.submit_score("ada", 77)).fallback);
        let standings = block_on(board.fetch_leaderboard());
        assert!(standings.fallback);
        assert_eq!(standings.scores[0].score, 77);
        assert_eq!(block_on(board.fetch_user_best("ada")).best, 77);
    }

    #[test]
    fn test_remote_success() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(store.clone(), Some(InMemoryRemote::default()));
        assert!(!block_on(board.submit_score("ada", 10)).fallback);
        assert!(!block_on(board.submit_score("ada", 30)).fallback);
        let best = block_on(board.fetch_user_best("ada"));
        assert_eq!(best, PersonalBest { best: 30, fallback: false });
        assert_eq!(block_on(board.fetch_leaderboard()).scores.len(), 2);
        // Nothing leaked into the local board
        assert!(store.get(LOCAL_KEY).is_none());
    }

    #[test]
    fn test_supabase_config_rejects_placeholders() {
        assert!(SupabaseConfig::from_parts("", "key").is_none());
        assert!(SupabaseConfig::from_parts("https://YOUR_SUPABASE.supabase.co", "key").is_none());
        assert!(SupabaseConfig::from_parts("https://x.supabase.co", "YOUR_SUPABASE_KEY").is_none());
        let config = SupabaseConfig::from_parts("https://x.supabase.co/", "anon").unwrap();
        assert_eq!(config.table_url(), "https://x.supabase.co/rest/v1/leaderboard");
    }
}
