//! Header viewer client.
//!
//! # Data Flow
//! ```text
//! HeaderViewer (Unverified)
//!     → challenge.rs (Turnstile token or terminal prompt)
//!     → HeaderViewer (Verified) arms the poller
//!     → fetch.rs (GET /api/headers, one task per tick)
//!     → ViewState in a watch channel (last resolved fetch wins)
//!     → pane.rs (request headers, device info, response headers)
//! ```
//!
//! # Design Decisions
//! - Fixed-rate polling: a tick never waits for the previous fetch
//! - Failed fetches are retried by the next tick, without backoff
//! - No request correlation; a slow stale response may overwrite a newer one

pub mod challenge;
pub mod fetch;
pub mod pane;
pub mod session;

pub use challenge::{Challenge, ChallengeError, PromptChallenge, TurnstileChallenge};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use pane::{render_panes, Pane, PaneView};
pub use session::{GateState, HeaderViewer, ViewState, DEFAULT_POLL_INTERVAL};
