//! Reactive client layer between `vandash-api` and dashboard front ends.
//!
//! - **[`Dashboard`]**: facade owning the API client, the toast slot and one
//!   [`QueryCache`] per resource. Mounts controls and hands out
//!   subscriptions; [`Dashboard::execute`] runs one-shot commands.
//!
//! - **[`QueryCache<T>`]**: keyed fetch state shared by all subscribers of
//!   a key. Fetches are sequence-numbered so a late response never
//!   overwrites a newer one; failures keep the last good data; polling runs
//!   only while someone is subscribed.
//!
//! - **Controls** ([`control`]): [`LedController`] (edit buffer seeded
//!   once, debounced configure requests) and [`InverterControl`].
//!
//! - **[`FileManager`]**: folder navigation, locked-folder prompts, uploads
//!   and the image [`Slideshow`].
//!
//! - **[`Toaster`]**, **[`gate`]**, **[`Debouncer`]**: the small pieces
//!   the rest is built from.

pub mod command;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod files;
pub mod gate;
pub mod mutation;
pub mod query;
pub mod toast;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{DashboardConfig, TlsVerification};
pub use control::{EditBuffer, InverterControl, LedController, LedSettings, SleepTimer};
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use debounce::Debouncer;
pub use error::CoreError;
pub use files::{Breadcrumb, FileManager, ListingView, Opened, Slideshow};
pub use gate::{Gate, GateInput};
pub use mutation::{MutationHandle, MutationId, MutationState, MutationStatus};
pub use query::{
    QueryCache, QueryKey, QueryState, QueryStatus, QuerySubscription, QueryView, StalePolicy,
    SubscribeOptions,
};
pub use toast::{ToastState, ToastStatus, Toaster};

// Wire types consumers need alongside the core API.
pub use vandash_api::{
    FileItem, FileKind, InverterStatus, LedPreset, LedStatus, LevelRating, LevelSensorData,
    Reading, Rgb, ShuntData, UploadFile,
};
