//! Client core for the user management dashboard.
//!
//! # Overview
//! Lists, searches, sorts, filters and paginates users from a remote REST
//! resource, and creates, edits and deletes them with optimistic updates and
//! a local activity feed. The core builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO); the
//! host executes each round-trip and reports back.
//!
//! # Design
//! - `UserDashboard` owns the cache, the activity log and all in-flight
//!   mutations. There is no global state; hosts hold the dashboard and
//!   `Settings` themselves and subscribe to their events.
//! - Each create/edit/delete is a `MutationCommand` value with explicit
//!   apply, commit and rollback steps.
//! - Records created locally carry `RecordId::Pending` until the server
//!   assigns them a `RecordId::Committed` id.
//! - `derive_view` is a pure function over the cache.

pub mod activity;
pub mod cache;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod detail;
pub mod error;
pub mod http;
pub mod mutation;
pub mod notify;
pub mod record;
pub mod settings;
pub mod types;
pub mod validate;
pub mod view;

pub use activity::{ActivityEntry, ActivityEvent, ActivityKind, ActivityLog};
pub use cache::UserCache;
pub use client::UsersClient;
pub use config::{ConfigError, DashboardConfig};
pub use coordinator::{
    DashboardEvent, Dispatch, FetchOutcome, FetchState, FetchTicket, MutationOutcome, PendingMutation,
    Settlement, UserDashboard,
};
pub use detail::DetailState;
pub use error::{ApiError, DashboardError, Field, FieldError, Problem, ValidationErrors};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::{ActivityDraft, MutationCommand, MutationId, MutationKind, ServerAck};
pub use notify::Subscription;
pub use record::{RecordId, UserRecord};
pub use settings::{CurrentUser, JsonFileStore, MemoryStore, PreferenceStore, Preferences, Settings, SettingsError};
pub use types::{Address, Company, NewUser, User, UserEcho, UserPatch};
pub use validate::UserForm;
pub use view::{derive_view, CompanyFilter, SortOrder, UserView, ViewQuery};
