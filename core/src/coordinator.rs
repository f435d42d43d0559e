//! List/mutation coordinator.
//!
//! # Design
//! `UserDashboard` owns the collection cache, the activity log and every
//! in-flight mutation. It never performs I/O: each `begin_*` call applies
//! its change synchronously and returns the request the host must execute;
//! the host reports back through `complete` (a response arrived) or `fail`
//! (the round-trip itself failed). Reads made between the two already see
//! the optimistic state.
//!
//! Mutations on the same record are serialized. While one is in flight,
//! later edits or deletes of that record wait in a queue and are applied
//! only once it settles. Any mutation that starts invalidates an
//! outstanding fetch, so a stale list can never overwrite optimistic state.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info, warn};

use crate::activity::ActivityLog;
use crate::cache::UserCache;
use crate::client::UsersClient;
use crate::config::DashboardConfig;
use crate::detail::{self, DetailState};
use crate::error::{ApiError, DashboardError};
use crate::http::{HttpRequest, HttpResponse};
use crate::mutation::{MutationCommand, MutationId, MutationKind, ServerAck};
use crate::notify::{Listeners, Subscription};
use crate::record::{RecordId, UserRecord};
use crate::types::UserPatch;
use crate::validate::{validate_patch, UserForm};
use crate::view::{self, UserView, ViewQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    /// Nothing has been requested yet.
    Idle,
    Loading,
    Ready,
    Failed(ApiError),
}

/// An outstanding list request.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { count: usize },
    Failed(ApiError),
    /// A mutation started after this fetch was issued; its result was
    /// thrown away.
    Discarded,
}

/// A mutation that has been applied locally and awaits its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub target: RecordId,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Applied; the host should execute the request now.
    Sent(PendingMutation),
    /// Another mutation of the same record is in flight. This one will be
    /// applied and handed out in `Settlement::released` once it settles.
    Queued { id: MutationId, behind: RecordId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Committed { id: RecordId },
    RolledBack { error: ApiError },
}

/// Result of settling one in-flight mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub mutation: MutationId,
    pub kind: MutationKind,
    pub outcome: MutationOutcome,
    /// Queued mutations that were waiting on this record and are now in
    /// flight.
    pub released: Vec<PendingMutation>,
    /// Queued mutations that could not be applied once released, usually
    /// because their record is gone.
    pub dropped: Vec<(MutationId, DashboardError)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    FetchStarted,
    Loaded { count: usize },
    FetchFailed(ApiError),
    FetchDiscarded,
    Applied { mutation: MutationId, kind: MutationKind, target: RecordId },
    Queued { mutation: MutationId, behind: RecordId },
    Committed { mutation: MutationId, kind: MutationKind, id: RecordId },
    RolledBack { mutation: MutationId, kind: MutationKind, target: RecordId, error: ApiError },
    Dropped { mutation: MutationId, error: DashboardError },
}

#[derive(Debug)]
pub struct UserDashboard {
    client: UsersClient,
    cache: UserCache,
    activity: ActivityLog,
    fetch: FetchState,
    fetch_generation: u64,
    outstanding_fetch: Option<u64>,
    loaded: bool,
    next_local: u64,
    next_mutation: u64,
    in_flight: BTreeMap<MutationId, MutationCommand>,
    queued: VecDeque<MutationCommand>,
    listeners: Listeners<DashboardEvent>,
}

impl UserDashboard {
    pub fn new(client: UsersClient) -> Self {
        Self {
            client,
            cache: UserCache::new(),
            activity: ActivityLog::new(),
            fetch: FetchState::Idle,
            fetch_generation: 0,
            outstanding_fetch: None,
            loaded: false,
            next_local: 0,
            next_mutation: 0,
            in_flight: BTreeMap::new(),
            queued: VecDeque::new(),
            listeners: Listeners::default(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(UsersClient::new(&config.base_url))
    }

    pub fn client(&self) -> &UsersClient {
        &self.client
    }

    pub fn cache(&self) -> &UserCache {
        &self.cache
    }

    pub fn records(&self) -> &[UserRecord] {
        self.cache.records()
    }

    pub fn get(&self, id: RecordId) -> Option<&UserRecord> {
        self.cache.get(id)
    }

    pub fn view(&self, query: &ViewQuery) -> UserView<'_> {
        view::derive_view(self.cache.records(), query)
    }

    pub fn companies(&self) -> Vec<String> {
        view::companies(self.cache.records())
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// The log lives alongside the cache but has its own lifecycle; hosts
    /// clear it and subscribe to it through this handle.
    pub fn activity_mut(&mut self) -> &mut ActivityLog {
        &mut self.activity
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    pub fn is_loading(&self) -> bool {
        self.fetch == FetchState::Loading
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// True while a mutation of `id` is in flight or waiting.
    pub fn is_busy(&self, id: RecordId) -> bool {
        self.in_flight.values().any(|c| c.target() == id) || self.queued.iter().any(|c| c.target() == id)
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&DashboardEvent) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    /// Start (or restart) loading the full collection.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        self.outstanding_fetch = Some(self.fetch_generation);
        self.fetch = FetchState::Loading;
        self.listeners.emit(&DashboardEvent::FetchStarted);
        FetchTicket {
            generation: self.fetch_generation,
            request: self.client.build_list_users(),
        }
    }

    pub fn complete_fetch(&mut self, ticket: FetchTicket, response: HttpResponse) -> FetchOutcome {
        if !self.is_current(&ticket) {
            debug!(generation = ticket.generation, "discarding stale fetch result");
            return FetchOutcome::Discarded;
        }
        self.outstanding_fetch = None;

        match self.client.parse_list_users(response) {
            Ok(users) => {
                let count = users.len();
                self.cache
                    .replace_all(users.into_iter().map(UserRecord::from).collect());
                self.rebase_in_flight();
                self.loaded = true;
                self.fetch = FetchState::Ready;
                info!(count, "loaded users");
                self.listeners.emit(&DashboardEvent::Loaded { count });
                FetchOutcome::Loaded { count }
            }
            Err(error) => self.fetch_failed(error),
        }
    }

    /// The host could not execute the list request at all.
    pub fn fail_fetch(&mut self, ticket: FetchTicket, reason: impl Into<String>) -> FetchOutcome {
        if !self.is_current(&ticket) {
            return FetchOutcome::Discarded;
        }
        self.outstanding_fetch = None;
        self.fetch_failed(ApiError::Transport(reason.into()))
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.outstanding_fetch == Some(ticket.generation)
    }

    fn fetch_failed(&mut self, error: ApiError) -> FetchOutcome {
        warn!(%error, "failed to load users");
        self.fetch = FetchState::Failed(error.clone());
        self.listeners.emit(&DashboardEvent::FetchFailed(error.clone()));
        FetchOutcome::Failed(error)
    }

    /// Drop any outstanding fetch so its result cannot clobber optimistic
    /// state.
    fn invalidate_fetch(&mut self) {
        if self.outstanding_fetch.take().is_none() {
            return;
        }
        debug!("mutation started, cancelling outstanding fetch");
        self.fetch = if self.loaded {
            FetchState::Ready
        } else {
            FetchState::Idle
        };
        self.listeners.emit(&DashboardEvent::FetchDiscarded);
    }

    /// A fetch issued while mutations were in flight has just replaced the
    /// cache; lay their optimistic changes over the fresh data again.
    fn rebase_in_flight(&mut self) {
        for command in self.in_flight.values_mut() {
            command.reset();
            if let Err(error) = command.apply(&mut self.cache) {
                debug!(mutation = %command.id(), %error, "in-flight mutation no longer applies after refetch");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Validate the add-user form, append a pending record and return the
    /// create request.
    pub fn begin_create(&mut self, form: &UserForm) -> Result<PendingMutation, DashboardError> {
        let new_user = form.validate()?;
        let local = RecordId::Pending(self.next_local);
        self.next_local += 1;
        let command = MutationCommand::create(self.allocate_mutation(), local, new_user);
        self.start(command)
    }

    /// Edit through the form dialog: every field is sent.
    pub fn begin_edit_form(&mut self, target: RecordId, form: &UserForm) -> Result<Dispatch, DashboardError> {
        let current = self
            .cache
            .get(target)
            .ok_or(DashboardError::UnknownRecord(target))?;
        let patch = form.to_patch(current)?;
        self.begin_edit(target, patch)
    }

    pub fn begin_edit(&mut self, target: RecordId, mut patch: UserPatch) -> Result<Dispatch, DashboardError> {
        validate_patch(&mut patch)?;
        self.dispatch(target, |id| MutationCommand::edit(id, target, patch))
    }

    pub fn begin_delete(&mut self, target: RecordId) -> Result<Dispatch, DashboardError> {
        self.dispatch(target, |id| MutationCommand::delete(id, target))
    }

    /// Feed the response of an in-flight mutation back in.
    pub fn complete(&mut self, id: MutationId, response: HttpResponse) -> Result<Settlement, DashboardError> {
        let command = self
            .in_flight
            .remove(&id)
            .ok_or(DashboardError::UnknownMutation(id))?;
        let result = command.parse(&self.client, response);
        Ok(self.settle(command, result))
    }

    /// The host could not execute the request; roll the mutation back.
    pub fn fail(&mut self, id: MutationId, reason: impl Into<String>) -> Result<Settlement, DashboardError> {
        let command = self
            .in_flight
            .remove(&id)
            .ok_or(DashboardError::UnknownMutation(id))?;
        Ok(self.settle(command, Err(ApiError::Transport(reason.into()))))
    }

    fn allocate_mutation(&mut self) -> MutationId {
        let id = MutationId(self.next_mutation);
        self.next_mutation += 1;
        id
    }

    fn dispatch(
        &mut self,
        target: RecordId,
        build: impl FnOnce(MutationId) -> MutationCommand,
    ) -> Result<Dispatch, DashboardError> {
        if self.is_busy(target) {
            let command = build(self.allocate_mutation());
            let id = command.id();
            debug!(mutation = %id, %target, "queued behind in-flight mutation");
            self.queued.push_back(command);
            self.listeners.emit(&DashboardEvent::Queued {
                mutation: id,
                behind: target,
            });
            return Ok(Dispatch::Queued { id, behind: target });
        }
        if !self.cache.contains(target) {
            return Err(DashboardError::UnknownRecord(target));
        }
        let command = build(self.allocate_mutation());
        self.start(command).map(Dispatch::Sent)
    }

    /// Apply optimistically, record activity and put the command in flight.
    fn start(&mut self, mut command: MutationCommand) -> Result<PendingMutation, DashboardError> {
        let request = command.request(&self.client)?;
        self.invalidate_fetch();
        let draft = command.apply(&mut self.cache)?;
        self.activity.append(draft.kind, draft.message);

        let pending = PendingMutation {
            id: command.id(),
            kind: command.kind(),
            target: command.target(),
            request,
        };
        self.listeners.emit(&DashboardEvent::Applied {
            mutation: pending.id,
            kind: pending.kind,
            target: pending.target,
        });
        self.in_flight.insert(pending.id, command);
        Ok(pending)
    }

    fn settle(&mut self, command: MutationCommand, result: Result<ServerAck, ApiError>) -> Settlement {
        let mutation = command.id();
        let kind = command.kind();
        let target = command.target();

        let committed = result.and_then(|ack| command.commit(&mut self.cache, ack));
        let (outcome, key) = match committed {
            Ok(id) => {
                info!(mutation = %mutation, %kind, %id, "mutation committed");
                if id != target {
                    for waiting in self.queued.iter_mut().filter(|c| c.target() == target) {
                        waiting.retarget(id);
                    }
                }
                self.listeners.emit(&DashboardEvent::Committed { mutation, kind, id });
                (MutationOutcome::Committed { id }, id)
            }
            Err(error) => {
                command.rollback(&mut self.cache);
                warn!(mutation = %mutation, %kind, %target, %error, "mutation rolled back");
                self.listeners.emit(&DashboardEvent::RolledBack {
                    mutation,
                    kind,
                    target,
                    error: error.clone(),
                });
                (MutationOutcome::RolledBack { error }, target)
            }
        };

        let (released, dropped) = self.release(key);
        Settlement {
            mutation,
            kind,
            outcome,
            released,
            dropped,
        }
    }

    /// Start the next queued mutation for `key`. Commands whose record has
    /// disappeared are dropped until one applies or the queue for `key` is
    /// empty.
    fn release(&mut self, key: RecordId) -> (Vec<PendingMutation>, Vec<(MutationId, DashboardError)>) {
        let mut released = Vec::new();
        let mut dropped = Vec::new();

        while let Some(index) = self.queued.iter().position(|c| c.target() == key) {
            let Some(command) = self.queued.remove(index) else {
                break;
            };
            let id = command.id();
            let started = if self.cache.contains(key) {
                self.start(command)
            } else {
                Err(DashboardError::UnknownRecord(key))
            };
            match started {
                Ok(pending) => {
                    released.push(pending);
                    break;
                }
                Err(error) => {
                    warn!(mutation = %id, %error, "dropping queued mutation");
                    self.listeners.emit(&DashboardEvent::Dropped {
                        mutation: id,
                        error: error.clone(),
                    });
                    dropped.push((id, error));
                }
            }
        }
        (released, dropped)
    }

    // -----------------------------------------------------------------------
    // Detail
    // -----------------------------------------------------------------------

    pub fn build_detail(&self, id: u64) -> HttpRequest {
        detail::build_detail(&self.client, id)
    }

    pub fn parse_detail(&self, response: HttpResponse) -> Result<DetailState, ApiError> {
        detail::parse_detail(&self.client, response)
    }
}
