//! Optimistic mutation commands.
//!
//! # Design
//! A `MutationCommand` is one create, edit or delete as a value. `apply`
//! performs the optimistic change on the cache and records the pre-mutation
//! state of the affected record. `commit` folds the server's answer in,
//! `rollback` puts the recorded state back. Nothing here talks to the
//! network, so each step can be driven directly from tests.
//!
//! The snapshot covers only the target record (its value and position).
//! With one mutation in flight this is the same as restoring the whole
//! cache; with several in flight on different records it leaves the others'
//! pending state alone.

use std::fmt;

use tracing::debug;

use crate::activity::ActivityKind;
use crate::cache::{Anchor, UserCache};
use crate::client::UsersClient;
use crate::error::{ApiError, DashboardError};
use crate::http::{HttpRequest, HttpResponse};
use crate::record::{RecordId, UserRecord};
use crate::types::{NewUser, UserEcho, UserPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(pub u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Edit,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Edit => "edit",
            MutationKind::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    Create(NewUser),
    Edit(UserPatch),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
    Created,
    Edited { before: UserRecord },
    Deleted { anchor: Anchor, record: UserRecord },
}

/// Parsed server answer to a mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAck {
    Created(UserEcho),
    Updated(UserEcho),
    Deleted,
}

/// Activity entry produced by an optimistic apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDraft {
    pub kind: ActivityKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationCommand {
    id: MutationId,
    target: RecordId,
    intent: Intent,
    snapshot: Option<Snapshot>,
    /// Set once a refetch has replaced the cache under this command.
    refetched: bool,
}

impl MutationCommand {
    /// `local` must be a `RecordId::Pending` that is not in the cache yet.
    pub fn create(id: MutationId, local: RecordId, new_user: NewUser) -> Self {
        Self::new(id, local, Intent::Create(new_user))
    }

    pub fn edit(id: MutationId, target: RecordId, patch: UserPatch) -> Self {
        Self::new(id, target, Intent::Edit(patch))
    }

    pub fn delete(id: MutationId, target: RecordId) -> Self {
        Self::new(id, target, Intent::Delete)
    }

    fn new(id: MutationId, target: RecordId, intent: Intent) -> Self {
        Self {
            id,
            target,
            intent,
            snapshot: None,
            refetched: false,
        }
    }

    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn target(&self) -> RecordId {
        self.target
    }

    pub fn kind(&self) -> MutationKind {
        match self.intent {
            Intent::Create(_) => MutationKind::Create,
            Intent::Edit(_) => MutationKind::Edit,
            Intent::Delete => MutationKind::Delete,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.snapshot.is_some()
    }

    pub(crate) fn retarget(&mut self, to: RecordId) {
        self.target = to;
    }

    /// Called when a refetch replaced the cache. Forgets the snapshot so a
    /// failed re-apply cannot restore stale data.
    pub(crate) fn reset(&mut self) {
        self.snapshot = None;
        self.refetched = true;
    }

    /// Apply the optimistic change and remember what it replaced.
    ///
    /// Applying again (after the cache was replaced by a refetch) takes a
    /// fresh snapshot from the new contents.
    pub fn apply(&mut self, cache: &mut UserCache) -> Result<ActivityDraft, DashboardError> {
        let (snapshot, draft) = match &self.intent {
            Intent::Create(new_user) => {
                cache.push(record_from(self.target, new_user));
                (
                    Snapshot::Created,
                    ActivityDraft {
                        kind: ActivityKind::Add,
                        message: format!("Added user \"{}\"", new_user.name),
                    },
                )
            }
            Intent::Edit(patch) => {
                let record = cache
                    .get_mut(self.target)
                    .ok_or(DashboardError::UnknownRecord(self.target))?;
                let before = record.clone();
                record.apply_patch(patch);
                let message = format!("Edited user \"{}\"", record.name);
                (
                    Snapshot::Edited { before },
                    ActivityDraft {
                        kind: ActivityKind::Edit,
                        message,
                    },
                )
            }
            Intent::Delete => {
                let (prev, next) = cache.neighbours(self.target);
                let (index, record) = cache
                    .remove(self.target)
                    .ok_or(DashboardError::UnknownRecord(self.target))?;
                let message = format!("Deleted user \"{}\"", record.name);
                (
                    Snapshot::Deleted {
                        anchor: Anchor { index, prev, next },
                        record,
                    },
                    ActivityDraft {
                        kind: ActivityKind::Delete,
                        message,
                    },
                )
            }
        };
        debug!(mutation = %self.id, kind = %self.kind(), target = %self.target, "applied optimistically");
        self.snapshot = Some(snapshot);
        Ok(draft)
    }

    /// Request the host has to execute. Edits and deletes need a server id,
    /// so they cannot be sent while their target is still pending.
    pub fn request(&self, client: &UsersClient) -> Result<HttpRequest, DashboardError> {
        let request = match &self.intent {
            Intent::Create(new_user) => client.build_create_user(new_user)?,
            Intent::Edit(patch) => client.build_update_user(self.server_id()?, patch)?,
            Intent::Delete => client.build_delete_user(self.server_id()?),
        };
        Ok(request)
    }

    fn server_id(&self) -> Result<u64, DashboardError> {
        self.target
            .server_id()
            .ok_or(DashboardError::UnknownRecord(self.target))
    }

    pub fn parse(&self, client: &UsersClient, response: HttpResponse) -> Result<ServerAck, ApiError> {
        match self.intent {
            Intent::Create(_) => client.parse_create_user(response).map(ServerAck::Created),
            Intent::Edit(_) => client.parse_update_user(response).map(ServerAck::Updated),
            Intent::Delete => client.parse_delete_user(response).map(|()| ServerAck::Deleted),
        }
    }

    /// Fold the server's answer into the cache and return the record's final
    /// id. On error the cache is left untouched and the caller is expected to
    /// roll back.
    pub fn commit(&self, cache: &mut UserCache, ack: ServerAck) -> Result<RecordId, ApiError> {
        match ack {
            ServerAck::Created(mut echo) => {
                let server_id = echo.id.take().ok_or(ApiError::MissingId)?;
                let committed = RecordId::Committed(server_id);
                if cache.contains(committed) {
                    // A refetch issued while the create was in flight may
                    // already carry the stored record. Fold the pending copy
                    // into it. Without a refetch the id is a real collision.
                    if !(self.refetched && self.target.is_pending()) {
                        return Err(ApiError::IdConflict(server_id));
                    }
                    cache.remove(self.target);
                    if let Some(record) = cache.get_mut(committed) {
                        record.merge_echo(echo);
                    }
                    return Ok(committed);
                }
                match cache.get_mut(self.target) {
                    Some(record) => {
                        record.id = committed;
                        record.merge_echo(echo);
                    }
                    None => {
                        // A refetch replaced the cache without our pending
                        // record; keep the confirmed one anyway.
                        if let Intent::Create(new_user) = &self.intent {
                            let mut record = record_from(committed, new_user);
                            record.merge_echo(echo);
                            cache.push(record);
                        }
                    }
                }
                Ok(committed)
            }
            ServerAck::Updated(mut echo) => {
                // The path already names the record; an echoed id is ignored.
                echo.id = None;
                if let Some(record) = cache.get_mut(self.target) {
                    record.merge_echo(echo);
                }
                Ok(self.target)
            }
            ServerAck::Deleted => Ok(self.target),
        }
    }

    /// Restore the pre-mutation state of the target record.
    pub fn rollback(&self, cache: &mut UserCache) {
        match &self.snapshot {
            None => {}
            Some(Snapshot::Created) => {
                cache.remove(self.target);
            }
            Some(Snapshot::Edited { before }) => {
                if let Some(record) = cache.get_mut(self.target) {
                    *record = before.clone();
                }
            }
            Some(Snapshot::Deleted { anchor, record }) => {
                if !cache.contains(self.target) {
                    cache.reinsert(anchor, record.clone());
                }
            }
        }
    }
}

fn record_from(id: RecordId, new_user: &NewUser) -> UserRecord {
    UserRecord {
        id,
        name: new_user.name.clone(),
        email: new_user.email.clone(),
        phone: new_user.phone.clone(),
        company: new_user.company.clone(),
        address: None,
        username: None,
        website: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Company, User};

    fn leanne() -> UserRecord {
        UserRecord::from(User {
            id: 1,
            name: "Leanne Graham".to_string(),
            email: "Sincere@april.biz".to_string(),
            phone: "1-770-736-8031 x56442".to_string(),
            company: Company::named("Romaguera-Crona"),
            address: None,
            username: None,
            website: None,
        })
    }

    fn ervin() -> UserRecord {
        UserRecord::from(User {
            id: 2,
            name: "Ervin Howell".to_string(),
            email: "Shanna@melissa.tv".to_string(),
            phone: "010-692-6593 x09125".to_string(),
            company: Company::named("Deckow-Crist"),
            address: None,
            username: None,
            website: None,
        })
    }

    fn cache() -> UserCache {
        UserCache::from(vec![leanne(), ervin()])
    }

    fn new_user() -> NewUser {
        NewUser {
            name: "Glenna Reichert".to_string(),
            email: "Chaim_McDermott@dana.io".to_string(),
            phone: "(775)976-6794 x41206".to_string(),
            company: Company::named("Yost and Sons"),
        }
    }

    #[test]
    fn create_appends_pending_record() {
        let mut cache = cache();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        let draft = cmd.apply(&mut cache).unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.records()[2].id, RecordId::Pending(0));
        assert_eq!(draft.kind, ActivityKind::Add);
        assert_eq!(draft.message, "Added user \"Glenna Reichert\"");
    }

    #[test]
    fn create_commit_swaps_in_server_id_in_place() {
        let mut cache = cache();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        cmd.apply(&mut cache).unwrap();
        let id = cmd
            .commit(
                &mut cache,
                ServerAck::Created(UserEcho {
                    id: Some(11),
                    ..UserEcho::default()
                }),
            )
            .unwrap();

        assert_eq!(id, RecordId::Committed(11));
        assert_eq!(cache.records()[2].id, RecordId::Committed(11));
        assert_eq!(cache.records()[2].name, "Glenna Reichert");
        assert!(!cache.contains(RecordId::Pending(0)));
    }

    #[test]
    fn create_commit_without_id_is_refused() {
        let mut cache = cache();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        cmd.apply(&mut cache).unwrap();
        let err = cmd
            .commit(&mut cache, ServerAck::Created(UserEcho::default()))
            .unwrap_err();
        assert_eq!(err, ApiError::MissingId);
        assert!(cache.contains(RecordId::Pending(0)));
    }

    #[test]
    fn create_commit_refuses_duplicate_server_id() {
        let mut cache = cache();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        cmd.apply(&mut cache).unwrap();
        let err = cmd
            .commit(
                &mut cache,
                ServerAck::Created(UserEcho {
                    id: Some(2),
                    ..UserEcho::default()
                }),
            )
            .unwrap_err();
        assert_eq!(err, ApiError::IdConflict(2));
    }

    #[test]
    fn create_commit_after_refetch_merges_into_fetched_record() {
        let mut cache = cache();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        cmd.apply(&mut cache).unwrap();

        // The refetch already has the stored user as id 2.
        let mut fetched = UserCache::from(vec![leanne(), ervin()]);
        cmd.reset();
        cmd.apply(&mut fetched).unwrap();
        let id = cmd
            .commit(
                &mut fetched,
                ServerAck::Created(UserEcho {
                    id: Some(2),
                    phone: Some("000".to_string()),
                    ..UserEcho::default()
                }),
            )
            .unwrap();

        assert_eq!(id, RecordId::Committed(2));
        assert_eq!(fetched.len(), 2);
        assert!(!fetched.contains(RecordId::Pending(0)));
        assert_eq!(fetched.get(RecordId::Committed(2)).unwrap().phone, "000");
    }

    #[test]
    fn create_rollback_restores_cache() {
        let before = cache();
        let mut cache = before.clone();
        let mut cmd = MutationCommand::create(MutationId(0), RecordId::Pending(0), new_user());
        cmd.apply(&mut cache).unwrap();
        cmd.rollback(&mut cache);
        assert_eq!(cache, before);
    }

    #[test]
    fn edit_patches_then_merges_server_fields() {
        let mut cache = cache();
        let patch = UserPatch {
            name: Some("Leanne G.".to_string()),
            ..UserPatch::default()
        };
        let mut cmd = MutationCommand::edit(MutationId(1), RecordId::Committed(1), patch);
        let draft = cmd.apply(&mut cache).unwrap();
        assert_eq!(draft.message, "Edited user \"Leanne G.\"");
        assert_eq!(cache.records()[0].name, "Leanne G.");

        cmd.commit(
            &mut cache,
            ServerAck::Updated(UserEcho {
                id: Some(1),
                name: Some("Leanne Graham-Server".to_string()),
                ..UserEcho::default()
            }),
        )
        .unwrap();
        assert_eq!(cache.records()[0].name, "Leanne Graham-Server");
        assert_eq!(cache.records()[0].email, "Sincere@april.biz");
    }

    #[test]
    fn edit_rollback_restores_previous_value() {
        let before = cache();
        let mut cache = before.clone();
        let mut cmd = MutationCommand::edit(
            MutationId(1),
            RecordId::Committed(2),
            UserPatch {
                email: Some("changed@x.io".to_string()),
                ..UserPatch::default()
            },
        );
        cmd.apply(&mut cache).unwrap();
        cmd.rollback(&mut cache);
        assert_eq!(cache, before);
    }

    #[test]
    fn edit_of_missing_record_is_refused() {
        let mut cache = cache();
        let mut cmd = MutationCommand::edit(MutationId(1), RecordId::Committed(9), UserPatch::default());
        let err = cmd.apply(&mut cache).unwrap_err();
        assert_eq!(err, DashboardError::UnknownRecord(RecordId::Committed(9)));
        assert!(!cmd.is_applied());
    }

    #[test]
    fn delete_rollback_restores_original_position() {
        let before = cache();
        let mut cache = before.clone();
        let mut cmd = MutationCommand::delete(MutationId(2), RecordId::Committed(1));
        let draft = cmd.apply(&mut cache).unwrap();
        assert_eq!(draft.message, "Deleted user \"Leanne Graham\"");
        assert_eq!(cache.len(), 1);

        cmd.rollback(&mut cache);
        assert_eq!(cache, before);
    }

    #[test]
    fn overlapping_delete_rollbacks_keep_order() {
        let before = UserCache::from(vec![leanne(), ervin(), {
            let mut third = ervin();
            third.id = RecordId::Committed(3);
            third
        }]);
        let mut cache = before.clone();
        let mut first = MutationCommand::delete(MutationId(0), RecordId::Committed(1));
        let mut second = MutationCommand::delete(MutationId(1), RecordId::Committed(2));
        first.apply(&mut cache).unwrap();
        second.apply(&mut cache).unwrap();

        first.rollback(&mut cache);
        second.rollback(&mut cache);
        assert_eq!(cache, before);
    }

    #[test]
    fn rollback_before_apply_is_a_no_op() {
        let before = cache();
        let mut cache = before.clone();
        MutationCommand::delete(MutationId(2), RecordId::Committed(1)).rollback(&mut cache);
        assert_eq!(cache, before);
    }

    #[test]
    fn pending_target_has_no_request() {
        let client = UsersClient::new("http://localhost:3000");
        let cmd = MutationCommand::delete(MutationId(3), RecordId::Pending(4));
        assert_eq!(
            cmd.request(&client).unwrap_err(),
            DashboardError::UnknownRecord(RecordId::Pending(4))
        );
    }

    #[test]
    fn parse_dispatches_on_kind() {
        let client = UsersClient::new("http://localhost:3000");
        let cmd = MutationCommand::delete(MutationId(3), RecordId::Committed(1));
        assert_eq!(
            cmd.parse(&client, HttpResponse::new(200, "{}")).unwrap(),
            ServerAck::Deleted
        );
        assert_eq!(
            cmd.parse(&client, HttpResponse::new(503, "busy")).unwrap_err(),
            ApiError::HttpError {
                status: 503,
                body: "busy".to_string()
            }
        );
    }
}
