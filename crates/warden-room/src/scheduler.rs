//! The scheduler facade command handlers call.
//!
//! Maps `RoomId → RoomHandle`, spawning room actors on demand. Every
//! operation resolves to a message to the owning room's actor and returns
//! either success or a typed [`RejectReason`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use warden_core::{ActivityId, ChatTransport, FormatId, Moderation, RoomId, UserId};
use warden_sched::SchedulerStore;

use crate::actor::{spawn_room, CreateKind, HostAction, RoomHandle, RoomStatus};
use crate::{FormatRegistry, RejectReason, SchedulerConfig};

pub struct Scheduler {
    config: SchedulerConfig,
    formats: Arc<FormatRegistry>,
    transport: Arc<dyn ChatTransport>,
    moderation: Arc<dyn Moderation>,
    store: Arc<dyn SchedulerStore>,
    rooms: HashMap<RoomId, RoomHandle>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        formats: FormatRegistry,
        transport: Arc<dyn ChatTransport>,
        moderation: Arc<dyn Moderation>,
        store: Arc<dyn SchedulerStore>,
    ) -> Self {
        Self {
            config: config.validated(),
            formats: Arc::new(formats),
            transport,
            moderation,
            store,
            rooms: HashMap::new(),
        }
    }

    /// The handle for a room, spawning its actor on first use.
    pub fn room(&mut self, room: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room) {
            return handle.clone();
        }
        let handle = spawn_room(
            room.clone(),
            self.config.clone(),
            self.formats.clone(),
            self.transport.clone(),
            self.moderation.clone(),
            self.store.clone(),
        );
        self.rooms.insert(room.clone(), handle.clone());
        handle
    }

    // -- Operations ---------------------------------------------------------

    pub async fn create_activity(
        &mut self,
        room: &RoomId,
        kind: CreateKind,
    ) -> Result<ActivityId, RejectReason> {
        self.room(room).create(kind).await
    }

    pub async fn join_activity(
        &mut self,
        room: &RoomId,
        user: UserId,
        name: &str,
    ) -> Result<(), RejectReason> {
        self.room(room).join(user, name).await
    }

    pub async fn leave_activity(
        &mut self,
        room: &RoomId,
        user: UserId,
    ) -> Result<(), RejectReason> {
        self.room(room).leave(user).await
    }

    /// Delivers a chat line to the room's running activity, if any.
    pub fn guess(
        &mut self,
        room: &RoomId,
        user: UserId,
        name: &str,
        text: &str,
    ) -> Result<(), RejectReason> {
        self.room(room).guess(user, name, text)
    }

    pub async fn accept_challenge(
        &mut self,
        room: &RoomId,
        user: UserId,
    ) -> Result<(), RejectReason> {
        self.room(room).accept(user).await
    }

    pub async fn decline_challenge(
        &mut self,
        room: &RoomId,
        user: UserId,
    ) -> Result<(), RejectReason> {
        self.room(room).decline(user).await
    }

    /// A host-privileged operation on the room's hosted game.
    pub async fn host_action(
        &mut self,
        room: &RoomId,
        caller: UserId,
        action: HostAction,
    ) -> Result<(), RejectReason> {
        self.room(room).host(caller, action).await
    }

    pub async fn extend_host(
        &mut self,
        room: &RoomId,
        caller: UserId,
        extra: std::time::Duration,
    ) -> Result<(), RejectReason> {
        self.room(room).host(caller, HostAction::Extend(extra)).await
    }

    pub async fn set_sub_host(
        &mut self,
        room: &RoomId,
        caller: UserId,
        user: UserId,
        name: &str,
    ) -> Result<(), RejectReason> {
        self.room(room)
            .host(
                caller,
                HostAction::SetSubHost {
                    user,
                    name: name.to_string(),
                },
            )
            .await
    }

    pub async fn force_end(
        &mut self,
        room: &RoomId,
        caller: UserId,
        reason: &str,
    ) -> Result<(), RejectReason> {
        self.room(room).force_end(caller, reason).await
    }

    pub async fn request_host(
        &mut self,
        room: &RoomId,
        user: UserId,
        name: &str,
        format: FormatId,
    ) -> Result<usize, RejectReason> {
        self.room(room).request_host(user, name, format).await
    }

    pub async fn withdraw_host(
        &mut self,
        room: &RoomId,
        user: UserId,
    ) -> Result<(), RejectReason> {
        self.room(room).withdraw_host(user).await
    }

    pub async fn promote_next_host(
        &mut self,
        room: &RoomId,
        caller: UserId,
    ) -> Result<ActivityId, RejectReason> {
        self.room(room).promote_next_host(caller).await
    }

    pub async fn room_status(&mut self, room: &RoomId) -> Result<RoomStatus, RejectReason> {
        self.room(room).status().await
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Shuts down every room actor. Pending watchdogs die with them.
    pub fn shutdown(&mut self) {
        info!(rooms = self.rooms.len(), "scheduler shutting down");
        for handle in self.rooms.values() {
            handle.shutdown();
        }
        self.rooms.clear();
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
