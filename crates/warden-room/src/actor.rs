//! Room actor: an isolated tokio task that owns one room's scheduling
//! state.
//!
//! Each room runs in its own task. The actor owns the activity slot, the
//! cooldown registry, the host queue, the watchdog set, and the privilege
//! ledger; commands arrive on one unbounded channel and watchdog callbacks
//! deliver timer events on the same channel, so everything that happens in
//! a room is totally ordered and no locking exists anywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use warden_activity::{
    Activity, ChildGameCoordinator, Effect, EndReport, HostedGame, Opponent, RoundEngine,
    TimerKind,
};
use warden_core::{
    ActivityId, ChatTransport, FormatId, FormatKind, Moderation, PrivilegeLedger, Rank, RoomId,
    UserId,
};
use warden_sched::{
    CooldownCategory, CooldownRegistry, HostQueue, HostQueueEntry, RoomRecord, SchedulerStore,
    convert_rewards,
};
use warden_timer::WatchdogSet;

use crate::{FormatRegistry, RejectReason, SchedulerConfig};

/// Counter for allocating activity ids. Never reused, so a timer event
/// that outlives its activity can always be recognized as stale.
static NEXT_ACTIVITY_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_activity_id() -> ActivityId {
    ActivityId(NEXT_ACTIVITY_ID.fetch_add(1, Ordering::Relaxed))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// What kind of activity a creation request asks for.
///
/// Hosted games are not created here — they enter through the host queue
/// and start by promotion.
#[derive(Debug, Clone)]
pub enum CreateKind {
    /// An automated game: the engine drives rounds from a content module.
    Scripted {
        format: FormatId,
        target: Option<u32>,
    },
    /// A one-vs-one or bot-defended challenge.
    Challenge {
        format: FormatId,
        target: Option<u32>,
        challenger: UserId,
        challenger_name: String,
        opponent: Opponent,
    },
}

/// A host-privileged operation on the running hosted game.
#[derive(Debug, Clone)]
pub enum HostAction {
    Start,
    Extend(Duration),
    SetSubHost { user: UserId, name: String },
    AwardPoints { user: UserId, name: String, points: u32 },
    DeductPoints { user: UserId, points: u32 },
    AddPlayer { user: UserId, name: String },
    RemovePlayer { user: UserId },
    DeclareWinner { user: UserId },
    End,
}

/// A watchdog firing, re-entering the actor's command stream.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimerEvent {
    /// The activity the timer was armed for. A mismatch with the slot's
    /// current occupant means the timer outlived its activity.
    pub activity: ActivityId,
    pub kind: TimerKind,
    pub seq: u64,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Create {
        kind: CreateKind,
        reply: oneshot::Sender<Result<ActivityId, RejectReason>>,
    },
    Join {
        user: UserId,
        name: String,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    Leave {
        user: UserId,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    /// Fire-and-forget: a chat line that might be a guess.
    Guess {
        user: UserId,
        name: String,
        text: String,
    },
    Accept {
        user: UserId,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    Decline {
        user: UserId,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    Host {
        caller: UserId,
        action: HostAction,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    ForceEnd {
        caller: UserId,
        reason: String,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    RequestHost {
        user: UserId,
        name: String,
        format: FormatId,
        reply: oneshot::Sender<Result<usize, RejectReason>>,
    },
    WithdrawHost {
        user: UserId,
        reply: oneshot::Sender<Result<(), RejectReason>>,
    },
    PromoteNextHost {
        caller: UserId,
        reply: oneshot::Sender<Result<ActivityId, RejectReason>>,
    },
    Status {
        reply: oneshot::Sender<RoomStatus>,
    },
    Timer(TimerEvent),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A snapshot of one room's scheduling state.
#[derive(Debug, Clone)]
pub struct RoomStatus {
    pub room: RoomId,
    pub activity: Option<ActivityStatus>,
    pub queue: Vec<HostQueueEntry>,
    pub cooldowns: Vec<(CooldownCategory, Duration)>,
}

#[derive(Debug, Clone)]
pub struct ActivityStatus {
    pub id: ActivityId,
    pub format: FormatId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room: RoomId,
    sender: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    fn unavailable(&self) -> RejectReason {
        RejectReason::RoomUnavailable(self.room.clone())
    }

    async fn request<T>(
        &self,
        cmd: RoomCommand,
        rx: oneshot::Receiver<Result<T, RejectReason>>,
    ) -> Result<T, RejectReason> {
        self.sender.send(cmd).map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn create(&self, kind: CreateKind) -> Result<ActivityId, RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::Create { kind, reply: tx }, rx).await
    }

    pub async fn join(&self, user: UserId, name: &str) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(
            RoomCommand::Join {
                user,
                name: name.to_string(),
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn leave(&self, user: UserId) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::Leave { user, reply: tx }, rx).await
    }

    /// Delivers a chat line to the running activity (fire-and-forget).
    pub fn guess(&self, user: UserId, name: &str, text: &str) -> Result<(), RejectReason> {
        self.sender
            .send(RoomCommand::Guess {
                user,
                name: name.to_string(),
                text: text.to_string(),
            })
            .map_err(|_| self.unavailable())
    }

    pub async fn accept(&self, user: UserId) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::Accept { user, reply: tx }, rx).await
    }

    pub async fn decline(&self, user: UserId) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::Decline { user, reply: tx }, rx).await
    }

    pub async fn host(&self, caller: UserId, action: HostAction) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(
            RoomCommand::Host {
                caller,
                action,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn force_end(&self, caller: UserId, reason: &str) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(
            RoomCommand::ForceEnd {
                caller,
                reason: reason.to_string(),
                reply: tx,
            },
            rx,
        )
        .await
    }

    /// Queues a host request, returning the zero-based queue position.
    pub async fn request_host(
        &self,
        user: UserId,
        name: &str,
        format: FormatId,
    ) -> Result<usize, RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(
            RoomCommand::RequestHost {
                user,
                name: name.to_string(),
                format,
                reply: tx,
            },
            rx,
        )
        .await
    }

    pub async fn withdraw_host(&self, user: UserId) -> Result<(), RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::WithdrawHost { user, reply: tx }, rx)
            .await
    }

    pub async fn promote_next_host(&self, caller: UserId) -> Result<ActivityId, RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.request(RoomCommand::PromoteNextHost { caller, reply: tx }, rx)
            .await
    }

    pub async fn status(&self) -> Result<RoomStatus, RejectReason> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Status { reply: tx })
            .map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown);
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

struct RoomActor {
    room: RoomId,
    config: SchedulerConfig,
    formats: Arc<FormatRegistry>,
    slot: Option<Activity>,
    cooldowns: CooldownRegistry,
    queue: HostQueue,
    timers: WatchdogSet<TimerKind>,
    privileges: PrivilegeLedger,
    transport: Arc<dyn ChatTransport>,
    moderation: Arc<dyn Moderation>,
    store: Arc<dyn SchedulerStore>,
    /// Whether an automated game has run since the last hosted game.
    /// A fresh room (no hosted game yet) trivially satisfies the gate.
    scripted_since_hosted: bool,
    last_activity_unix: Option<u64>,
    /// Clone handed to watchdogs so timer events re-enter the stream.
    sender: mpsc::UnboundedSender<RoomCommand>,
    receiver: mpsc::UnboundedReceiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        info!(room_id = %self.room, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Create { kind, reply } => {
                    let _ = reply.send(self.handle_create(kind));
                }
                RoomCommand::Join { user, name, reply } => {
                    let _ = reply.send(self.handle_join(user, &name));
                }
                RoomCommand::Leave { user, reply } => {
                    let _ = reply.send(self.handle_leave(&user));
                }
                RoomCommand::Guess { user, name, text } => {
                    self.handle_guess(&user, &name, &text);
                }
                RoomCommand::Accept { user, reply } => {
                    let _ = reply.send(self.handle_accept(&user));
                }
                RoomCommand::Decline { user, reply } => {
                    let _ = reply.send(self.handle_decline(&user));
                }
                RoomCommand::Host {
                    caller,
                    action,
                    reply,
                } => {
                    let _ = reply.send(self.handle_host(&caller, action));
                }
                RoomCommand::ForceEnd {
                    caller,
                    reason,
                    reply,
                } => {
                    let _ = reply.send(self.handle_force_end(&caller, &reason));
                }
                RoomCommand::RequestHost {
                    user,
                    name,
                    format,
                    reply,
                } => {
                    let _ = reply.send(self.handle_request_host(user, &name, format));
                }
                RoomCommand::WithdrawHost { user, reply } => {
                    let _ = reply.send(self.handle_withdraw_host(&user));
                }
                RoomCommand::PromoteNextHost { caller, reply } => {
                    let _ = reply.send(self.handle_promote(&caller));
                }
                RoomCommand::Status { reply } => {
                    let _ = reply.send(self.status());
                }
                RoomCommand::Timer(event) => {
                    self.handle_timer(event);
                }
                RoomCommand::Shutdown => {
                    info!(room_id = %self.room, "room actor shutting down");
                    self.timers.cancel_all();
                    break;
                }
            }
        }

        info!(room_id = %self.room, "room actor stopped");
    }

    // -- Creation -----------------------------------------------------------

    fn handle_create(&mut self, kind: CreateKind) -> Result<ActivityId, RejectReason> {
        if self.slot.is_some() {
            return Err(RejectReason::SlotOccupied);
        }
        match kind {
            CreateKind::Scripted { format, target } => self.create_scripted(format, target),
            CreateKind::Challenge {
                format,
                target,
                challenger,
                challenger_name,
                opponent,
            } => self.create_challenge(format, target, challenger, challenger_name, opponent),
        }
    }

    fn create_scripted(
        &mut self,
        format: FormatId,
        target: Option<u32>,
    ) -> Result<ActivityId, RejectReason> {
        let descriptor = self
            .formats
            .format(&format)
            .ok_or_else(|| RejectReason::UnknownFormat(format.clone()))?;
        if descriptor.kind == FormatKind::Hosted {
            return Err(RejectReason::NotAutomated(format));
        }
        self.check_cooldown(&CooldownCategory::from(descriptor.category))?;
        let target = descriptor.target.resolve(target)?;
        let content = self
            .formats
            .new_content(&format)
            .ok_or(RejectReason::UnknownFormat(format))?;

        let id = next_activity_id();
        let mut engine = RoundEngine::new(
            id,
            self.room.clone(),
            descriptor,
            content,
            target,
            self.config.timing.clone(),
        );
        let effects = engine.open();
        self.slot = Some(Activity::Scripted(engine));
        info!(room_id = %self.room, activity = %id, target, "automated game created");
        self.apply_effects(id, effects);
        Ok(id)
    }

    fn create_challenge(
        &mut self,
        format: FormatId,
        target: Option<u32>,
        challenger: UserId,
        challenger_name: String,
        opponent: Opponent,
    ) -> Result<ActivityId, RejectReason> {
        let descriptor = self
            .formats
            .format(&format)
            .ok_or_else(|| RejectReason::UnknownFormat(format.clone()))?;
        if descriptor.kind == FormatKind::Hosted {
            return Err(RejectReason::NotAutomated(format));
        }
        self.check_cooldown(&CooldownCategory::from(descriptor.category))?;
        let target = descriptor.target.resolve(target)?;
        let content = self
            .formats
            .new_content(&format)
            .ok_or(RejectReason::UnknownFormat(format))?;

        let id = next_activity_id();
        let child_id = next_activity_id();
        let human_opponent = match &opponent {
            Opponent::User { id, .. } => Some(id.clone()),
            Opponent::Bot { .. } => None,
        };
        let mut coordinator = ChildGameCoordinator::new(
            id,
            child_id,
            self.room.clone(),
            descriptor,
            (challenger.clone(), challenger_name),
            opponent,
            target,
            content,
            self.config.timing.clone(),
            self.config.accept_window,
            self.config.bot_move_delay,
        )?;

        // Match-scoped moderation: participants can always speak, the
        // rest of the room cannot interfere. Rolled back when the
        // challenge ends, on every exit path.
        self.privileges
            .elevate(&*self.moderation, &self.room, &challenger, Rank::Voice);
        if let Some(user) = &human_opponent {
            self.privileges
                .elevate(&*self.moderation, &self.room, user, Rank::Voice);
        }
        self.privileges
            .set_modchat(&*self.moderation, &self.room, Rank::Voice);

        let effects = coordinator.open();
        self.slot = Some(Activity::Challenge(coordinator));
        info!(room_id = %self.room, activity = %id, child = %child_id, "challenge created");
        self.apply_effects(id, effects);
        Ok(id)
    }

    fn check_cooldown(&self, category: &CooldownCategory) -> Result<(), RejectReason> {
        let remaining = self.cooldowns.remaining(&self.room, category);
        if remaining > Duration::ZERO {
            Err(RejectReason::CooldownActive { remaining })
        } else {
            Ok(())
        }
    }

    // -- Participation ------------------------------------------------------

    fn handle_join(&mut self, user: UserId, name: &str) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        let id = activity.id();
        let effects = activity.join(user, name)?;
        self.apply_effects(id, effects);
        Ok(())
    }

    fn handle_leave(&mut self, user: &UserId) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        if activity.leave(user) {
            Ok(())
        } else {
            Err(warden_activity::ActivityError::NotAParticipant(user.clone()).into())
        }
    }

    fn handle_guess(&mut self, user: &UserId, name: &str, text: &str) {
        let Some(activity) = &mut self.slot else {
            return;
        };
        let id = activity.id();
        let effects = activity.handle_guess(user, name, text);
        self.apply_effects(id, effects);
    }

    fn handle_accept(&mut self, user: &UserId) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        let id = activity.id();
        match activity {
            Activity::Challenge(coordinator) => {
                let effects = coordinator.accept(user)?;
                self.apply_effects(id, effects);
                Ok(())
            }
            _ => Err(warden_activity::ActivityError::WrongPhase(
                "there is no pending challenge".into(),
            )
            .into()),
        }
    }

    fn handle_decline(&mut self, user: &UserId) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        let id = activity.id();
        match activity {
            Activity::Challenge(coordinator) => {
                let effects = coordinator.decline(user)?;
                self.apply_effects(id, effects);
                Ok(())
            }
            _ => Err(warden_activity::ActivityError::WrongPhase(
                "there is no pending challenge".into(),
            )
            .into()),
        }
    }

    // -- Host operations ----------------------------------------------------

    fn handle_host(&mut self, caller: &UserId, action: HostAction) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        let id = activity.id();
        let Activity::Hosted(game) = activity else {
            return Err(warden_activity::ActivityError::WrongPhase(
                "no hosted game is running".into(),
            )
            .into());
        };
        let effects = match action {
            HostAction::Start => game.start(caller)?,
            HostAction::Extend(extra) => game.extend(caller, extra)?,
            HostAction::SetSubHost { user, name } => game.set_sub_host(caller, user, &name)?,
            HostAction::AwardPoints { user, name, points } => {
                game.award_points(caller, &user, &name, points)?
            }
            HostAction::DeductPoints { user, points } => {
                game.deduct_points(caller, &user, points)?
            }
            HostAction::AddPlayer { user, name } => game.add_player(caller, user, &name)?,
            HostAction::RemovePlayer { user } => game.remove_player(caller, &user)?,
            HostAction::DeclareWinner { user } => game.declare_winner(caller, &user)?,
            HostAction::End => game.end(caller)?,
        };
        self.apply_effects(id, effects);
        Ok(())
    }

    fn handle_force_end(&mut self, caller: &UserId, reason: &str) -> Result<(), RejectReason> {
        let Some(activity) = &mut self.slot else {
            return Err(RejectReason::NoActivity);
        };
        let authorized = self.moderation.rank_of(&self.room, caller).is_staff()
            || matches!(activity, Activity::Hosted(game) if game.is_host(caller));
        if !authorized {
            return Err(RejectReason::NotAuthorized);
        }
        let id = activity.id();
        let effects = activity.force_end(reason);
        self.apply_effects(id, effects);
        Ok(())
    }

    // -- Host queue ---------------------------------------------------------

    fn handle_request_host(
        &mut self,
        user: UserId,
        name: &str,
        format: FormatId,
    ) -> Result<usize, RejectReason> {
        match self.formats.is_hosted(&format) {
            None => return Err(RejectReason::UnknownFormat(format)),
            Some(false) => return Err(RejectReason::NotHosted(format)),
            Some(true) => {}
        }
        let position = self.queue.enqueue(
            &self.room,
            HostQueueEntry {
                host: user.clone(),
                host_name: name.to_string(),
                format,
            },
        )?;
        debug!(room_id = %self.room, host = %user, position, "host request queued");
        self.persist();
        Ok(position)
    }

    fn handle_withdraw_host(&mut self, user: &UserId) -> Result<(), RejectReason> {
        if !self.queue.remove(&self.room, user) {
            return Err(RejectReason::NotQueued);
        }
        self.persist();
        Ok(())
    }

    fn handle_promote(&mut self, caller: &UserId) -> Result<ActivityId, RejectReason> {
        if !self.moderation.rank_of(&self.room, caller).is_staff() {
            return Err(RejectReason::NotAuthorized);
        }
        self.try_promote()
    }

    /// Promotes the head of the host queue into the slot, if every gate
    /// passes. A failed gate leaves the head entry where it is.
    fn try_promote(&mut self) -> Result<ActivityId, RejectReason> {
        if self.slot.is_some() {
            return Err(RejectReason::SlotOccupied);
        }
        let Some(entry) = self.queue.peek(&self.room) else {
            return Err(RejectReason::NoPendingHost);
        };
        if self.config.require_scripted_between_hosted && !self.scripted_since_hosted {
            return Err(RejectReason::HostedTooSoon);
        }
        self.check_cooldown(&CooldownCategory::Scripted)?;
        self.check_cooldown(&CooldownCategory::HostedFormat(entry.format.clone()))?;
        let descriptor = self
            .formats
            .format(&entry.format)
            .ok_or_else(|| RejectReason::UnknownFormat(entry.format.clone()))?;

        let Some(entry) = self.queue.pop(&self.room) else {
            return Err(RejectReason::NoPendingHost);
        };
        let id = next_activity_id();
        let mut game = HostedGame::new(
            id,
            self.room.clone(),
            descriptor,
            entry.host.clone(),
            entry.host_name.clone(),
            self.config.budget.clone(),
        );
        self.privileges
            .elevate(&*self.moderation, &self.room, &entry.host, Rank::Voice);
        self.scripted_since_hosted = false;

        let effects = game.open_signups();
        self.slot = Some(Activity::Hosted(game));
        info!(
            room_id = %self.room,
            activity = %id,
            host = %entry.host,
            format = %entry.format,
            "host promoted from queue"
        );
        self.apply_effects(id, effects);
        self.persist();
        Ok(id)
    }

    // -- Timers -------------------------------------------------------------

    fn handle_timer(&mut self, event: TimerEvent) {
        let Some(activity) = &mut self.slot else {
            trace!(room_id = %self.room, activity = %event.activity, "timer for empty slot, dropped");
            return;
        };
        if activity.id() != event.activity {
            trace!(
                room_id = %self.room,
                activity = %event.activity,
                current = %activity.id(),
                "timer outlived its activity, dropped"
            );
            return;
        }
        let id = activity.id();
        let effects = activity.on_timer(event.kind, event.seq);
        self.apply_effects(id, effects);
    }

    // -- Effect interpretation ----------------------------------------------

    fn apply_effects(&mut self, id: ActivityId, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Announce(text) => self.transport.announce(&self.room, &text),
                Effect::Private(user, text) => self.transport.private(&self.room, &user, &text),
                Effect::StartTimer { kind, delay, seq } => {
                    self.timers.notify(
                        kind,
                        delay,
                        self.sender.clone(),
                        RoomCommand::Timer(TimerEvent {
                            activity: id,
                            kind,
                            seq,
                        }),
                    );
                }
                Effect::CancelTimer(kind) => self.timers.cancel(&kind),
                // Consumed by parent coordinators; nothing to do here.
                Effect::RoundStarted { .. } => {}
                Effect::Ended(report) => self.finish_activity(report),
            }
        }
    }

    /// End-of-activity bookkeeping. Runs exactly once per activity: the
    /// machines' sticky `ended` flag guarantees at most one `Ended`
    /// effect, and the slot is emptied here.
    fn finish_activity(&mut self, report: EndReport) {
        let Some(activity) = self.slot.take() else {
            return;
        };
        let id = activity.id();
        let format = activity.format().clone();
        drop(activity);

        self.timers.cancel_all();
        self.privileges.restore(&*self.moderation, &self.room);

        let category = if format.kind == FormatKind::Hosted {
            CooldownCategory::HostedFormat(format.id.clone())
        } else {
            self.scripted_since_hosted = true;
            CooldownCategory::from(format.category)
        };
        self.cooldowns.mark_ended(&self.room, category);

        let payouts = convert_rewards(
            &format,
            &report.ledger,
            report.winner.as_ref(),
            self.config.payout_cap,
        );
        for payout in &payouts {
            self.transport.private(
                &self.room,
                &payout.user,
                &format!("You earned {} bits playing {}!", payout.bits, format.name),
            );
        }

        self.last_activity_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .ok();
        self.persist();

        info!(
            room_id = %self.room,
            activity = %id,
            winner = report.winner_name.as_deref().unwrap_or("none"),
            payouts = payouts.len(),
            forced = report.forced,
            "activity ended"
        );

        // The slot just freed up; a waiting host may be due.
        if let Err(reason) = self.try_promote() {
            debug!(room_id = %self.room, %reason, "host promotion not attempted");
        }
    }

    // -- Bookkeeping --------------------------------------------------------

    fn persist(&self) {
        let record = RoomRecord {
            cooldowns: self.cooldowns.snapshot(&self.room),
            queue: self.queue.snapshot(&self.room),
            last_activity_unix: self.last_activity_unix,
            scripted_since_hosted: self.scripted_since_hosted,
        };
        if let Err(error) = self.store.save(&self.room, &record) {
            warn!(room_id = %self.room, %error, "failed to persist room record");
        }
    }

    fn status(&self) -> RoomStatus {
        RoomStatus {
            room: self.room.clone(),
            activity: self.slot.as_ref().map(|a| ActivityStatus {
                id: a.id(),
                format: a.format().id.clone(),
                name: a.format().name.clone(),
            }),
            queue: self.queue.snapshot(&self.room),
            cooldowns: self.cooldowns.snapshot(&self.room),
        }
    }
}

/// Spawns a room actor, restoring persisted state, and returns its handle.
pub(crate) fn spawn_room(
    room: RoomId,
    config: SchedulerConfig,
    formats: Arc<FormatRegistry>,
    transport: Arc<dyn ChatTransport>,
    moderation: Arc<dyn Moderation>,
    store: Arc<dyn SchedulerStore>,
) -> RoomHandle {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut cooldowns = CooldownRegistry::new(config.cooldowns.clone());
    let mut queue = HostQueue::new(config.queue_capacity);
    let mut scripted_since_hosted = true;
    let mut last_activity_unix = None;
    match store.load(&room) {
        Ok(Some(record)) => {
            cooldowns.restore(&room, record.cooldowns);
            queue.restore(&room, record.queue);
            scripted_since_hosted = record.scripted_since_hosted;
            last_activity_unix = record.last_activity_unix;
            debug!(room_id = %room, "room record restored");
        }
        Ok(None) => {}
        Err(error) => {
            warn!(room_id = %room, %error, "failed to load room record, starting fresh");
        }
    }

    let actor = RoomActor {
        room: room.clone(),
        config,
        formats,
        slot: None,
        cooldowns,
        queue,
        timers: WatchdogSet::new(),
        privileges: PrivilegeLedger::new(),
        transport,
        moderation,
        store,
        scripted_since_hosted,
        last_activity_unix,
        sender: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room, sender: tx }
}
