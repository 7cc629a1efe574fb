//! Runtime steps.
//!
//! A step is one schedulable unit of a Scene. All four variants share the same
//! bookkeeping ([`LiveHandles`]) and differ only in how they start their
//! commands:
//!
//! - `Simple`: one command;
//! - `Chain`: command *i+1* starts after command *i* finished;
//! - `Together`: every command starts at once, the step ends when all ended;
//! - `Init`: `Together` with zero delay and duration.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::future::join_all;
use indexmap::IndexMap;

use crate::command::ResolvedCommand;
use crate::error::TimelineError;
use crate::ids::{HandleId, IdAllocator};
use crate::platform::{AnimationHandle, Animator, HandleEvent};
use crate::playback::PlayTicket;
use crate::step_meta::ExecutionMode;
use crate::synth::ResolvedStep;
use crate::timing::{EffectTiming, TimingOverrides};

#[derive(Default)]
struct LiveState {
    ids: IdAllocator,
    handles: IndexMap<HandleId, Rc<dyn AnimationHandle>>,
}

/// Handles currently in flight for one step.
#[derive(Default)]
pub struct LiveHandles {
    state: RefCell<LiveState>,
}

impl LiveHandles {
    /// Register `handle` and subscribe a listener that drops it again on
    /// finish, cancel or removal.
    fn track(this: &Rc<Self>, handle: &Rc<dyn AnimationHandle>) -> HandleId {
        let id = {
            let mut state = this.state.borrow_mut();
            let id = state.ids.alloc_handle();
            state.handles.insert(id, Rc::clone(handle));
            id
        };
        log::trace!("handle {id:?} registered");

        let live: Weak<LiveHandles> = Rc::downgrade(this);
        handle.subscribe(Box::new(move |event: HandleEvent| {
            if let Some(live) = live.upgrade() {
                live.release(id, event);
            }
        }));
        id
    }

    fn release(&self, id: HandleId, event: HandleEvent) {
        let removed = self.state.borrow_mut().handles.shift_remove(&id);
        if removed.is_some() {
            log::trace!("handle {id:?} released on {event:?}");
        }
    }

    /// Copy of the live handles; callers must not hold the set borrowed while
    /// calling into a handle, since handles report back synchronously.
    fn snapshot(&self) -> Vec<Rc<dyn AnimationHandle>> {
        self.state.borrow().handles.values().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state.borrow().handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pause(&self) {
        for handle in self.snapshot() {
            handle.pause();
        }
    }

    fn resume(&self) {
        for handle in self.snapshot() {
            handle.resume();
        }
    }

    fn cancel(&self) {
        for handle in self.snapshot() {
            handle.cancel();
        }
    }
}

impl std::fmt::Debug for LiveHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveHandles")
            .field("len", &self.len())
            .finish()
    }
}

/// A resolved command with its final timing.
#[derive(Clone, Debug)]
struct Scheduled {
    command: ResolvedCommand,
    timing: EffectTiming,
}

#[derive(Clone, Debug)]
enum Executor {
    Simple(Scheduled),
    Chain(Vec<Scheduled>),
    Together(Vec<Scheduled>),
    Init(Vec<Scheduled>),
}

#[derive(Debug)]
pub struct Step {
    executor: Executor,
    timing: TimingOverrides,
    live: Rc<LiveHandles>,
}

impl Step {
    /// Build a step from its resolved commands; `defaults` is the Scene's
    /// base timing.
    pub fn new(resolved: ResolvedStep, defaults: &EffectTiming) -> Result<Self, TimelineError> {
        let ResolvedStep {
            mode,
            commands,
            timing,
        } = resolved;

        let base = timing.apply_to(defaults);
        let instant = TimingOverrides::instant();
        let mut scheduled: Vec<Scheduled> = commands
            .into_iter()
            .map(|command| {
                let mut resolved = command.descriptor.timing().apply_to(&base);
                if mode == ExecutionMode::Init {
                    resolved = instant.apply_to(&resolved);
                }
                Scheduled {
                    command,
                    timing: resolved.retained(),
                }
            })
            .collect();

        let executor = match mode {
            ExecutionMode::Simple => {
                if scheduled.is_empty() {
                    return Err(TimelineError::EmptyStep { mode });
                }
                Executor::Simple(scheduled.swap_remove(0))
            }
            ExecutionMode::Chain => Executor::Chain(scheduled),
            ExecutionMode::Together => Executor::Together(scheduled),
            ExecutionMode::Init => Executor::Init(scheduled),
        };

        Ok(Self {
            executor,
            timing,
            live: Rc::new(LiveHandles::default()),
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        match self.executor {
            Executor::Simple(_) => ExecutionMode::Simple,
            Executor::Chain(_) => ExecutionMode::Chain,
            Executor::Together(_) => ExecutionMode::Together,
            Executor::Init(_) => ExecutionMode::Init,
        }
    }

    #[inline]
    pub fn is_init(&self) -> bool {
        matches!(self.executor, Executor::Init(_))
    }

    /// Step-level timing overrides as declared.
    #[inline]
    pub fn timing(&self) -> &TimingOverrides {
        &self.timing
    }

    fn scheduled(&self) -> &[Scheduled] {
        match &self.executor {
            Executor::Simple(one) => std::slice::from_ref(one),
            Executor::Chain(all) | Executor::Together(all) | Executor::Init(all) => all,
        }
    }

    /// Resolved commands in declaration order.
    pub fn commands(&self) -> impl Iterator<Item = &ResolvedCommand> {
        self.scheduled().iter().map(|s| &s.command)
    }

    /// Final timing handed to the animator for each command.
    pub fn command_timings(&self) -> impl Iterator<Item = &EffectTiming> {
        self.scheduled().iter().map(|s| &s.timing)
    }

    /// Number of handles currently in flight. Diagnostic only.
    #[inline]
    pub fn live_handle_count(&self) -> usize {
        self.live.len()
    }

    pub fn pause(&self) {
        self.live.pause();
    }

    pub fn resume(&self) {
        self.live.resume();
    }

    /// Cancel every in-flight handle of this step.
    pub fn cancel(&self) {
        self.live.cancel();
    }

    /// Run the step to completion on `animator`.
    ///
    /// Styles are committed only while `ticket` is current; a superseded
    /// play-through stops before committing or launching anything else.
    pub async fn play<A: Animator + ?Sized>(
        &self,
        animator: &A,
        ticket: &PlayTicket<'_>,
    ) -> Result<(), TimelineError> {
        match &self.executor {
            Executor::Simple(one) => self.run_one(animator, one, ticket).await,
            Executor::Chain(all) => {
                for scheduled in all {
                    self.run_one(animator, scheduled, ticket).await?;
                }
                Ok(())
            }
            Executor::Together(all) | Executor::Init(all) => {
                self.run_together(animator, all, ticket).await
            }
        }
    }

    fn launch<A: Animator + ?Sized>(
        &self,
        animator: &A,
        scheduled: &Scheduled,
    ) -> Rc<dyn AnimationHandle> {
        let handle = animator.animate(&scheduled.command.keyframes, &scheduled.timing);
        LiveHandles::track(&self.live, &handle);
        handle
    }

    async fn run_one<A: Animator + ?Sized>(
        &self,
        animator: &A,
        scheduled: &Scheduled,
        ticket: &PlayTicket<'_>,
    ) -> Result<(), TimelineError> {
        ticket.check()?;
        let handle = self.launch(animator, scheduled);
        Self::settle(handle, scheduled, ticket).await
    }

    async fn run_together<A: Animator + ?Sized>(
        &self,
        animator: &A,
        all: &[Scheduled],
        ticket: &PlayTicket<'_>,
    ) -> Result<(), TimelineError> {
        ticket.check()?;
        // Start every handle before awaiting any of them.
        let handles: Vec<_> = all.iter().map(|s| (self.launch(animator, s), s)).collect();
        // A failing handle does not abandon its siblings; the first error wins.
        let results = join_all(
            handles
                .into_iter()
                .map(|(handle, scheduled)| Self::settle(handle, scheduled, ticket)),
        )
        .await;
        results.into_iter().collect()
    }

    /// Await one handle and commit its final style on success.
    async fn settle(
        handle: Rc<dyn AnimationHandle>,
        scheduled: &Scheduled,
        ticket: &PlayTicket<'_>,
    ) -> Result<(), TimelineError> {
        match handle.finished().await {
            Ok(()) => {
                if let Err(err) = ticket.check() {
                    log::debug!(
                        "step {}: '{}' finished after being superseded, not committed",
                        ticket.step(),
                        scheduled.command.property()
                    );
                    return Err(err);
                }
                handle.commit_styles();
                Ok(())
            }
            Err(failure) => Err(TimelineError::Playback {
                property: scheduled.command.property().to_string(),
                failure,
            }),
        }
    }
}
