//! Scenes: immutable, replayable timelines bound to one target.
//!
//! Every builder call returns a new Scene and leaves the receiver untouched.
//! Scenes built from one another form a lineage that shares the target, the
//! configuration, the baseline inline style and the seed cache; each Scene
//! owns its own playback state.
//!
//! ```ignore
//! let scene = create_scene(target)
//!     .init(vec![commands::fade(["0"])?])?
//!     .apply(commands::fade(["1"])?, None)?
//!     .chain(vec![commands::translate_x(["40px"])?, commands::rotate(["90deg"])?], None)?;
//! scene.play(PlayOptions::default()).await?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::command::CommandDescriptor;
use crate::config::Config;
use crate::error::TimelineError;
use crate::history::History;
use crate::ids::SceneId;
use crate::platform::Target;
use crate::playback::{PlayGate, PlayOptions, PlayTicket, PlaybackState};
use crate::step::Step;
use crate::step_meta::{ExecutionMode, StepMeta};
use crate::stored_timeline::parse_stored_timeline_json;
use crate::synth::{synthesize, ResolvedStep, SeedCache};
use crate::timing::TimingOverrides;

/// State shared by every Scene of a lineage.
struct Lineage {
    id: SceneId,
    target: Rc<dyn Target>,
    config: Config,
    baseline: Option<String>,
    seeds: SeedCache,
    gate: Rc<PlayGate>,
}

thread_local! {
    static GATES: RefCell<Vec<(Weak<dyn Target>, Rc<PlayGate>)>> = RefCell::new(Vec::new());
}

/// The play gate shared by every lineage built on `target`.
fn gate_for(target: &Rc<dyn Target>) -> Rc<PlayGate> {
    let key = Rc::as_ptr(target) as *const ();
    GATES.with(|gates| {
        let mut gates = gates.borrow_mut();
        gates.retain(|(weak, _)| weak.strong_count() > 0);
        if let Some((_, gate)) = gates
            .iter()
            .find(|(weak, _)| Weak::as_ptr(weak) as *const () == key)
        {
            return Rc::clone(gate);
        }
        let gate = Rc::new(PlayGate::default());
        gates.push((Rc::downgrade(target), Rc::clone(&gate)));
        gate
    })
}

#[derive(Debug, Default)]
struct Playback {
    state: PlaybackState,
    current: Option<usize>,
    generation: u64,
}

/// An ordered sequence of steps for one target.
///
/// Cloning a Scene yields a handle to the same Scene, playback state
/// included. Builder calls always produce independent Scenes.
#[derive(Clone)]
pub struct Scene {
    lineage: Rc<Lineage>,
    init: Option<StepMeta>,
    /// Non-init step metas in append order.
    metas: History<StepMeta>,
    /// Runtime steps in play order; the init step, if any, comes first.
    steps: History<Rc<Step>>,
    playback: Rc<RefCell<Playback>>,
}

/// Create an empty Scene for `target` with the default configuration.
pub fn create_scene<T: Target + 'static>(target: Rc<T>) -> Scene {
    Scene::new(target)
}

impl Scene {
    pub fn new<T: Target + 'static>(target: Rc<T>) -> Self {
        Self::with_config(target, Config::default())
    }

    /// Create an empty Scene. The target's inline style is captured here as the
    /// lineage's baseline.
    pub fn with_config<T: Target + 'static>(target: Rc<T>, config: Config) -> Self {
        let target: Rc<dyn Target> = target;
        let baseline = target.style_attribute();
        let id = SceneId::new();
        let gate = gate_for(&target);
        log::debug!("scene {id} created (baseline: {baseline:?})");
        Self {
            lineage: Rc::new(Lineage {
                id,
                target,
                config,
                baseline,
                seeds: SeedCache::new(),
                gate,
            }),
            init: None,
            metas: History::new(),
            steps: History::new(),
            playback: Rc::new(RefCell::new(Playback::default())),
        }
    }

    // --------- builders ---------

    /// Append a Simple step animating one command.
    pub fn apply(
        &self,
        command: CommandDescriptor,
        timing: Option<TimingOverrides>,
    ) -> Result<Scene, TimelineError> {
        self.run(StepMeta::new(
            ExecutionMode::Simple,
            vec![command],
            timing.unwrap_or_default(),
        )?)
    }

    /// Append a Chain step: each command starts when the previous one finished.
    pub fn chain(
        &self,
        commands: Vec<CommandDescriptor>,
        timing: Option<TimingOverrides>,
    ) -> Result<Scene, TimelineError> {
        self.run(StepMeta::new(
            ExecutionMode::Chain,
            commands,
            timing.unwrap_or_default(),
        )?)
    }

    /// Append a Together step: all commands start at once.
    pub fn together(
        &self,
        commands: Vec<CommandDescriptor>,
        timing: Option<TimingOverrides>,
    ) -> Result<Scene, TimelineError> {
        self.run(StepMeta::new(
            ExecutionMode::Together,
            commands,
            timing.unwrap_or_default(),
        )?)
    }

    /// Merge `commands` into the Scene's single Init step.
    pub fn init(&self, commands: Vec<CommandDescriptor>) -> Result<Scene, TimelineError> {
        self.run(StepMeta::new(
            ExecutionMode::Init,
            commands,
            TimingOverrides::default(),
        )?)
    }

    /// Append an arbitrary step meta.
    ///
    /// Init metas are merged into the existing Init step and the whole history is
    /// re-materialized, since every later step now sees different prior state.
    pub fn run(&self, meta: StepMeta) -> Result<Scene, TimelineError> {
        if meta.is_init() {
            return self.with_init(meta);
        }

        let resolved = self.resolve(self.timeline_metas(), &meta);
        let step = Step::new(resolved, &self.lineage.config.default_timing)?;
        log::debug!(
            "scene {}: appended {} step #{} ({} command(s))",
            self.lineage.id,
            meta.mode(),
            self.steps.len(),
            meta.commands().len()
        );

        Ok(self.derive(
            self.init.clone(),
            self.metas.push(meta),
            self.steps.push(Rc::new(step)),
        ))
    }

    /// Append every step of a stored timeline document.
    pub fn extend_from_json(&self, json: &str) -> Result<Scene, TimelineError> {
        let base = self.derive(self.init.clone(), self.metas.clone(), self.steps.clone());
        parse_stored_timeline_json(json)?
            .into_iter()
            .try_fold(base, |scene, meta| scene.run(meta))
    }

    fn with_init(&self, meta: StepMeta) -> Result<Scene, TimelineError> {
        let init = match &self.init {
            Some(existing) => existing.merge_init(&meta),
            None => meta,
        };

        let defaults = &self.lineage.config.default_timing;
        let steps = {
            let mut prior: Vec<&StepMeta> = Vec::with_capacity(self.metas.len() + 1);
            let init_step = Step::new(self.resolve(std::iter::empty(), &init), defaults)?;
            let mut steps = History::new().push(Rc::new(init_step));
            prior.push(&init);
            for meta in self.metas.to_vec() {
                let resolved = self.resolve(prior.iter().copied(), meta);
                steps = steps.push(Rc::new(Step::new(resolved, defaults)?));
                prior.push(meta);
            }
            steps
        };
        log::debug!(
            "scene {}: init now sets {} pair(s); re-materialized {} step(s)",
            self.lineage.id,
            init.commands().len(),
            steps.len()
        );

        Ok(self.derive(Some(init), self.metas.clone(), steps))
    }

    fn derive(
        &self,
        init: Option<StepMeta>,
        metas: History<StepMeta>,
        steps: History<Rc<Step>>,
    ) -> Scene {
        Scene {
            lineage: Rc::clone(&self.lineage),
            init,
            metas,
            steps,
            playback: Rc::new(RefCell::new(Playback::default())),
        }
    }

    fn resolve<'a, I>(&self, prior: I, meta: &StepMeta) -> ResolvedStep
    where
        I: IntoIterator<Item = &'a StepMeta>,
    {
        let lineage = &*self.lineage;
        synthesize(
            prior,
            meta,
            &lineage.config.composite_separator,
            |property, template| lineage.seeds.seed(&*lineage.target, property, template),
        )
    }

    /// Step metas in timeline order: the init meta first, if any.
    fn timeline_metas(&self) -> Vec<&StepMeta> {
        self.init.iter().chain(self.metas.to_vec()).collect()
    }

    // --------- playback ---------

    /// Play every step in order.
    ///
    /// Any animation running on the target is cancelled first and the inline
    /// style is reset to the baseline. After a successful play-through the
    /// final styles stay committed, unless `options.commit` is false, in which
    /// case the baseline is restored. A failing step ends the play-through
    /// with its error and leaves the styles committed so far in place.
    ///
    /// Starting another play-through, on this Scene or any other Scene of the
    /// target, cancels this one; it then resolves with a cancellation error
    /// and leaves the newer play-through's state alone.
    pub async fn play(&self, options: PlayOptions) -> Result<(), TimelineError> {
        let generation = self.begin_play();
        let steps: Vec<Rc<Step>> = self.steps.to_vec().into_iter().cloned().collect();
        let target = Rc::clone(&self.lineage.target);
        let gate = Rc::clone(&self.lineage.gate);

        for (index, step) in steps.iter().enumerate() {
            let ticket = PlayTicket::new(&gate, generation, index);
            let result = match self.enter_step(&ticket) {
                Ok(()) => step.play(&*target, &ticket).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                if self.finish_play(generation) {
                    log::warn!(
                        "scene {}: step #{index} ({}) failed: {err}",
                        self.lineage.id,
                        step.mode()
                    );
                } else {
                    log::debug!(
                        "scene {}: superseded play-through ended at step #{index}",
                        self.lineage.id
                    );
                }
                return Err(err);
            }
        }

        if self.finish_play(generation) && !options.commit {
            self.restore_baseline();
        }
        Ok(())
    }

    fn begin_play(&self) -> u64 {
        self.lineage.target.cancel_animations();
        for step in self.steps.to_vec() {
            step.cancel();
        }
        self.restore_baseline();

        let generation = self.lineage.gate.open();
        let mut playback = self.playback.borrow_mut();
        playback.generation = generation;
        playback.state = PlaybackState::Playing;
        playback.current = None;
        log::debug!(
            "scene {}: play-through {generation} started ({} step(s))",
            self.lineage.id,
            self.steps.len()
        );
        generation
    }

    /// Mark the ticket's step as current, unless the play-through was superseded.
    fn enter_step(&self, ticket: &PlayTicket<'_>) -> Result<(), TimelineError> {
        ticket.check()?;
        let mut playback = self.playback.borrow_mut();
        playback.current = Some(ticket.step());
        if playback.state == PlaybackState::Paused {
            playback.state = PlaybackState::Playing;
        }
        Ok(())
    }

    /// Return this Scene to idle if `generation` still owns its playback state.
    /// True when `generation` is still the target's current play-through.
    fn finish_play(&self, generation: u64) -> bool {
        let mut playback = self.playback.borrow_mut();
        if playback.generation == generation {
            playback.state = PlaybackState::Idle;
            playback.current = None;
        }
        self.lineage.gate.is_current(generation)
    }

    fn restore_baseline(&self) {
        self.lineage
            .target
            .set_style_attribute(self.lineage.baseline.as_deref());
    }

    fn active_step(&self) -> Option<Rc<Step>> {
        let playback = self.playback.borrow();
        if !playback.state.is_active() {
            return None;
        }
        playback
            .current
            .and_then(|index| self.steps.get(index))
            .cloned()
    }

    /// Pause the current step's animations. No effect when nothing is playing.
    pub fn pause(&self) {
        match self.active_step() {
            Some(step) => {
                step.pause();
                self.playback.borrow_mut().state = PlaybackState::Paused;
            }
            None => log::debug!("scene {}: pause ignored, nothing playing", self.lineage.id),
        }
    }

    /// Resume the current step's animations. No effect when nothing is playing.
    pub fn resume(&self) {
        match self.active_step() {
            Some(step) => {
                step.resume();
                self.playback.borrow_mut().state = PlaybackState::Playing;
            }
            None => log::debug!("scene {}: resume ignored, nothing playing", self.lineage.id),
        }
    }

    // --------- accessors ---------

    #[inline]
    pub fn id(&self) -> SceneId {
        self.lineage.id
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.lineage.config
    }

    /// Inline style captured when the lineage was created.
    #[inline]
    pub fn baseline(&self) -> Option<&str> {
        self.lineage.baseline.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.borrow().state
    }

    /// Index of the step currently playing.
    pub fn current_step(&self) -> Option<usize> {
        self.playback.borrow().current
    }

    /// Runtime steps in play order.
    pub fn steps(&self) -> Vec<Rc<Step>> {
        self.steps.to_vec().into_iter().cloned().collect()
    }

    /// Step metas in play order.
    pub fn step_metas(&self) -> Vec<StepMeta> {
        self.timeline_metas().into_iter().cloned().collect()
    }

    pub fn init_meta(&self) -> Option<&StepMeta> {
        self.init.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Handles in flight across all steps. Diagnostic only.
    pub fn live_handle_count(&self) -> usize {
        self.steps
            .to_vec()
            .iter()
            .map(|step| step.live_handle_count())
            .sum()
    }

    /// Live reads performed by the lineage so far.
    pub fn seed_reads(&self) -> usize {
        self.lineage.seeds.reads()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.lineage.id)
            .field("steps", &self.steps.len())
            .field("init", &self.init.is_some())
            .field("playback", &*self.playback.borrow())
            .finish()
    }
}
