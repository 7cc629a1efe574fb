//! Single-threaded driver for Scene play-throughs on a [`MockTarget`].

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use vizij_timeline_core::{PlayOptions, Scene, TimelineError};

use crate::target::MockTarget;

pub type PlayResult = std::result::Result<(), TimelineError>;

/// Completion slot of a spawned play-through.
#[derive(Clone, Default)]
pub struct PlayOutcome(Rc<RefCell<Option<PlayResult>>>);

impl PlayOutcome {
    pub fn is_done(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn result(&self) -> Option<PlayResult> {
        self.0.borrow().clone()
    }
}

pub struct Stage {
    pool: LocalPool,
    target: Rc<MockTarget>,
    tick: f64,
}

impl Stage {
    pub const DEFAULT_TICK_MS: f64 = 10.0;
    /// Virtual time after which [`Stage::run_until_done`] gives up.
    pub const TIME_LIMIT_MS: f64 = 60_000.0;

    pub fn new(target: Rc<MockTarget>) -> Self {
        Self {
            pool: LocalPool::new(),
            target,
            tick: Self::DEFAULT_TICK_MS,
        }
    }

    pub fn with_tick(mut self, tick_ms: f64) -> Self {
        self.tick = tick_ms;
        self
    }

    pub fn target(&self) -> &Rc<MockTarget> {
        &self.target
    }

    /// Start `scene.play(options)` and run it until it waits on the clock.
    pub fn spawn_play(&mut self, scene: &Scene, options: PlayOptions) -> Result<PlayOutcome> {
        let outcome = PlayOutcome::default();
        let slot = outcome.clone();
        let scene = scene.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                let result = scene.play(options).await;
                *slot.0.borrow_mut() = Some(result);
            })
            .map_err(|e| anyhow!("failed to spawn play-through: {e:?}"))?;
        self.settle();
        Ok(outcome)
    }

    /// Run every task until none can make progress.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Advance the clock by `ms` in ticks, settling after each one.
    pub fn advance(&mut self, ms: f64) {
        let mut left = ms;
        while left > 0.0 {
            let dt = left.min(self.tick);
            self.target.advance(dt);
            self.settle();
            left -= dt;
        }
    }

    /// Advance until `outcome` completes.
    pub fn run_until_done(&mut self, outcome: &PlayOutcome) -> Result<PlayResult> {
        let start = self.target.now();
        loop {
            self.settle();
            if let Some(result) = outcome.result() {
                return Ok(result);
            }
            if self.target.now() - start > Self::TIME_LIMIT_MS {
                bail!("play-through did not finish within {} ms", Self::TIME_LIMIT_MS);
            }
            self.advance(self.tick);
        }
    }

    /// Play `scene` to the end; returns the play result and the virtual time it took.
    pub fn play(&mut self, scene: &Scene, options: PlayOptions) -> Result<(PlayResult, f64)> {
        let start = self.target.now();
        let outcome = self.spawn_play(scene, options)?;
        let result = self.run_until_done(&outcome)?;
        Ok((result, self.target.now() - start))
    }
}
