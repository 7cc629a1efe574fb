//! Scripted in-memory animation target.
//!
//! Time only moves when a test calls [`MockTarget::advance`]. Animations with a
//! zero end time finish on creation; everything else finishes once the clock
//! covered its delay and active duration while not paused. Inline styles are
//! kept as a raw `name: value; ...` string so tests can compare the exact
//! attribute text, or its absence.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use vizij_timeline_core::{
    kebabize, AnimationFailure, AnimationHandle, Animator, EffectTiming, HandleEvent, InlineStyle,
    Keyframe, PropertyId, StyleInspector,
};

#[derive(Clone, Debug, PartialEq)]
pub enum HandleStatus {
    Running,
    Finished,
    Cancelled,
    Aborted(String),
}

impl HandleStatus {
    fn outcome(&self) -> Option<Result<(), AnimationFailure>> {
        match self {
            HandleStatus::Running => None,
            HandleStatus::Finished => Some(Ok(())),
            HandleStatus::Cancelled => Some(Err(AnimationFailure::Cancelled)),
            HandleStatus::Aborted(reason) => Some(Err(AnimationFailure::Aborted {
                reason: reason.clone(),
            })),
        }
    }

    fn event(&self) -> Option<HandleEvent> {
        match self {
            HandleStatus::Running => None,
            HandleStatus::Finished => Some(HandleEvent::Finish),
            HandleStatus::Cancelled => Some(HandleEvent::Cancel),
            HandleStatus::Aborted(_) => Some(HandleEvent::Remove),
        }
    }
}

/// What the target saw for one `animate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRecord {
    pub id: usize,
    pub property: PropertyId,
    pub values: Vec<String>,
    pub timing: EffectTiming,
    pub started_at: f64,
    pub finished_at: Option<f64>,
    pub status: HandleStatus,
}

struct HandleState {
    status: HandleStatus,
    paused: bool,
    elapsed: f64,
    finished_at: Option<f64>,
    waiters: Vec<oneshot::Sender<Result<(), AnimationFailure>>>,
    listeners: Vec<Box<dyn Fn(HandleEvent)>>,
}

pub struct MockHandle {
    id: usize,
    target: Weak<RefCell<TargetState>>,
    property: PropertyId,
    values: Vec<String>,
    timing: EffectTiming,
    started_at: f64,
    state: RefCell<HandleState>,
}

impl MockHandle {
    pub fn status(&self) -> HandleStatus {
        self.state.borrow().status.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn record(&self) -> AnimationRecord {
        let state = self.state.borrow();
        AnimationRecord {
            id: self.id,
            property: self.property.clone(),
            values: self.values.clone(),
            timing: self.timing.clone(),
            started_at: self.started_at,
            finished_at: state.finished_at,
            status: state.status.clone(),
        }
    }

    fn tick(&self, dt: f64, now: f64) {
        let done = {
            let mut state = self.state.borrow_mut();
            if state.status != HandleStatus::Running || state.paused {
                return;
            }
            state.elapsed += dt;
            state.elapsed >= self.timing.end_time()
        };
        if done {
            self.settle(HandleStatus::Finished, Some(now));
        }
    }

    /// Move out of `Running`, wake waiters and notify listeners. Both are
    /// called with no borrow held.
    fn settle(&self, status: HandleStatus, finished_at: Option<f64>) {
        let (Some(outcome), Some(event)) = (status.outcome(), status.event()) else {
            return;
        };
        let (waiters, listeners) = {
            let mut state = self.state.borrow_mut();
            if state.status != HandleStatus::Running {
                return;
            }
            state.status = status;
            state.finished_at = finished_at;
            (
                std::mem::take(&mut state.waiters),
                std::mem::take(&mut state.listeners),
            )
        };
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
        for listener in &listeners {
            listener(event);
        }
    }

    /// Keyframe value at the current progress (discrete steps).
    fn current_value(&self) -> Option<String> {
        let state = self.state.borrow();
        if state.status == HandleStatus::Finished {
            return self.values.last().cloned();
        }
        let active = self.timing.duration * self.timing.iterations;
        let progress = if active > 0.0 {
            ((state.elapsed - self.timing.delay) / active).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let last = self.values.len().saturating_sub(1);
        let index = ((progress * last as f64).floor() as usize).min(last);
        self.values.get(index).cloned()
    }
}

impl AnimationHandle for MockHandle {
    fn pause(&self) {
        let mut state = self.state.borrow_mut();
        if state.status == HandleStatus::Running {
            state.paused = true;
        }
    }

    fn resume(&self) {
        self.state.borrow_mut().paused = false;
    }

    fn cancel(&self) {
        self.settle(HandleStatus::Cancelled, None);
    }

    fn commit_styles(&self) {
        let Some(value) = self.current_value() else {
            return;
        };
        if let Some(target) = self.target.upgrade() {
            target
                .borrow_mut()
                .set_declaration(&self.property.css_name(), &value);
        }
    }

    fn finished(&self) -> LocalBoxFuture<'static, Result<(), AnimationFailure>> {
        let mut state = self.state.borrow_mut();
        if let Some(outcome) = state.status.outcome() {
            return future::ready(outcome).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        state.waiters.push(tx);
        async move { rx.await.unwrap_or(Err(AnimationFailure::Cancelled)) }.boxed_local()
    }

    fn subscribe(&self, listener: Box<dyn Fn(HandleEvent)>) {
        let settled = self.state.borrow().status.event();
        match settled {
            Some(event) => listener(event),
            None => self.state.borrow_mut().listeners.push(listener),
        }
    }
}

struct TargetState {
    inline: Option<String>,
    computed: HashMap<String, String>,
    failures: HashMap<String, String>,
    reads: usize,
    now: f64,
    next_id: usize,
    handles: Vec<Rc<MockHandle>>,
}

impl TargetState {
    fn declaration(&self, css: &str) -> Option<String> {
        parse_declarations(self.inline.as_deref().unwrap_or_default())
            .into_iter()
            .find(|(name, _)| name == css)
            .map(|(_, value)| value)
    }

    fn set_declaration(&mut self, css: &str, value: &str) {
        let mut decls = parse_declarations(self.inline.as_deref().unwrap_or_default());
        match decls.iter_mut().find(|(name, _)| name == css) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((css.to_string(), value.to_string())),
        }
        self.inline = Some(
            decls
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join("; "),
        );
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// An element-like target: inline style, computed defaults and a virtual clock.
pub struct MockTarget {
    state: Rc<RefCell<TargetState>>,
}

impl Default for MockTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTarget {
    /// A target with no inline style and browser-like computed defaults.
    pub fn new() -> Self {
        let computed = [
            ("opacity", "1"),
            ("transform", "none"),
            ("font-size", "16px"),
            ("background-color", "rgba(0, 0, 0, 0)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            state: Rc::new(RefCell::new(TargetState {
                inline: None,
                computed,
                failures: HashMap::new(),
                reads: 0,
                now: 0.0,
                next_id: 0,
                handles: Vec::new(),
            })),
        }
    }

    pub fn with_inline_style(self, style: &str) -> Self {
        self.state.borrow_mut().inline = Some(style.to_string());
        self
    }

    /// Computed value reported when no inline declaration exists. Accepts camelCase or CSS names.
    pub fn with_computed(self, property: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .computed
            .insert(kebabize(property), value.to_string());
        self
    }

    /// Abort every later animation of `property` as soon as it starts.
    pub fn fail_on(&self, property: &str, reason: &str) {
        self.state
            .borrow_mut()
            .failures
            .insert(kebabize(property), reason.to_string());
    }

    /// Inline declaration for `property` (camelCase or CSS name).
    pub fn inline_value(&self, property: &str) -> Option<String> {
        self.state.borrow().declaration(&kebabize(property))
    }

    /// Number of live-value reads so far.
    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }

    pub fn now(&self) -> f64 {
        self.state.borrow().now
    }

    /// Move the clock forward by `ms`, finishing animations that reach their end.
    pub fn advance(&self, ms: f64) {
        let (handles, now) = {
            let mut state = self.state.borrow_mut();
            state.now += ms;
            (state.handles.clone(), state.now)
        };
        for handle in handles {
            handle.tick(ms, now);
        }
    }

    /// Every animation started on this target, oldest first.
    pub fn animations(&self) -> Vec<AnimationRecord> {
        self.handles().iter().map(|h| h.record()).collect()
    }

    pub fn handles(&self) -> Vec<Rc<MockHandle>> {
        self.state.borrow().handles.clone()
    }

    /// Animations still running (paused ones included).
    pub fn running(&self) -> usize {
        self.handles()
            .iter()
            .filter(|h| h.status() == HandleStatus::Running)
            .count()
    }
}

impl StyleInspector for MockTarget {
    fn current_value(&self, property: &PropertyId) -> String {
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        let css = property.css_name();
        state
            .declaration(&css)
            .or_else(|| state.computed.get(&css).cloned())
            .unwrap_or_default()
    }
}

impl Animator for MockTarget {
    fn animate(&self, keyframes: &[Keyframe], timing: &EffectTiming) -> Rc<dyn AnimationHandle> {
        let property = keyframes
            .first()
            .map(|k| k.property.clone())
            .unwrap_or_else(|| PropertyId::new(""));
        let (handle, failure) = {
            let mut state = self.state.borrow_mut();
            let handle = Rc::new(MockHandle {
                id: state.next_id,
                target: Rc::downgrade(&self.state),
                property: property.clone(),
                values: keyframes.iter().map(|k| k.value.clone()).collect(),
                timing: timing.clone(),
                started_at: state.now,
                state: RefCell::new(HandleState {
                    status: HandleStatus::Running,
                    paused: false,
                    elapsed: 0.0,
                    finished_at: None,
                    waiters: Vec::new(),
                    listeners: Vec::new(),
                }),
            });
            state.next_id += 1;
            state.handles.push(Rc::clone(&handle));
            let failure = state.failures.get(&property.css_name()).cloned();
            (handle, failure)
        };

        if let Some(reason) = failure {
            handle.settle(HandleStatus::Aborted(reason), None);
        } else if timing.end_time() <= 0.0 {
            handle.settle(HandleStatus::Finished, Some(handle.started_at));
        }
        handle
    }

    fn cancel_animations(&self) {
        for handle in self.handles() {
            handle.cancel();
        }
    }
}

impl InlineStyle for MockTarget {
    fn style_attribute(&self) -> Option<String> {
        self.state.borrow().inline.clone()
    }

    fn set_style_attribute(&self, style: Option<&str>) {
        self.state.borrow_mut().inline = style.map(str::to_string);
    }
}
