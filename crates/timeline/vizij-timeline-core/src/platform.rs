//! Contracts with the host platform.
//!
//! The core never reads or writes a target directly. Hosts implement these
//! traits for their element type; `vizij-test-fixtures` ships a scripted
//! in-memory target for tests.

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::command::Keyframe;
use crate::error::AnimationFailure;
use crate::property::PropertyId;
use crate::timing::EffectTiming;

/// Reads the live (computed) value of a property.
pub trait StyleInspector {
    fn current_value(&self, property: &PropertyId) -> String;
}

/// Notifications a handle delivers to its subscribers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandleEvent {
    Finish,
    Cancel,
    Remove,
}

/// An in-flight animation started by an [`Animator`].
pub trait AnimationHandle {
    fn pause(&self);
    fn resume(&self);
    fn cancel(&self);

    /// Write the animation's current (final, once finished) values into the
    /// target's inline style.
    fn commit_styles(&self);

    /// Resolves once the animation finishes, or fails when it is cancelled or aborted.
    fn finished(&self) -> LocalBoxFuture<'static, Result<(), AnimationFailure>>;

    /// Register a listener for finish/cancel/remove notifications. A listener
    /// added after the handle already settled is invoked immediately.
    fn subscribe(&self, listener: Box<dyn Fn(HandleEvent)>);
}

/// Low-level animation primitive of the host.
pub trait Animator {
    fn animate(&self, keyframes: &[Keyframe], timing: &EffectTiming) -> Rc<dyn AnimationHandle>;

    /// Cancel every animation currently running on the target.
    fn cancel_animations(&self);
}

/// The target's inline `style` attribute.
pub trait InlineStyle {
    /// `None` when the attribute is absent.
    fn style_attribute(&self) -> Option<String>;

    /// `None` removes the attribute.
    fn set_style_attribute(&self, style: Option<&str>);
}

/// Everything a Scene needs from its target.
pub trait Target: StyleInspector + Animator + InlineStyle {}

impl<T: StyleInspector + Animator + InlineStyle + ?Sized> Target for T {}
