use std::rc::Rc;

use futures::FutureExt;
use vizij_test_fixtures::{HandleStatus, MockTarget, Stage};
use vizij_timeline_core::{
    commands::{background_color, fade, font_size, rotate, translate, translate_x},
    create_scene, AnimationFailure, InlineStyle, PlayOptions, PlaybackState, Scene, TimelineError,
    TimingOverrides,
};

fn ms(duration: f64) -> Option<TimingOverrides> {
    Some(TimingOverrides::new().with_duration(duration))
}

fn fade_slide_spin(target: &Rc<MockTarget>) -> Scene {
    create_scene(Rc::clone(target))
        .together(vec![fade([0, 1]).unwrap()], None)
        .unwrap()
        .chain(
            vec![
                translate(["0", "10px"]).unwrap(),
                rotate(["0", "360deg"]).unwrap(),
            ],
            None,
        )
        .unwrap()
}

#[test]
fn committed_play_keeps_final_styles() {
    let target = Rc::new(MockTarget::new());
    let scene = fade_slide_spin(&target);
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, _) = stage.play(&scene, PlayOptions::default()).unwrap();
    result.unwrap();

    assert_eq!(target.inline_value("opacity").as_deref(), Some("1"));
    let transform = target.inline_value("transform").unwrap();
    assert!(transform.contains("translate(10px)"), "{transform}");
    assert!(transform.contains("rotate(360deg)"), "{transform}");
    assert_eq!(
        target.style_attribute().as_deref(),
        Some("opacity: 1; transform: translate(10px) rotate(360deg)")
    );
    assert_eq!(scene.state(), PlaybackState::Idle);
    assert_eq!(scene.current_step(), None);
}

#[test]
fn preview_restores_absent_style() {
    let target = Rc::new(MockTarget::new());
    let scene = fade_slide_spin(&target);
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, _) = stage.play(&scene, PlayOptions::preview()).unwrap();
    result.unwrap();
    assert_eq!(target.style_attribute(), None);
}

#[test]
fn preview_restores_exact_inline_style() {
    let original = "color: red;opacity:0.2";
    let target = Rc::new(MockTarget::new().with_inline_style(original));
    let scene = create_scene(Rc::clone(&target))
        .apply(fade(["0.9"]).unwrap(), ms(50.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, _) = stage.play(&scene, PlayOptions { commit: false }).unwrap();
    result.unwrap();
    assert_eq!(target.style_attribute().as_deref(), Some(original));
}

#[test]
fn repeated_previews_are_idempotent() {
    let target = Rc::new(MockTarget::new().with_inline_style("color: blue"));
    let scene = fade_slide_spin(&target);
    let mut stage = Stage::new(Rc::clone(&target));

    stage.play(&scene, PlayOptions::preview()).unwrap().0.unwrap();
    let first: Vec<_> = target.animations();
    assert_eq!(target.style_attribute().as_deref(), Some("color: blue"));

    stage.play(&scene, PlayOptions::preview()).unwrap().0.unwrap();
    let all = target.animations();
    assert_eq!(target.style_attribute().as_deref(), Some("color: blue"));

    // Keyframes are fixed at build time, so both runs animate the same values.
    assert_eq!(all.len(), first.len() * 2);
    for (a, b) in first.iter().zip(&all[first.len()..]) {
        assert_eq!(a.values, b.values);
        assert_eq!(a.timing, b.timing);
    }
}

#[test]
fn single_init_merges_and_plays_first() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .init(vec![fade(["0"]).unwrap(), font_size([12]).unwrap()])
        .unwrap()
        .apply(fade(["1"]).unwrap(), ms(100.0))
        .unwrap()
        .init(vec![fade(["0.5"]).unwrap(), background_color(["red"]).unwrap()])
        .unwrap();

    let steps = scene.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps.iter().filter(|s| s.is_init()).count(), 1);
    assert!(steps[0].is_init());

    let init = scene.init_meta().unwrap();
    let pairs: Vec<(&str, &str)> = init
        .commands()
        .iter()
        .map(|c| (c.property().as_str(), c.last_value()))
        .collect();
    assert_eq!(
        pairs,
        vec![("opacity", "0.5"), ("fontSize", "12"), ("backgroundColor", "red")]
    );
    assert!(steps[0].command_timings().all(|t| t.end_time() == 0.0));

    let mut stage = Stage::new(Rc::clone(&target));
    let (result, elapsed) = stage.play(&scene, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 100.0);
    assert_eq!(
        target.style_attribute().as_deref(),
        Some("opacity: 1; font-size: 12px; background-color: red")
    );
    // The fade starts from the init value.
    let fade_record = target.animations().into_iter().last().unwrap();
    assert_eq!(fade_record.values, vec!["0.5", "1"]);
}

#[test]
fn builder_calls_leave_prior_scenes_untouched() {
    let target = Rc::new(MockTarget::new());
    let base = create_scene(Rc::clone(&target))
        .apply(fade(["0.5"]).unwrap(), None)
        .unwrap();
    let left = base.apply(translate_x(["10px"]).unwrap(), None).unwrap();
    let right = base.apply(rotate(["45deg"]).unwrap(), None).unwrap();
    let with_init = base.init(vec![fade(["0"]).unwrap()]).unwrap();

    assert_eq!(base.len(), 1);
    assert_eq!(left.len(), 2);
    assert_eq!(right.len(), 2);
    assert_eq!(with_init.len(), 2);
    assert!(base.init_meta().is_none());
    assert!(Rc::ptr_eq(&left.steps()[0], &right.steps()[0]));
    assert!(Rc::ptr_eq(&base.steps()[0], &left.steps()[0]));
    assert_eq!(base.id(), left.id());
    assert_eq!(base.steps()[0].commands().next().unwrap().seed(), "1");
}

#[test]
fn chain_runs_sequentially_and_together_concurrently() {
    let commands = || {
        vec![
            fade(["0"])
                .unwrap()
                .with_timing(TimingOverrides::new().with_duration(100.0))
                .unwrap(),
            translate_x(["10px"])
                .unwrap()
                .with_timing(TimingOverrides::new().with_duration(200.0))
                .unwrap(),
            rotate(["90deg"])
                .unwrap()
                .with_timing(TimingOverrides::new().with_duration(300.0))
                .unwrap(),
        ]
    };

    let target = Rc::new(MockTarget::new());
    let chained = create_scene(Rc::clone(&target))
        .chain(commands(), None)
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));
    let (result, elapsed) = stage.play(&chained, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 600.0);
    let starts: Vec<f64> = target.animations().iter().map(|a| a.started_at).collect();
    assert_eq!(starts, vec![0.0, 100.0, 300.0]);

    let target = Rc::new(MockTarget::new());
    let together = create_scene(Rc::clone(&target))
        .together(commands(), None)
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));
    let (result, elapsed) = stage.play(&together, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 300.0);
    assert!(target.animations().iter().all(|a| a.started_at == 0.0));
}

#[test]
fn step_timing_overrides_defaults_and_command_timing_wins() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .together(
            vec![
                fade(["0"]).unwrap(),
                rotate(["10deg"])
                    .unwrap()
                    .with_timing(TimingOverrides::new().with_delay(20.0))
                    .unwrap(),
            ],
            Some(TimingOverrides::new().with_duration(120.0).with_delay(5.0)),
        )
        .unwrap()
        .apply(translate(["1px"]).unwrap(), None)
        .unwrap();

    let timings: Vec<_> = scene
        .steps()
        .iter()
        .flat_map(|s| s.command_timings().cloned().collect::<Vec<_>>())
        .collect();
    assert_eq!((timings[0].delay, timings[0].duration), (5.0, 120.0));
    assert_eq!((timings[1].delay, timings[1].duration), (20.0, 120.0));
    assert_eq!((timings[2].delay, timings[2].duration), (0.0, 300.0));
}

#[test]
fn pause_and_resume_are_noops_when_idle() {
    let target = Rc::new(MockTarget::new());
    let scene = fade_slide_spin(&target);
    scene.pause();
    scene.resume();
    assert_eq!(scene.state(), PlaybackState::Idle);
    assert_eq!(target.running(), 0);

    let empty = create_scene(target);
    empty.pause();
    empty.resume();
    assert_eq!(empty.state(), PlaybackState::Idle);
}

#[test]
fn pause_holds_the_current_step() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .apply(fade(["0"]).unwrap(), ms(100.0))
        .unwrap()
        .apply(fade(["1"]).unwrap(), ms(100.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let outcome = stage.spawn_play(&scene, PlayOptions::default()).unwrap();
    assert_eq!(scene.state(), PlaybackState::Playing);
    assert_eq!(scene.current_step(), Some(0));
    assert_eq!(scene.live_handle_count(), 1);

    stage.advance(50.0);
    scene.pause();
    assert_eq!(scene.state(), PlaybackState::Paused);
    assert!(target.handles()[0].is_paused());

    stage.advance(500.0);
    assert!(!outcome.is_done());
    assert_eq!(scene.current_step(), Some(0));

    scene.resume();
    assert_eq!(scene.state(), PlaybackState::Playing);
    stage.advance(50.0);
    assert_eq!(scene.current_step(), Some(1));

    stage.run_until_done(&outcome).unwrap().unwrap();
    assert_eq!(scene.state(), PlaybackState::Idle);
    assert_eq!(scene.live_handle_count(), 0);
    assert_eq!(target.inline_value("opacity").as_deref(), Some("1"));
}

#[test]
fn failing_step_keeps_earlier_commits() {
    let target = Rc::new(MockTarget::new());
    target.fail_on("transform", "detached");
    let scene = create_scene(Rc::clone(&target))
        .apply(fade(["0.5"]).unwrap(), ms(100.0))
        .unwrap()
        .apply(translate_x(["10px"]).unwrap(), ms(100.0))
        .unwrap()
        .apply(fade(["0"]).unwrap(), ms(100.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, _) = stage.play(&scene, PlayOptions::preview()).unwrap();
    let err = result.unwrap_err();
    assert_eq!(
        err,
        TimelineError::Playback {
            property: "transform".into(),
            failure: AnimationFailure::Aborted {
                reason: "detached".into()
            },
        }
    );
    assert!(!err.is_cancellation());
    // No baseline restore on failure, and the last step never ran.
    assert_eq!(target.style_attribute().as_deref(), Some("opacity: 0.5"));
    assert_eq!(target.animations().len(), 2);
    assert_eq!(scene.state(), PlaybackState::Idle);
}

#[test]
fn replaying_cancels_the_running_play_through() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .apply(fade(["0"]).unwrap(), ms(100.0))
        .unwrap()
        .apply(fade(["1"]).unwrap(), ms(100.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let first = stage.spawn_play(&scene, PlayOptions::default()).unwrap();
    stage.advance(50.0);
    let second = stage.spawn_play(&scene, PlayOptions::default()).unwrap();

    let err = first.result().unwrap().unwrap_err();
    assert!(err.is_cancellation(), "{err}");
    assert_eq!(target.handles()[0].status(), HandleStatus::Cancelled);
    // The superseded play-through left the new one alone.
    assert_eq!(scene.state(), PlaybackState::Playing);
    assert_eq!(scene.current_step(), Some(0));

    stage.run_until_done(&second).unwrap().unwrap();
    assert_eq!(scene.state(), PlaybackState::Idle);
    assert_eq!(target.inline_value("opacity").as_deref(), Some("1"));
}

#[test]
fn another_scene_on_the_same_target_cancels_the_first() {
    let target = Rc::new(MockTarget::new());
    let a = create_scene(Rc::clone(&target))
        .apply(fade(["0"]).unwrap(), ms(200.0))
        .unwrap();
    let b = create_scene(Rc::clone(&target))
        .apply(rotate(["90deg"]).unwrap(), ms(100.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let first = stage.spawn_play(&a, PlayOptions::default()).unwrap();
    stage.advance(20.0);
    let second = stage.spawn_play(&b, PlayOptions::default()).unwrap();

    assert!(first.result().unwrap().unwrap_err().is_cancellation());
    assert_eq!(a.state(), PlaybackState::Idle);
    assert_eq!(b.state(), PlaybackState::Playing);

    stage.run_until_done(&second).unwrap().unwrap();
    assert_eq!(target.inline_value("opacity"), None);
    assert_eq!(target.inline_value("transform").as_deref(), Some("rotate(90deg)"));
}

#[test]
fn live_handles_are_released_when_they_settle() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .together(
            vec![fade(["0"]).unwrap(), translate(["5px"]).unwrap()],
            ms(100.0),
        )
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let outcome = stage.spawn_play(&scene, PlayOptions::default()).unwrap();
    assert_eq!(scene.live_handle_count(), 2);
    stage.run_until_done(&outcome).unwrap().unwrap();
    assert_eq!(scene.live_handle_count(), 0);
}

#[test]
fn together_commits_siblings_of_an_aborted_command() {
    let target = Rc::new(MockTarget::new());
    target.fail_on("transform", "detached");
    let scene = create_scene(Rc::clone(&target))
        .together(
            vec![fade(["0.4"]).unwrap(), translate(["5px"]).unwrap()],
            ms(100.0),
        )
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, elapsed) = stage.play(&scene, PlayOptions::default()).unwrap();
    let err = result.unwrap_err();
    assert_eq!(
        err,
        TimelineError::Playback {
            property: "transform".into(),
            failure: AnimationFailure::Aborted {
                reason: "detached".into()
            },
        }
    );
    // The step still waited for the fade and committed it.
    assert_eq!(elapsed, 100.0);
    assert_eq!(target.handles()[0].status(), HandleStatus::Finished);
    assert_eq!(target.inline_value("opacity").as_deref(), Some("0.4"));
    assert_eq!(target.inline_value("transform"), None);
    assert_eq!(scene.live_handle_count(), 0);
    assert_eq!(target.running(), 0);
    assert_eq!(scene.state(), PlaybackState::Idle);
}

#[test]
fn finished_but_unpolled_play_through_does_not_commit_after_takeover() {
    let target = Rc::new(MockTarget::new());
    let a = create_scene(Rc::clone(&target))
        .chain(
            vec![fade(["0.3"]).unwrap(), rotate(["90deg"]).unwrap()],
            ms(100.0),
        )
        .unwrap();
    let b = create_scene(Rc::clone(&target))
        .apply(translate_x(["10px"]).unwrap(), ms(100.0))
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let first = stage.spawn_play(&a, PlayOptions::default()).unwrap();
    // The fade finishes, but A's task has not run yet.
    target.advance(100.0);
    assert_eq!(target.handles()[0].status(), HandleStatus::Finished);

    let mut second = Box::pin(b.play(PlayOptions::default()));
    assert!((&mut second).now_or_never().is_none());
    assert_eq!(target.style_attribute(), None);

    stage.settle();
    assert_eq!(
        first.result().unwrap(),
        Err(TimelineError::Superseded { step: 0 })
    );
    assert_eq!(a.state(), PlaybackState::Idle);
    // A neither committed its fade nor launched its rotation.
    assert_eq!(target.style_attribute(), None);
    assert_eq!(target.animations().len(), 2);
    assert_eq!(target.running(), 1);
    assert_eq!(b.state(), PlaybackState::Playing);

    target.advance(100.0);
    (&mut second).now_or_never().unwrap().unwrap();
    assert_eq!(
        target.style_attribute().as_deref(),
        Some("transform: translateX(10px)")
    );
    assert_eq!(b.state(), PlaybackState::Idle);
}

#[test]
fn init_with_looping_command_still_applies_instantly() {
    let target = Rc::new(MockTarget::new());
    let looping = fade(["0.2"])
        .unwrap()
        .with_timing(TimingOverrides::new().with_iterations(f64::INFINITY))
        .unwrap();
    let scene = create_scene(Rc::clone(&target))
        .init(vec![looping])
        .unwrap();
    let mut stage = Stage::new(Rc::clone(&target));

    let (result, elapsed) = stage.play(&scene, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 0.0);
    assert_eq!(target.inline_value("opacity").as_deref(), Some("0.2"));
}
