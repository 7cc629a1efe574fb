use std::rc::Rc;

use vizij_test_fixtures::{timelines, MockTarget, Stage};
use vizij_timeline_core::{
    create_scene, parse_stored_timeline_json, Easing, ExecutionMode, InlineStyle, PlayOptions,
    StepMeta,
};

#[test]
fn loads_bare_step_list() {
    let json = timelines::json("fade-slide-spin").unwrap();
    let metas = parse_stored_timeline_json(&json).unwrap();
    let modes: Vec<_> = metas.iter().map(StepMeta::mode).collect();
    assert_eq!(modes, vec![ExecutionMode::Together, ExecutionMode::Chain]);
    assert_eq!(metas[1].commands()[1].template().as_str(), "rotate($)");
}

#[test]
fn stored_scenario_plays_like_the_built_one() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .extend_from_json(&timelines::json("fade-slide-spin").unwrap())
        .unwrap();
    assert_eq!(scene.len(), 2);

    let mut stage = Stage::new(Rc::clone(&target));
    let (result, elapsed) = stage.play(&scene, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 900.0);
    assert_eq!(
        target.style_attribute().as_deref(),
        Some("opacity: 1; transform: translate(10px) rotate(360deg)")
    );
}

#[test]
fn named_document_with_init_and_overrides() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .extend_from_json(&timelines::json("titled-intro").unwrap())
        .unwrap();

    let metas = scene.step_metas();
    assert!(metas[0].is_init());
    assert_eq!(metas[1].timing().easing, Some(Easing::EaseOut));
    assert_eq!(metas[2].commands()[0].timing().delay, Some(50.0));

    let mut stage = Stage::new(Rc::clone(&target));
    let (result, elapsed) = stage.play(&scene, PlayOptions::default()).unwrap();
    result.unwrap();
    assert_eq!(elapsed, 550.0);
    assert_eq!(
        target.style_attribute().as_deref(),
        Some("opacity: 1; font-size: 24px; background-color: red")
    );
}

#[test]
fn unknown_mode_falls_back_to_simple() {
    let target = Rc::new(MockTarget::new());
    let scene = create_scene(Rc::clone(&target))
        .extend_from_json(&timelines::json("unknown-mode").unwrap())
        .unwrap();

    let steps = scene.steps();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].mode(), ExecutionMode::Simple);
    assert_eq!(steps[0].commands().count(), 1);

    let mut stage = Stage::new(Rc::clone(&target));
    stage.play(&scene, PlayOptions::default()).unwrap().0.unwrap();
    assert_eq!(target.inline_value("opacity").as_deref(), Some("0.5"));
}

#[test]
fn extending_keeps_the_receiver_and_appends_after_it() {
    let target = Rc::new(MockTarget::new());
    let base = create_scene(Rc::clone(&target))
        .apply(vizij_timeline_core::commands::fade(["0"]).unwrap(), None)
        .unwrap();
    let extended = base
        .extend_from_json(&timelines::json("unknown-mode").unwrap())
        .unwrap();
    assert_eq!(base.len(), 1);
    assert_eq!(extended.len(), 2);
    // Continuity carries over from the built step into the loaded one.
    assert_eq!(extended.steps()[1].commands().next().unwrap().seed(), "0");
}

#[test]
fn malformed_document_is_a_serialization_error() {
    let target = Rc::new(MockTarget::new());
    let err = create_scene(target)
        .extend_from_json(r#"{ "steps": "nope" }"#)
        .unwrap_err();
    assert_eq!(err.category(), "serialization");
}
