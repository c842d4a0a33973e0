//! Pipeline integration tests
//!
//! Unattended runs through the director with scripted generation services.

mod common;

use assert_matches::assert_matches;
use common::{ScriptedStudio, TestHarness};

use autostudio::director::{Director, StopAfter};
use autostudio::timeline;
use studio_core::{AgentTag, Error, Stage, TransitionKind};

#[tokio::test]
async fn test_full_run_with_failing_scene() {
    let h = TestHarness::with_studio(ScriptedStudio::with_failing_image(3));
    let director = Director::new(h.orchestrator.clone());
    let mut out = Vec::new();

    let outcome = director
        .run("robot chase in a cyberpunk city", None, &mut out)
        .await
        .unwrap();

    let state = &outcome.state;
    assert_eq!(state.status, Stage::Completed);
    assert_eq!(state.script.len(), 6);
    assert_eq!(state.frames.len(), 5);
    assert_eq!(
        state
            .frames
            .iter()
            .map(|f| f.transition.kind)
            .collect::<Vec<_>>(),
        vec![
            TransitionKind::FadeIn,
            TransitionKind::Cut,
            TransitionKind::Cut,
            TransitionKind::CrossDissolve,
            TransitionKind::FadeOut,
        ]
    );
    assert!(state.frames[2].generated_image_url.is_none());
    assert!(state.frames[2].generated_audio_url.is_some());

    let report = outcome.report.unwrap();
    assert_eq!(report.images, 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.studio.images(), 5);
    assert_eq!(h.studio.speeches(), 4);

    let completions = state
        .logs
        .iter()
        .filter(|l| l.message.ends_with("assets ready."))
        .count();
    assert_eq!(completions, 5);

    // Every log entry was echoed, in order.
    let echoed = String::from_utf8(out).unwrap();
    assert_eq!(outcome.echoed, state.logs.len());
    assert_eq!(echoed.lines().count(), state.logs.len());
    assert!(echoed.contains("[SCRIPT] Script complete (6 lines)"));
    assert!(echoed.contains("[VISUAL] Scene 3: image generation failed"));
}

#[tokio::test]
async fn test_script_lines_partition_across_frames() {
    let h = TestHarness::new();
    let outcome = Director::new(h.orchestrator.clone())
        .run("robot chase", Some(StopAfter::Storyboard), Vec::new())
        .await
        .unwrap();

    let state = &outcome.state;
    assert_eq!(state.status, Stage::ReviewStoryboard);
    assert!(outcome.report.is_none());
    assert!(state.frames_partition_script());

    let rejoined: Vec<_> = state
        .frames
        .iter()
        .flat_map(|f| f.script_lines.iter().map(|l| l.id))
        .collect();
    let original: Vec<_> = state.script.iter().map(|l| l.id).collect();
    assert_eq!(rejoined, original);
    assert_eq!(h.studio.images(), 0);
}

#[tokio::test]
async fn test_stop_after_script() {
    let h = TestHarness::new();
    let outcome = Director::new(h.orchestrator.clone())
        .run("robot chase", Some(StopAfter::Script), Vec::new())
        .await
        .unwrap();

    assert_eq!(outcome.state.status, Stage::ReviewScript);
    assert!(outcome.state.frames.is_empty());
}

#[tokio::test]
async fn test_script_failure_surfaces_after_echo() {
    let h = TestHarness::with_studio(ScriptedStudio {
        fail_script: true,
        ..ScriptedStudio::default()
    });
    let mut out = Vec::new();

    let err = Director::new(h.orchestrator.clone())
        .run("robot chase", None, &mut out)
        .await
        .unwrap_err();

    assert_matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Generation {
            agent: AgentTag::Script,
            ..
        })
    );
    let state = h.orchestrator.snapshot();
    assert_eq!(state.status, Stage::Error);
    assert!(state.script.is_empty());
    assert!(String::from_utf8(out).unwrap().contains("Error: script generation failed"));
}

#[tokio::test]
async fn test_empty_idea_leaves_project_idle() {
    let h = TestHarness::new();
    let err = Director::new(h.orchestrator.clone())
        .run("  ", None, Vec::new())
        .await
        .unwrap_err();

    assert_matches!(err.downcast_ref::<Error>(), Some(Error::Validation(_)));
    assert!(err.downcast_ref::<Error>().unwrap().is_precondition());
    assert_eq!(h.orchestrator.snapshot().status, Stage::Idle);
    assert!(h.orchestrator.snapshot().logs.is_empty());
}

#[tokio::test]
async fn test_slow_echo_catches_up_on_lag() {
    let h = TestHarness::with_capacity(1);
    let mut out = Vec::new();

    let outcome = Director::new(h.orchestrator.clone())
        .run("robot chase", None, &mut out)
        .await
        .unwrap();

    let state = &outcome.state;
    assert_eq!(state.status, Stage::Completed);
    assert_eq!(outcome.echoed, state.logs.len());

    let echoed = String::from_utf8(out).unwrap();
    let expected: Vec<String> = state.logs.iter().map(|l| l.to_string()).collect();
    assert_eq!(echoed.lines().collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn test_second_run_keeps_log_history() {
    let h = TestHarness::new();
    let director = Director::new(h.orchestrator.clone());

    let first = director.run("first idea", None, Vec::new()).await.unwrap();
    let second = director.run("second idea", None, Vec::new()).await.unwrap();

    assert_ne!(first.state.id, second.state.id);
    assert_eq!(second.state.user_idea, "second idea");
    assert!(second.state.logs.starts_with(&first.state.logs));
    assert_eq!(second.echoed, second.state.logs.len() - first.state.logs.len());
}

#[tokio::test]
async fn test_export_after_run() {
    let h = TestHarness::new();
    let outcome = Director::new(h.orchestrator.clone())
        .run("robot chase", None, Vec::new())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robot-chase.json");
    timeline::export_json(&outcome.state, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["frames"].as_array().unwrap().len(), 5);
    assert_eq!(json["frames"][4]["transition"]["type"], "FADE_OUT");
    assert!(json["frames"][4].get("generated_audio_url").is_none());

    let text = timeline::render_timeline(&outcome.state);
    assert!(text.contains("Total: 15.0s across 5 scenes, 5 with assets"));
}
