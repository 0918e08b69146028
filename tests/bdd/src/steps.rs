// Step definitions for activity session BDD tests
//
// Times in feature files are milliseconds on the scenario clock.

use anyhow::{anyhow, ensure, Result};
use carewatch_common::{ActivityLabel, WatchdogReset};
use carewatch_tracker::{classifier, synthesizer};
use cucumber::{given, then, when};

use crate::poses;
use crate::world::{parse_outcome, SessionWorld};

// ============================================================================
// Classification
// ============================================================================

#[given(expr = "a frame showing {string}")]
async fn frame_showing(world: &mut SessionWorld, pose: String) -> Result<()> {
    world.frame = poses::named(&pose)?;
    Ok(())
}

#[when("the frame is classified")]
async fn classify_frame(world: &mut SessionWorld) {
    world.detection = Some(classifier::classify(world.frame.as_ref()));
}

#[then(expr = "the activity is {word} with confidence {float}")]
async fn activity_is(world: &mut SessionWorld, label: String, confidence: f64) -> Result<()> {
    let expected: ActivityLabel = label.parse()?;
    let detection = world.detection.ok_or_else(|| anyhow!("no frame was classified"))?;
    ensure!(detection.label == expected, "expected {}, got {}", expected, detection.label);
    ensure!(
        (detection.confidence - confidence).abs() < 1e-9,
        "expected confidence {}, got {}",
        confidence,
        detection.confidence
    );
    Ok(())
}

// ============================================================================
// Configuration
// ============================================================================

#[given(expr = "the child is named {string}")]
async fn child_named(world: &mut SessionWorld, name: String) {
    world.child_name = name;
}

#[given(expr = "the idle timeout is {int} ms")]
async fn idle_timeout(world: &mut SessionWorld, ms: u64) {
    world.config.idle_timeout_ms = ms;
}

#[given("the watchdog restarts on every frame")]
async fn reset_every_frame(world: &mut SessionWorld) {
    world.set_reset_policy(WatchdogReset::EveryFrame);
}

#[given("the watchdog restarts only on accepted detections")]
async fn reset_accepted_only(world: &mut SessionWorld) {
    world.set_reset_policy(WatchdogReset::AcceptedOnly);
}

// ============================================================================
// Detections and time
// ============================================================================

#[when(expr = "{word} is detected with confidence {float} at {int} ms")]
async fn detected(
    world: &mut SessionWorld,
    label: String,
    confidence: f64,
    ms: i64,
) -> Result<()> {
    world.detect(label.parse()?, confidence, ms);
    Ok(())
}

#[when(expr = "no frames arrive until {int} ms")]
async fn silence_until(world: &mut SessionWorld, ms: i64) {
    world.wait_until(ms);
}

#[when(expr = "tracking stops at {int} ms")]
async fn tracking_stops(world: &mut SessionWorld, ms: i64) {
    world.stop(ms);
}

// ============================================================================
// Sessions
// ============================================================================

#[then(expr = "a(n) {word} session is open since {int} ms")]
async fn session_open(world: &mut SessionWorld, label: String, ms: i64) -> Result<()> {
    let expected: ActivityLabel = label.parse()?;
    let session =
        world.segmenter().current_session().ok_or_else(|| anyhow!("no session is open"))?;
    ensure!(session.activity == expected, "open session is {}", session.activity);
    ensure!(session.start_time == SessionWorld::at(ms), "opened at {}", session.start_time);
    Ok(())
}

#[then("no session is open")]
async fn no_session_open(world: &mut SessionWorld) -> Result<()> {
    ensure!(world.segmenter().current_session().is_none(), "a session is still open");
    Ok(())
}

#[then(expr = "the history holds {int} session(s)")]
async fn history_len(world: &mut SessionWorld, count: usize) -> Result<()> {
    let actual = world.segmenter().history().len();
    ensure!(actual == count, "history holds {} sessions", actual);
    Ok(())
}

#[then(expr = "the {word} session closed at {int} ms")]
async fn session_closed_at(world: &mut SessionWorld, label: String, ms: i64) -> Result<()> {
    let expected: ActivityLabel = label.parse()?;
    let end = SessionWorld::at(ms);
    let found = world
        .segmenter()
        .history()
        .iter()
        .any(|s| s.activity == expected && s.end_time == Some(end));
    ensure!(found, "no {} session closed at {} ms", expected, ms);
    Ok(())
}

#[then("the last frame changed nothing")]
async fn last_frame_changed_nothing(world: &mut SessionWorld) -> Result<()> {
    let last = world.transitions.last().ok_or_else(|| anyhow!("no frames were sent"))?;
    ensure!(last.is_empty(), "last frame produced {:?}", last);
    Ok(())
}

// ============================================================================
// Care logs
// ============================================================================

#[then(expr = "{int} care log(s) is/are written")]
async fn log_count(world: &mut SessionWorld, count: usize) -> Result<()> {
    let actual = world.logs().len();
    ensure!(actual == count, "{} care logs were written", actual);
    Ok(())
}

#[then(expr = "the last care log is for {word} lasting {string}")]
async fn last_log_activity(
    world: &mut SessionWorld,
    label: String,
    duration: String,
) -> Result<()> {
    let expected: ActivityLabel = label.parse()?;
    let log = world.logs().pop().ok_or_else(|| anyhow!("no care log was written"))?;
    ensure!(log.activity == expected, "last care log is for {}", log.activity);
    ensure!(log.duration == duration, "last care log lasted {}", log.duration);
    Ok(())
}

#[then(expr = "the last care log outcome is {word}")]
async fn last_log_outcome(world: &mut SessionWorld, outcome: String) -> Result<()> {
    let expected = parse_outcome(&outcome)?;
    let log = world.logs().pop().ok_or_else(|| anyhow!("no care log was written"))?;
    ensure!(log.outcome == expected, "last care log outcome is {:?}", log.outcome);
    Ok(())
}

#[then(expr = "the last care log description mentions {string}")]
async fn last_log_mentions(world: &mut SessionWorld, text: String) -> Result<()> {
    let log = world.logs().pop().ok_or_else(|| anyhow!("no care log was written"))?;
    ensure!(log.description.contains(&text), "description was {:?}", log.description);
    Ok(())
}

#[then(expr = "the summary prompt for the last care log is {string}")]
async fn last_log_prompt(world: &mut SessionWorld, prompt: String) -> Result<()> {
    let log = world.logs().pop().ok_or_else(|| anyhow!("no care log was written"))?;
    let actual = synthesizer::summary_prompt(&log.child, log.activity, log.duration_minutes);
    ensure!(actual == prompt, "prompt was {:?}", actual);
    Ok(())
}
