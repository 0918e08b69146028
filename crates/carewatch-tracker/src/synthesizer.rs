use carewatch_common::{ActivityLabel, ActivitySession, CareLog, Outcome};
use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

pub const DEFAULT_CHILD_NAME: &str = "Child";

pub fn outcome_for(activity: ActivityLabel) -> Outcome {
    match activity {
        ActivityLabel::Play => Outcome::Positive,
        ActivityLabel::Hyper => Outcome::Concerning,
        _ => Outcome::Neutral,
    }
}

pub fn describe(child: &str, activity: ActivityLabel) -> String {
    match activity {
        ActivityLabel::Play => {
            format!("{} was actively playing and moving around energetically.", child)
        }
        ActivityLabel::Rest => format!("{} had a quiet rest period and remained calm.", child),
        ActivityLabel::Hyper => {
            format!("{} displayed high energy levels with lots of movement.", child)
        }
        ActivityLabel::Idle => format!("{} was sitting quietly and appeared content.", child),
        ActivityLabel::Sleep => format!("{} was resting peacefully during sleep time.", child),
        other => format!("{} was engaged in {} activity.", child, other.as_str().to_lowercase()),
    }
}

/// One-line brief for a downstream summariser, e.g. a caregiver-facing LLM.
pub fn summary_prompt(child: &str, activity: ActivityLabel, minutes: i64) -> String {
    let what = match activity {
        ActivityLabel::Play => format!("was active and engaged in play for {} minutes", minutes),
        ActivityLabel::Rest => format!("rested quietly for {} minutes", minutes),
        ActivityLabel::Hyper => format!("showed high energy activity for {} minutes", minutes),
        ActivityLabel::Idle => format!("was calm and still for {} minutes", minutes),
        ActivityLabel::Sleep => format!("was sleeping for {} minutes", minutes),
        other => format!("was {} for {} minutes", other.as_str().to_lowercase(), minutes),
    };
    format!("{} {}. Generate a brief caregiver log.", child, what)
}

/// Whole minutes, rounding half up.
pub fn rounded_minutes(session: &ActivitySession) -> i64 {
    let ms = session.duration().num_milliseconds().max(0);
    (ms as f64 / 60_000.0).round() as i64
}

fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Build the care log for a closed session. An open session is treated as
/// having ended at its start.
pub fn synthesize(session: &ActivitySession, child: &str) -> CareLog {
    let child = if child.trim().is_empty() { DEFAULT_CHILD_NAME } else { child };
    let ended_at = session.end_time.unwrap_or(session.start_time);
    let duration_minutes = rounded_minutes(session);

    CareLog {
        id: Uuid::new_v4(),
        session_id: session.id,
        child: child.to_string(),
        activity: session.activity,
        started_at: session.start_time,
        ended_at,
        start_time: clock_time(session.start_time),
        end_time: clock_time(ended_at),
        duration_minutes,
        duration: format!("{} min", duration_minutes),
        outcome: outcome_for(session.activity),
        description: describe(child, session.activity),
    }
}
