//! Scripted voting round
//!
//! Seats a moderator and `participants` voters in a fresh session, casts
//! every ballot concurrently, reveals (unless auto-reveal already did) and
//! finalizes the story with the recommended estimate.

use crate::commands::SimulateArgs;
use anyhow::{Context, Result, anyhow, bail};
use poker_application::{
    CastBallotInput, CreateSessionInput, EventNotifier, Membership, RoundController,
    SessionService, VoteReveal,
};
use poker_domain::{SessionCode, Story};
use poker_infrastructure::{
    BroadcastNotifier, CompositeNotifier, FileConfig, InMemoryStore, JsonlEventLog,
    TokenIdentityProvider,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// What one simulated round produced
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub session_code: SessionCode,
    pub sizing: String,
    pub voters: usize,
    pub auto_revealed: bool,
    pub reveal: VoteReveal,
    pub story: Story,
    /// Event names in publication order
    pub events: Vec<String>,
}

pub async fn run(config: &FileConfig, args: &SimulateArgs) -> Result<SimulationReport> {
    if args.votes.is_empty() {
        bail!("--votes needs at least one estimate");
    }

    let sizing = config.session.parse_sizing().map_err(|e| anyhow!(e))?;
    let mut settings = config.session.settings();
    if args.auto_reveal {
        settings.auto_reveal = true;
    }
    let params = config.round.to_round_params();

    // === Dependency Injection ===
    let store = Arc::new(InMemoryStore::new());
    let broadcast = Arc::new(BroadcastNotifier::new(config.notifier.channel_capacity));
    let mut notifier = CompositeNotifier::default().with(broadcast.clone());
    if let Some(path) = &config.notifier.event_log {
        match JsonlEventLog::new(path) {
            Some(log) => notifier = notifier.with(Arc::new(log)),
            None => warn!("Event log {} unavailable, continuing without it", path),
        }
    }
    let notifier: Arc<dyn EventNotifier> = Arc::new(notifier);

    let sessions = SessionService::new(store.clone(), Arc::new(TokenIdentityProvider::new()))
        .with_notifier(notifier.clone())
        .with_params(params);
    let controller = Arc::new(
        RoundController::new(store)
            .with_notifier(notifier)
            .with_params(params),
    );

    let moderator = sessions
        .create_session(
            CreateSessionInput::new("Simulation", "Moderator")
                .with_sizing(sizing)
                .with_settings(settings),
        )
        .await?;
    let code = moderator.session.code.clone();
    let mut events = broadcast.subscribe(&code);

    let mut voters: Vec<Membership> = vec![moderator.clone()];
    for i in 1..=args.participants {
        voters.push(
            sessions
                .join_session(&code, format!("Participant {}", i), false)
                .await?,
        );
    }
    info!("Session {}: {} voters seated", code, voters.len());

    let story = sessions
        .add_story(&moderator.caller, &code, args.story.as_str(), None)
        .await?;
    let story_id = story.id;
    controller.activate(&moderator.caller, &code, story_id).await?;

    let mut join_set = JoinSet::new();
    for (i, voter) in voters.iter().enumerate() {
        let controller = Arc::clone(&controller);
        let code = code.clone();
        let caller = sessions.authenticate(&voter.token)?;
        let input = CastBallotInput::new(voter.user.id, &args.votes[i % args.votes.len()]);

        join_set.spawn(async move {
            controller
                .cast_ballot(&caller, &code, story_id, input)
                .await
        });
    }

    let mut auto_reveal = None;
    while let Some(result) = join_set.join_next().await {
        let outcome = result.context("ballot task panicked")??;
        if outcome.auto_revealed.is_some() {
            auto_reveal = outcome.auto_revealed;
        }
    }

    let auto_revealed = auto_reveal.is_some();
    let reveal = match auto_reveal {
        Some(reveal) => reveal,
        None => controller.reveal(&moderator.caller, &code).await?,
    };

    let story = match reveal.recommended_estimate() {
        Some(estimate) => {
            controller
                .finalize(&moderator.caller, &code, story_id, estimate, None)
                .await?
        }
        None => {
            warn!("Story {} revealed without ballots, left unfinalized", story_id);
            story
        }
    };

    let mut published = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        published.push(envelope.event.name().to_string());
    }

    Ok(SimulationReport {
        session_code: code,
        sizing: moderator.session.sizing.display_name().to_string(),
        voters: voters.len(),
        auto_revealed,
        reveal,
        story,
        events: published,
    })
}

/// Human-readable round summary
pub fn format_summary(report: &SimulationReport) -> String {
    let stats = &report.reveal.statistics;
    let mut output = String::new();

    output.push_str(&format!(
        "Session {} ({}, {} voters)\n",
        report.session_code, report.sizing, report.voters
    ));
    output.push_str(&format!(
        "Story {}: {}\n",
        report.story.id, report.story.title
    ));
    output.push_str(&format!(
        "Revealed: {}\n\n",
        if report.auto_revealed {
            "automatically"
        } else {
            "by moderator"
        }
    ));

    output.push_str("Distribution:\n");
    for (estimate, count) in stats.distribution.iter() {
        output.push_str(&format!("  {:>6}  {}\n", estimate, "#".repeat(count)));
    }
    output.push('\n');

    let float = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.2}", v));
    output.push_str(&format!("Average:   {}\n", float(stats.average)));
    output.push_str(&format!(
        "Median:    {}\n",
        stats.median.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("Std dev:   {}\n", float(stats.std_deviation)));
    output.push_str(&format!(
        "Mode:      {}\n",
        stats.mode.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "Consensus: {}\n\n",
        if stats.consensus { "yes" } else { "no" }
    ));

    output.push_str(&format!(
        "Final estimate: {} ({})\n",
        report.story.final_estimate.as_deref().unwrap_or("-"),
        report.story.status
    ));
    output.push_str(&format!("Events: {}", report.events.join(", ")));
    output
}
