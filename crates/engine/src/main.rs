//! Courier Engine - headless queue scenario.
//!
//! Loads configuration, seeds one session with sample letters, runs a scripted
//! day of queue operations, and prints the final state as JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_domain::{
    ClockSnapshot, Currency, DeadlineImpact, Letter, LetterSize, PhysicalProperty, QueueOperation,
    QueueOperationResult, RemovalReason, SessionId, TimeBlock, TokenBalances,
};
use courier_engine::infrastructure::clock::GameClock;
use courier_engine::infrastructure::config::load_dotenv_from_repo_root;
use courier_engine::infrastructure::event_sink::TracingEventSink;
use courier_engine::use_cases::queue::DroppedLetter;
use courier_engine::{EngineConfig, QueueSession, SessionRegistry};

/// Hours the scripted errand takes after the morning's queue work.
const ERRAND_HOURS: u32 = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepReport {
    operation: QueueOperation,
    success: bool,
    failure_reason: Option<String>,
    tokens_spent: BTreeMap<Currency, u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DroppedReport {
    position: usize,
    sender: String,
    reason: RemovalReason,
    penalty: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueLine {
    position: usize,
    sender: String,
    recipient: String,
    currency: Currency,
    deadline: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioReport {
    session_id: SessionId,
    steps: Vec<StepReport>,
    projection: DeadlineImpact,
    dropped: Vec<DroppedReport>,
    clock: ClockSnapshot,
    date: String,
    balances: TokenBalances,
    queue_summary: Vec<QueueLine>,
    final_queue: Vec<Option<Letter>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Courier Engine scenario");

    let config = EngineConfig::from_env().context("loading engine configuration")?;
    tracing::info!(
        capacity = config.queue_capacity,
        start_day = config.start_day,
        start_hour = config.start_hour,
        starting_tokens = config.starting_tokens,
        "Configuration loaded"
    );

    let clock = Arc::new(GameClock::starting_at(config.start_day, config.start_hour));
    let events = Arc::new(TracingEventSink::new());
    let session = QueueSession::from_config(&config, clock.clone(), events)
        .context("creating queue session")?;

    let registry = SessionRegistry::new();
    let session_id = registry.insert(session);

    let report = registry
        .with_session(session_id, |session| run_scenario(session, &clock))
        .await
        .context("scenario session disappeared from registry")??;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing scenario report")?
    );
    Ok(())
}

fn run_scenario(session: &mut QueueSession, clock: &GameClock) -> anyhow::Result<ScenarioReport> {
    for letter in sample_letters() {
        if let Err(violation) = session.add_letter(letter) {
            tracing::warn!(reason = %violation, "Sample letter not queued");
        }
    }

    // Queue work starts at dawn so the free swap is available.
    let wait = clock.hours_until(TimeBlock::Dawn);
    if wait > 0 {
        let overnight = session.project_deadline_impact(wait);
        clock.advance_hours(wait);
        session.process_daily_deadlines(overnight.days_advanced);
    }

    let preview = session.preview(&QueueOperation::SkipDeliver { position: 4 });
    tracing::info!(
        cost = ?preview.token_costs,
        valid = preview.is_valid(),
        affordable = session.can_perform(&QueueOperation::SkipDeliver { position: 4 }),
        "Previewed skip-delivery from position 4"
    );

    let script = vec![
        QueueOperation::MorningSwap { first: 1, second: 3 },
        QueueOperation::MorningSwap { first: 2, second: 4 },
        QueueOperation::PriorityMove { from: 4 },
        QueueOperation::ExtendDeadline { position: 2 },
        QueueOperation::Deliver,
        QueueOperation::SkipDeliver { position: 3 },
        QueueOperation::Reorder { from: 1, to: 3 },
        QueueOperation::Purge {
            payment: BTreeMap::from([(Currency::Shadow, 3)]),
        },
    ];

    let mut steps = Vec::with_capacity(script.len());
    for operation in script {
        let result = session
            .execute(operation.clone())
            .with_context(|| format!("executing {}", operation.kind()))?;
        steps.push(step_report(operation, result));
    }

    // A patron's summons jumps the line and pushes everyone else back.
    let summons = Letter::new("Duke Ormond", "Courier", Currency::Status, 2, 10)
        .generated("leverage summons");
    let mut dropped: Vec<DroppedReport> = match session.add_letter_displacing(summons, 2) {
        Ok(overflow) => overflow.into_iter().map(dropped_report).collect(),
        Err(violation) => {
            tracing::warn!(reason = %violation, "Summons not queued");
            Vec::new()
        }
    };

    let projection = session.project_deadline_impact(ERRAND_HOURS);
    if projection.has_expirations() {
        tracing::warn!(
            hours = ERRAND_HOURS,
            expiring = projection.affected_letters.len(),
            "Errand will let letters expire"
        );
    }

    let reading = clock.advance_hours(ERRAND_HOURS);
    dropped.extend(
        session
            .process_daily_deadlines(projection.days_advanced)
            .into_iter()
            .map(dropped_report),
    );

    let final_queue = session.snapshot();
    Ok(ScenarioReport {
        session_id: session.id(),
        steps,
        projection,
        dropped,
        date: reading.display_date(),
        clock: reading,
        balances: session.balances(),
        queue_summary: queue_summary(&final_queue),
        final_queue,
    })
}

fn dropped_report(dropped: DroppedLetter) -> DroppedReport {
    let DroppedLetter {
        position,
        letter,
        reason,
        penalty,
    } = dropped;
    DroppedReport {
        position,
        sender: letter.sender_name().to_string(),
        reason,
        penalty,
    }
}

fn queue_summary(slots: &[Option<Letter>]) -> Vec<QueueLine> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            slot.as_ref().map(|letter| QueueLine {
                position: index + 1,
                sender: letter.sender_name().to_string(),
                recipient: letter.recipient_name().to_string(),
                currency: letter.currency_type(),
                deadline: letter.deadline_description(),
            })
        })
        .collect()
}

fn step_report(operation: QueueOperation, result: QueueOperationResult) -> StepReport {
    StepReport {
        operation,
        success: result.success,
        failure_reason: result.failure_reason.map(|reason| reason.to_string()),
        tokens_spent: result.tokens_spent,
    }
}

fn sample_letters() -> Vec<Letter> {
    vec![
        Letter::new("Elena", "Lord Aldric", Currency::Trust, 3, 12)
            .with_description("A sealed plea for help"),
        Letter::new("Marcus", "Harbor Master", Currency::Commerce, 1, 8)
            .with_size(LetterSize::Small),
        Letter::new("Lady Vera", "Magistrate", Currency::Status, 4, 15)
            .with_physical_property(PhysicalProperty::Valuable),
        Letter::new("The Broker", "Unknown", Currency::Shadow, 2, 20)
            .with_physical_property(PhysicalProperty::Fragile)
            .generated("debt obligation"),
        Letter::new("Bertram", "Garrick", Currency::Commerce, 5, 6),
        Letter::new("Patron", "Self", Currency::Status, Letter::NO_DEADLINE, 0)
            .with_size(LetterSize::Tiny),
    ]
}
