//! The `trialkit drill` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::Instant;

use trialkit_core::advance::Pending;
use trialkit_core::catalog::load_catalog;
use trialkit_core::controller::{AutoAdvance, DrillController, Phase, Response, StartRequest};
use trialkit_core::engine::TrialConfig;
use trialkit_core::model::{Deck, Outcome};
use trialkit_core::session::Step;
use trialkit_core::statistics::compute_summary;
use trialkit_report::{write_csv, write_html_report, ExportError, ImportedSession};
use trialkit_store::{
    load_config_from, load_missed_set, load_settings, save_missed_set, save_settings,
    JsonFileStore, Settings,
};

use super::make_rng;
use super::stats::print_summary;
use crate::input::{next_input, schedule, Input};

const HELP: &str =
    "Keys: c/z correct, x/i incorrect, n next, b back, e end, r <n> c|x rescore trial n";

/// Options collected from the command line.
pub struct DrillArgs {
    pub client: Option<String>,
    pub decks: Option<String>,
    pub set_size: Option<usize>,
    /// `None` falls back to the saved setting.
    pub generalization: Option<bool>,
    pub shuffle_exemplars: Option<bool>,
    pub missed: bool,
    pub save_missed: bool,
    pub html: bool,
    pub export: bool,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
}

fn parse_decks(list: &str) -> Result<Vec<Deck>> {
    let mut decks = Vec::new();
    for name in list.split(',').filter(|s| !s.trim().is_empty()) {
        let deck: Deck = name.parse().map_err(anyhow::Error::msg)?;
        if !decks.contains(&deck) {
            decks.push(deck);
        }
    }
    Ok(decks)
}

pub async fn execute(args: DrillArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let items = load_catalog(&config.targets)
        .with_context(|| format!("failed to load catalog {}", config.targets.display()))?;
    let mut store = JsonFileStore::open(&config.store_path)?;

    let saved = load_settings(&store);
    let decks = match &args.decks {
        Some(list) => parse_decks(list)?,
        None => saved.decks.clone(),
    };
    let set_size = args
        .set_size
        .or_else(|| saved.set_size_value())
        .unwrap_or(TrialConfig::default().set_size);
    let client = args.client.unwrap_or(saved.client_name);
    let trials = TrialConfig {
        set_size,
        generalization: args.generalization.unwrap_or(saved.generalization),
        shuffle_exemplars: args.shuffle_exemplars.unwrap_or(saved.shuffle_exemplars),
    };

    save_settings(
        &mut store,
        &Settings {
            client_name: client.clone(),
            set_size: set_size.to_string(),
            generalization: trials.generalization,
            shuffle_exemplars: trials.shuffle_exemplars,
            decks: decks.clone(),
        },
    )?;

    let missed_ids = args.missed.then(|| load_missed_set(&store));
    let request = StartRequest {
        client,
        decks,
        trials,
        missed_ids,
    };

    let mut controller = DrillController::new(items, config.drill_policy)
        .with_advance_delay(Duration::from_millis(config.drill_advance_delay_ms));
    controller.open_setup()?;
    let mut rng = make_rng(args.seed);
    let session = controller.start(request, &mut rng)?;
    println!(
        "Session {} | {} trials{}",
        session.session_id,
        session.len(),
        if session.config.from_missed_set {
            " from the saved missed set"
        } else {
            ""
        }
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    run_session(&mut controller, &mut lines).await?;

    if controller.phase() == Phase::Running {
        controller.end()?;
    }
    let Some(session) = controller.session() else {
        return Ok(());
    };

    let summary = compute_summary(session);
    println!();
    print_summary(&summary);

    if args.save_missed {
        save_missed_set(&mut store, &summary.missed_ids())?;
        println!(
            "Saved {} missed concepts for next session.",
            summary.missed.len()
        );
    }

    if args.export {
        match write_csv(session, &config.output_dir, Utc::now().date_naive()) {
            Ok(path) => {
                println!("Exported {}", path.display());
                if args.html {
                    let html_path = path.with_extension("html");
                    write_html_report(&ImportedSession::from(session), &summary, &html_path)?;
                    println!("Wrote {}", html_path.display());
                }
            }
            Err(ExportError::NothingToExport) => {
                println!("No scored trials found yet. Make at least one response to export.");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn show_trial(controller: &DrillController) {
    let Some(session) = controller.session() else {
        return;
    };
    let Some(trial) = session.current_trial() else {
        return;
    };
    println!(
        "\n[{}/{}] {} | {}",
        session.cursor + 1,
        session.len(),
        trial.deck,
        trial.sd_text()
    );
    println!(
        "  {} ({}/{}) {}",
        trial.item_label, trial.exemplar_index, trial.exemplar_total, trial.exemplar
    );
    if let Some(record) = session.result_at(session.cursor) {
        println!("  recorded: {}", record.outcome);
    }
}

/// Drive a running session from line input until it ends or input closes.
async fn run_session<R>(controller: &mut DrillController, lines: &mut Lines<R>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut pending: Option<(Pending<AutoAdvance>, Instant)> = None;
    show_trial(controller);

    while controller.phase() == Phase::Running {
        let line = match next_input(lines, pending.as_ref().map(|(_, at)| *at)).await? {
            Input::Elapsed => {
                if let Some((p, _)) = pending.take() {
                    if controller.apply_advance(&p).is_some() {
                        show_trial(controller);
                    }
                }
                continue;
            }
            Input::Closed => break,
            Input::Line(line) => line,
        };

        let lower = line.to_lowercase();
        if let Some((index, outcome)) = parse_rescore(&lower) {
            if controller.record_at(index, outcome, Utc::now()) {
                println!("  trial {} recorded: {outcome}", index + 1);
            } else {
                println!("  No trial {}.", index + 1);
            }
            continue;
        }

        match lower.as_str() {
            "c" | "z" => pending = respond(controller, Outcome::Correct)?,
            "x" | "i" => pending = respond(controller, Outcome::Incorrect)?,
            "n" => {
                pending = None;
                if controller.next()? != Step::Finished {
                    show_trial(controller);
                }
            }
            "b" => {
                pending = None;
                controller.back()?;
                show_trial(controller);
            }
            "e" => {
                pending = None;
                controller.end()?;
            }
            "" => {}
            "?" | "h" => println!("{HELP}"),
            other => println!("Unknown key '{other}'. {HELP}"),
        }
    }

    Ok(())
}

/// `r <n> c|x` scores trial `n` (1-based) without moving the cursor.
fn parse_rescore(line: &str) -> Option<(usize, Outcome)> {
    let mut words = line.split_whitespace();
    if words.next()? != "r" {
        return None;
    }
    let index = words.next()?.parse::<usize>().ok()?.checked_sub(1)?;
    let outcome = match words.next()? {
        "c" | "z" => Outcome::Correct,
        "x" | "i" => Outcome::Incorrect,
        _ => return None,
    };
    words.next().is_none().then_some((index, outcome))
}

fn respond(
    controller: &mut DrillController,
    outcome: Outcome,
) -> Result<Option<(Pending<AutoAdvance>, Instant)>> {
    match controller.respond(outcome, Utc::now())? {
        Response::Advanced(Step::Finished) => Ok(None),
        Response::Advanced(_) => {
            show_trial(controller);
            Ok(None)
        }
        Response::Repeat => {
            println!("  Try again.");
            show_trial(controller);
            Ok(None)
        }
        Response::Scheduled(pending) => Ok(Some(schedule(pending))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use trialkit_core::advance::CorrectionPolicy;
    use trialkit_core::model::Item;

    fn items() -> Vec<Item> {
        ["cup", "ball", "hat"]
            .into_iter()
            .map(|id| Item {
                id: id.into(),
                label: id.into(),
                deck: Deck::Nouns,
                exemplars: vec![format!("assets/{id}.png")],
                prompt_object: None,
            })
            .collect()
    }

    fn started(policy: CorrectionPolicy) -> DrillController {
        let mut controller = DrillController::new(items(), policy);
        controller.open_setup().unwrap();
        let request = StartRequest {
            client: "Sam".into(),
            decks: vec![Deck::Nouns],
            trials: TrialConfig {
                set_size: 3,
                ..Default::default()
            },
            missed_ids: None,
        };
        controller.start(request, &mut make_rng(Some(1))).unwrap();
        controller
    }

    #[test]
    fn parse_deck_list() {
        assert_eq!(
            parse_decks("nouns, Actions,nouns").unwrap(),
            vec![Deck::Nouns, Deck::Actions]
        );
        assert!(parse_decks("nouns,animals").is_err());
        assert!(parse_decks("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn keys_drive_the_session() {
        let mut controller = started(CorrectionPolicy::AlwaysAdvance);
        let mut lines = BufReader::new(&b"c\nb\nx\nn\nc\n"[..]).lines();
        run_session(&mut controller, &mut lines).await.unwrap();

        assert_eq!(controller.phase(), Phase::Summary);
        let summary = controller.summary().unwrap();
        // back + re-score overwrote the first trial
        assert_eq!(summary.total, 2);
        assert_eq!(summary.correct, 1);
    }

    #[test]
    fn parse_rescore_commands() {
        assert_eq!(parse_rescore("r 3 x"), Some((2, Outcome::Incorrect)));
        assert_eq!(parse_rescore("r 1 z"), Some((0, Outcome::Correct)));
        assert_eq!(parse_rescore("r 0 c"), None);
        assert_eq!(parse_rescore("r 2"), None);
        assert_eq!(parse_rescore("r 2 c extra"), None);
        assert_eq!(parse_rescore("c"), None);
    }

    #[tokio::test]
    async fn rescore_leaves_the_cursor_alone() {
        let mut controller = started(CorrectionPolicy::AlwaysAdvance);
        let mut lines = BufReader::new(&b"r 3 x\nr 9 c\n"[..]).lines();
        run_session(&mut controller, &mut lines).await.unwrap();

        let session = controller.session().unwrap();
        assert_eq!(session.cursor, 0);
        assert_eq!(session.answered_count(), 1);
        assert_eq!(
            session.result_at(2).map(|r| r.outcome),
            Some(Outcome::Incorrect)
        );
    }

    #[tokio::test]
    async fn repeat_policy_keeps_the_trial() {
        let mut controller = started(CorrectionPolicy::RepeatOnError);
        let mut lines = BufReader::new(&b"x\nc\n"[..]).lines();
        run_session(&mut controller, &mut lines).await.unwrap();

        let session = controller.session().unwrap();
        assert_eq!(session.cursor, 1);
        assert_eq!(session.answered_count(), 1);
        assert_eq!(controller.phase(), Phase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_advance_fires_after_delay() {
        let mut controller = started(CorrectionPolicy::AlwaysAdvance)
            .with_advance_delay(Duration::from_millis(650));
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(b"c\n").await.unwrap();
        let driver = run_session(&mut controller, &mut lines);
        let closer = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(writer);
        };
        let (result, ()) = tokio::join!(driver, closer);
        result.unwrap();

        assert_eq!(controller.session().unwrap().cursor, 1);
    }
}
