//! The `trialkit match` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::Instant;

use trialkit_core::advance::Pending;
use trialkit_core::catalog::load_catalog;
use trialkit_core::matching::{
    builtin_nouns, FeedbackDelays, MatchMode, MatchingConfig, MatchingGame, Selection, Transition,
};
use trialkit_store::load_config_from;

use super::make_rng;
use crate::input::{next_input, schedule, Input};

const HELP: &str =
    "Pick a number (or type a label). n new round, m switch mode, s <n> array size, r reset, q quit";

pub async fn execute(
    mode: String,
    array_size: Option<usize>,
    rounds: Option<u32>,
    builtin: bool,
    seed: Option<u64>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let mode: MatchMode = mode.parse().map_err(anyhow::Error::msg)?;
    let items = if builtin {
        builtin_nouns()
    } else {
        load_catalog(&config.targets)
            .with_context(|| format!("failed to load catalog {}", config.targets.display()))?
    };

    let game_config = MatchingConfig {
        array_size: array_size.unwrap_or(config.array_size),
        mode,
        policy: config.match_policy,
        delays: FeedbackDelays {
            after_correct: Duration::from_millis(config.correct_delay_ms),
            after_error: Duration::from_millis(config.correction_delay_ms),
        },
    };
    let mut game = MatchingGame::new(items, game_config)?;
    let mut rng = make_rng(seed);

    println!("{HELP}");
    game.new_round(&mut rng)?;
    show_round(&game);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    play(&mut game, &mut lines, &mut rng, rounds).await?;

    let tally = game.tally();
    println!(
        "\nTrials: {} | Correct: {} | Incorrect: {} | Accuracy: {}%",
        tally.trials,
        tally.correct,
        tally.incorrect,
        tally.accuracy_percent()
    );
    Ok(())
}

fn show_round(game: &MatchingGame) {
    let (Some(trial), Some(prompt)) = (game.current(), game.prompt()) else {
        return;
    };
    println!("\n{prompt}");
    if game.config().mode == MatchMode::Expressive {
        println!("  picture: {}", trial.exemplar);
    }
    for (n, option) in trial.options.iter().enumerate() {
        println!("  {}) {} [{}]", n + 1, option.label, option.exemplar);
    }
    println!("  {}", game.config().mode.therapist_note(&trial.item_label));
}

/// Resolve an answer to an option id: a 1-based number or a label.
fn chosen_id(game: &MatchingGame, answer: &str) -> Option<String> {
    let trial = game.current()?;
    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| trial.options.get(i))
            .map(|o| o.item_id.clone());
    }
    trial
        .options
        .iter()
        .find(|o| o.label.eq_ignore_ascii_case(answer) || o.item_id.eq_ignore_ascii_case(answer))
        .map(|o| o.item_id.clone())
}

fn apply_transition<R: Rng + ?Sized>(
    game: &mut MatchingGame,
    pending: &Pending<Transition>,
    rng: &mut R,
) -> Result<()> {
    if game.apply(pending, rng)? {
        if pending.kind == Transition::Unlock {
            println!("  Try again.");
        }
        show_round(game);
    }
    Ok(())
}

async fn play<B, R>(
    game: &mut MatchingGame,
    lines: &mut Lines<B>,
    rng: &mut R,
    rounds: Option<u32>,
) -> Result<()>
where
    B: AsyncBufRead + Unpin,
    R: Rng + ?Sized,
{
    let mut pending: Option<(Pending<Transition>, Instant)> = None;

    loop {
        let line = match next_input(lines, pending.as_ref().map(|(_, at)| *at)).await? {
            Input::Elapsed => {
                if let Some((p, _)) = pending.take() {
                    apply_transition(game, &p, rng)?;
                }
                continue;
            }
            Input::Closed => break,
            Input::Line(line) => line,
        };

        let lower = line.to_lowercase();
        let mut words = lower.split_whitespace();
        match words.next() {
            None => {}
            Some("q") => break,
            Some("?") | Some("h") => println!("{HELP}"),
            Some("n") => {
                pending = None;
                game.new_round(rng)?;
                show_round(game);
            }
            Some("r") => {
                game.reset_tally();
                println!("Tally reset.");
            }
            Some("m") => {
                let mode = match game.config().mode {
                    MatchMode::Receptive => MatchMode::Expressive,
                    MatchMode::Expressive => MatchMode::Receptive,
                };
                game.set_mode(mode);
                println!("Mode: {mode}");
                show_round(game);
            }
            Some("s") => match words.next().map(str::parse::<usize>) {
                Some(Ok(size)) => match game.set_array_size(size) {
                    Ok(()) => println!("Array size {size} from the next round."),
                    Err(e) => println!("{e}"),
                },
                _ => println!("Usage: s <array size>"),
            },
            Some(_) => {
                let Some(id) = chosen_id(game, line.trim()) else {
                    println!("Not an option. {HELP}");
                    continue;
                };
                match game.select(&id) {
                    Selection::Ignored => println!("  (wait for the next round)"),
                    Selection::Scored { pending: p, .. } => {
                        if let Some(entry) = game.log().last() {
                            println!("{entry}");
                        }
                        if rounds.is_some_and(|limit| game.tally().trials >= limit) {
                            break;
                        }
                        if p.delay.is_zero() {
                            apply_transition(game, &p, rng)?;
                            pending = None;
                        } else {
                            pending = Some(schedule(p));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
