//! Command-line driver for the Klondike minimum-move solver.

use anyhow::{bail, Context, Result};
use clap::Parser;
use klondike_core::{
    expand_moves, move_count, numbered_deal, solve, validate_solution, Card, CardDeck, Game,
    SolveOutcome, DEFAULT_MOVE_TREE_LIMIT,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Solve Klondike Solitaire deals for minimum moves")]
struct Args {
    /// Seed for a numbered deal
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Explicit 52-card deck, e.g. "ah 7s tc ..." (overrides --seed)
    #[arg(long)]
    deck: Option<String>,

    /// Cards drawn from the stock at a time
    #[arg(short, long, default_value_t = 1)]
    draw: u32,

    /// Times the waste pile may be recycled (unlimited if omitted)
    #[arg(short, long)]
    recycle_limit: Option<u32>,

    /// Worker threads; 0 uses all hardware threads
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Give up when the move tree outgrows this many nodes
    #[arg(long, default_value_t = DEFAULT_MOVE_TREE_LIMIT)]
    move_tree_limit: usize,

    /// Print the winning line as elementary moves
    #[arg(short, long)]
    moves: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_deck(input: &str) -> Result<CardDeck> {
    let mut cards = Vec::new();
    for token in input.split([' ', ',', '\n', '\t']).filter(|t| !t.is_empty()) {
        let card =
            Card::parse(token).with_context(|| format!("unrecognised card '{}'", token))?;
        cards.push(card);
    }
    let deck: CardDeck = cards
        .try_into()
        .map_err(|cards: Vec<Card>| anyhow::anyhow!("deck has {} cards, expected 52", cards.len()))?;
    Ok(deck)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "debug"),
        );
    } else {
        env_logger::init_from_env(
            env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
        );
    }

    let deck = match &args.deck {
        Some(input) => parse_deck(input)?,
        None => numbered_deal(args.seed),
    };
    let recycle_limit = args.recycle_limit.unwrap_or(u32::MAX);
    let game = Game::new(&deck, args.draw, recycle_limit).context("invalid deal")?;

    let deal_label = if args.deck.is_some() {
        "explicit deck".to_string()
    } else {
        format!("seed {}", args.seed)
    };
    log::info!(
        "solving {} (draw {}, recycle limit {})",
        deal_label,
        args.draw,
        args.recycle_limit
            .map_or("unlimited".to_string(), |l| l.to_string()),
    );

    let result = solve(&game, args.move_tree_limit, args.threads);

    match result.outcome {
        SolveOutcome::SolvedMinimal => {
            println!("Minimal solution: {} moves", move_count(&result.solution));
        }
        SolveOutcome::Solved => {
            println!(
                "Solution of {} moves (search truncated; may not be minimal)",
                move_count(&result.solution)
            );
        }
        SolveOutcome::Impossible => println!("Impossible: this deal cannot be won"),
        SolveOutcome::GaveUp => println!("Gave up: no solution within the move tree limit"),
    }
    println!(
        "States: {}  move tree: {}  fringe left: {}",
        result.closed_states, result.move_tree_size, result.final_fringe_size
    );

    if !result.solution.is_empty() {
        if !validate_solution(&game, &result.solution) {
            bail!("internal error: solution failed validation");
        }
        if args.moves {
            println!();
            println!("Dealt position:");
            print!("{}", game);
            println!();
            for xmove in expand_moves(&result.solution, args.draw) {
                println!(
                    "{:3}: {} -> {}{}{}",
                    xmove.move_num,
                    xmove.from.name(),
                    xmove.to.name(),
                    if xmove.n_cards > 1 {
                        format!(" x{}", xmove.n_cards)
                    } else {
                        String::new()
                    },
                    if xmove.flip { "  (flip)" } else { "" },
                );
            }
        }
    }
    Ok(())
}
