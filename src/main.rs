//! # Delve Demo Entry Point
//!
//! Headless driver for the puzzle core: auto-places random minos onto a
//! field, reports stick counts and illumination, and dumps the resulting
//! maze with a pair of sample route queries.

use clap::Parser;
use delve::{config, Direction, Field, Mino, PathFinder, Position, ShapeType};
use delve::{DelveError, DelveResult};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Command line arguments for the Delve demo.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Dungeon-building block puzzle core demo")]
#[command(version)]
struct Args {
    /// Random seed for piece generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Field width in cells
    #[arg(long, default_value_t = config::DEFAULT_FIELD_WIDTH)]
    width: i32,

    /// Nominal field height in cells
    #[arg(long, default_value_t = config::DEFAULT_FIELD_HEIGHT)]
    height: i32,

    /// Number of pick slots
    #[arg(long, default_value_t = config::DEFAULT_PICK_SLOT_COUNT)]
    slots: usize,

    /// Maximum number of turns to simulate
    #[arg(long, default_value_t = 24)]
    turns: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&args.log_level),
    )
    .init();

    let seed = args.seed.unwrap_or(12345);
    info!("Starting Delve demo v{} with seed {}", delve::VERSION, seed);

    let mut rng = StdRng::seed_from_u64(seed);
    let start = Position::new(args.width / 2, 1);
    let mut field = Field::new(args.width, args.height, start, args.slots, &mut rng)?;
    let mut finder = PathFinder::new(args.width, args.height);

    // Content policy lives out here, not in the field: the key drops once
    // the floor is 30% built, heal items occasionally afterwards.
    let mut key_placed = false;

    let mut placed = 0;
    let mut failed_turns = 0;
    for turn in 0..args.turns {
        let slot = rng.gen_range(0..args.slots);
        field.pick_mino(slot)?;

        // A small share of picks is abandoned, exercising the release path.
        if rng.gen_bool(0.1) {
            field.release_mino();
            respawn(&mut field, slot, &mut key_placed, &mut rng)?;
            debug!("turn {}: pick abandoned", turn);
            continue;
        }

        for _ in 0..rng.gen_range(0..4u32) {
            field.rotate_picked(slot)?;
        }
        let mino = field
            .take_picked()
            .ok_or_else(|| DelveError::InvalidState("picked mino vanished".to_string()))?;

        match find_anchor(&field, &mino, &mut rng) {
            Some(anchor) => {
                field.place(mino, anchor)?;
                placed += 1;
                field.illuminate(start);
                info!(
                    "turn {}: placed at ({}, {}), stick count {}, newly lit rows {:?}",
                    turn,
                    anchor.x,
                    anchor.y,
                    field.last_stick_count(),
                    field.newly_illuminated_rows()
                );
            }
            None => {
                failed_turns += 1;
                debug!("turn {}: no anchor fits, piece discarded", turn);
            }
        }
        respawn(&mut field, slot, &mut key_placed, &mut rng)?;

        if failed_turns >= 8 {
            info!("floor is full after {} placements", placed);
            break;
        }
    }

    info!(
        "{} pieces placed, {} of {} cells built, lit rows {:?}",
        placed,
        field.grid().occupied_count(),
        field.grid().cell_count(),
        field.illuminated_rows()
    );

    print_field(&field);
    run_sample_queries(&mut finder, &field, start, &mut rng);
    Ok(())
}

/// Refills `slot` and applies the demo's content-placement policy.
fn respawn(
    field: &mut Field,
    slot: usize,
    key_placed: &mut bool,
    rng: &mut StdRng,
) -> DelveResult<()> {
    let fill = field.grid().occupied_count() as f64 / field.grid().cell_count() as f64;
    let shape = ShapeType::random(rng);
    let drop_heal = *key_placed && rng.gen_bool(0.1);
    let mino = field.spawn_mino(slot, shape, rng)?;
    if !*key_placed && fill > 0.3 {
        mino.put_key(rng);
        *key_placed = true;
        info!("the exit key was hidden in a fresh {:?} piece", shape);
    } else if drop_heal {
        mino.put_heal_item(rng);
    }
    Ok(())
}

/// Finds a random anchor where the mino fits flush against existing blocks.
fn find_anchor(field: &Field, mino: &Mino, rng: &mut StdRng) -> Option<Position> {
    let mut anchors: Vec<Position> = (0..field.height())
        .flat_map(|y| (0..field.width()).map(move |x| Position::new(x, y)))
        .collect();
    anchors.shuffle(rng);
    anchors
        .into_iter()
        .find(|&anchor| field.can_place(mino, anchor) && touches_existing(field, mino, anchor))
}

/// Whether any cell of the mino would sit orthogonally adjacent to a
/// placed block.
fn touches_existing(field: &Field, mino: &Mino, anchor: Position) -> bool {
    mino.cells().iter().any(|cell| {
        Direction::ALL.iter().any(|dir| {
            let neighbor_offset = cell.offset + dir.delta();
            !mino.contains_offset(neighbor_offset)
                && field.get_block(anchor + neighbor_offset).is_some()
        })
    })
}

/// Dumps the maze as ASCII, top row first. `##` marks unbuilt cells; walls
/// print as `--` and `|`; `K`/`H` mark the key and heal item, `:` a lit
/// floor cell.
fn print_field(field: &Field) {
    for y in (0..field.height()).rev() {
        let mut top = String::new();
        let mut mid = String::new();
        for x in 0..field.width() {
            let pos = Position::new(x, y);
            let block = field.get_block(pos);

            let front_closed = match block {
                Some(b) => b.wall(Direction::Front),
                None => false,
            };
            top.push('+');
            top.push_str(if front_closed { "--" } else { "  " });

            let left_neighbor = field.get_block(Position::new(x - 1, y));
            let boundary = match (left_neighbor, block) {
                (None, None) => ' ',
                (Some(l), Some(b)) => {
                    if l.wall(Direction::Right) || b.wall(Direction::Left) {
                        '|'
                    } else {
                        ' '
                    }
                }
                _ => '|',
            };
            mid.push(boundary);
            mid.push_str(&match block {
                None => "##".to_string(),
                Some(b) => {
                    let glyph = if b.has_key {
                        'K'
                    } else if b.has_heal_item {
                        'H'
                    } else if b.illuminated {
                        ':'
                    } else {
                        '.'
                    };
                    format!("{}{}", glyph, glyph)
                }
            });
        }
        top.push('+');
        mid.push(match field.get_block(Position::new(field.width() - 1, y)) {
            Some(b) if b.wall(Direction::Right) => '|',
            Some(_) => ' ',
            None => ' ',
        });
        println!("{}", top);
        println!("{}", mid);
    }

    // Bottom edge: back walls of row 0.
    let mut bottom = String::new();
    for x in 0..field.width() {
        let closed = field
            .get_block(Position::new(x, 0))
            .map(|b| b.wall(Direction::Back))
            .unwrap_or(false);
        bottom.push('+');
        bottom.push_str(if closed { "--" } else { "  " });
    }
    bottom.push('+');
    println!("{}", bottom);
}

/// Runs one shortest-route and one wander query against the finished maze.
fn run_sample_queries(finder: &mut PathFinder, field: &Field, start: Position, rng: &mut StdRng) {
    let mut farthest = start;
    for y in 0..field.height() {
        for x in 0..field.width() {
            let pos = Position::new(x, y);
            if field.get_block(pos).is_some()
                && start.manhattan_distance(pos) > start.manhattan_distance(farthest)
            {
                farthest = pos;
            }
        }
    }

    match finder.shortest_route(start, farthest, field.grid()) {
        Some(route) => info!(
            "shortest route to the farthest cell ({}, {}): {} cells",
            farthest.x,
            farthest.y,
            route.len()
        ),
        None => info!(
            "the farthest cell ({}, {}) is walled off from the start",
            farthest.x, farthest.y
        ),
    }

    match finder.random_reachable_route(start, 3, field.grid(), &[], rng) {
        Some(route) => info!("sample 3-move wander route: {:?}", route),
        None => info!("nowhere to wander from the start"),
    }
}
