extern crate connect_capture;

use connect_capture::game::Game;
use connect_capture::random::StandardRandomGenerator;
use connect_capture::rules::RulesSpec;
use connect_capture::search::GameSearch;

/// Each game is cut off after this many plies so the demo stays short.
const MAX_TURNS: usize = 30;

fn main() {
    env_logger::init();

    for (name, spec) in RulesSpec::presets() {
        println!("== {name}");
        let mut game = match Game::new(spec, 2, 0) {
            Ok(game) => game,
            Err(e) => {
                eprintln!("cannot start {name}: {e}");
                continue;
            }
        };

        // Wide and gravity boards get shallower searches so the demo stays quick
        let mut search = GameSearch::builder(spec, game.num_players())
            .with_random_generator(StandardRandomGenerator)
            .with_threat_bonus(true);
        if spec.board.width > 8 {
            search = search.with_depth(2);
        } else if spec.board.gravity {
            search = search.with_depth(4);
        }
        let mut search = search.build();

        while !game.is_over() && game.turn() < MAX_TURNS {
            let m = match search.choose_move(game.state()) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("search failed: {e}");
                    break;
                }
            };
            match game.apply_move(m) {
                Ok(result) if !result.captured.is_empty() => {
                    println!("captured {:?}", result.captured);
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("engine rejected {m:?}: {e}");
                    break;
                }
            }
        }

        print!("{}", game.board());
        match game.winner() {
            Some(p) => println!("player {p} wins after {} turns", game.turn()),
            None if game.is_over() => println!("draw after {} turns", game.turn()),
            None => println!("stopped undecided after {} turns", game.turn()),
        }
    }
}
