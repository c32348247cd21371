//! Dilute a sample toward a target concentration by repeatedly mixing it
//! with fresh stock and splitting off half.

use fluidic::board::grid::Grid;
use fluidic::runtime::session::{InputRequest, Session};
use fluidic::types::error::Result;

const TARGET: f64 = 0.25;
const EPSILON: f64 = 0.1;

fn main() -> Result<()> {
    env_logger::init();

    let mut session = Session::new(Grid::rectangle(5, 9));

    let water = session.input(InputRequest::new().concentration(0.0).info("w"))?;
    let reagent = session.input(InputRequest::new().concentration(1.0).info("r"))?;
    let first = session.mix(water, reagent)?;
    let (mut sample, _rest) = session.split(first)?;

    for round in 0..50 {
        let c = session.concentration(sample)?;
        println!("round {}: concentration {:.4}", round, c);
        if (c - TARGET).abs() < EPSILON {
            println!("converged (target {}, epsilon {})", TARGET, EPSILON);
            break;
        }

        let stock = if c < TARGET {
            session.input(InputRequest::new().concentration(1.0).info("r"))?
        } else {
            session.input(InputRequest::new().concentration(0.0).info("w"))?
        };
        let mixed = session.mix(sample, stock)?;
        let (kept, _rest) = session.split(mixed)?;
        sample = kept;
    }

    println!("final volume: {}", session.volume(sample)?);
    Ok(())
}
