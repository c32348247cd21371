//! Built-in demo programs for the `run` subcommand. Each drives a session
//! the way a client would and returns a human-readable report.

use crate::runtime::session::{InputRequest, Session};
use crate::types::error::Result;

/// Two inputs, one mix.
pub fn simple_mix(session: &mut Session) -> Result<Vec<String>> {
    let a = session.input(InputRequest::new().at((1, 1)).info("a"))?;
    let b = session.input(InputRequest::new().at((3, 1)).info("b"))?;
    let ab = session.mix(a, b)?;
    session.flush()?;

    Ok(vec![format!(
        "mixed {} (volume {}) at {}",
        session.info(ab)?,
        session.volume(ab)?,
        session.location(ab)?
    )])
}

/// The lazy chain: mix, split, and recombine everything into one droplet.
pub fn chain(session: &mut Session) -> Result<Vec<String>> {
    let a = session.input(InputRequest::new().at((1, 1)).info("a"))?;
    let b = session.input(InputRequest::new().at((3, 1)).info("b"))?;
    let c = session.input(InputRequest::new().at((4, 3)).info("c"))?;

    let ab = session.mix(a, b)?;
    let (ab1, ab2) = session.split(ab)?;
    let abc = session.mix(ab1, c)?;
    let ababc = session.mix(abc, ab2)?;
    session.flush()?;

    Ok(vec![
        format!(
            "final droplet {} (volume {}) at {}",
            session.info(ababc)?,
            session.volume(ababc)?,
            session.location(ababc)?
        ),
        format!("droplets on board: {}", session.board().real_droplets().count()),
    ])
}

/// Five droplets in lanes, five mixes, five splits; a routing stress demo.
pub fn lanes(session: &mut Session) -> Result<Vec<String>> {
    let mut inputs = Vec::new();
    for i in 0..5 {
        inputs.push(session.input(InputRequest::new().at((0, 2 * i)))?);
    }

    let ab = session.mix(inputs[0], inputs[1])?;
    let (ab1, ab2) = session.split(ab)?;
    let cd = session.mix(inputs[2], inputs[3])?;
    let (cd1, cd2) = session.split(cd)?;
    let x = session.mix(ab1, cd1)?;
    let (x1, _x2) = session.split(x)?;
    let y = session.mix(ab2, inputs[4])?;
    let (_y1, _y2) = session.split(y)?;
    let z = session.mix(cd2, x1)?;
    let (_z1, _z2) = session.split(z)?;
    session.flush()?;

    Ok(vec![format!(
        "routed 5 lanes; droplets on board: {}",
        session.board().real_droplets().count()
    )])
}

/// Repeated mix+split of a sample against fresh stock until its
/// concentration is within `epsilon` of `target`.
pub fn dilution(session: &mut Session, target: f64, epsilon: f64) -> Result<Vec<String>> {
    let mut report = Vec::new();

    let low = session.input(InputRequest::new().concentration(0.0).info("w"))?;
    let high = session.input(InputRequest::new().concentration(1.0).info("r"))?;
    let mixed = session.mix(low, high)?;
    let (mut sample, _rest) = session.split(mixed)?;

    for round in 0..50 {
        let c = session.concentration(sample)?;
        report.push(format!("round {}: concentration {:.4}", round, c));
        if (c - target).abs() < epsilon {
            report.push(format!(
                "converged at {:.4} (target {}, epsilon {})",
                c, target, epsilon
            ));
            return Ok(report);
        }

        let stock = if c < target {
            session.input(InputRequest::new().concentration(1.0).info("r"))?
        } else {
            session.input(InputRequest::new().concentration(0.0).info("w"))?
        };
        let next = session.mix(sample, stock)?;
        let (kept, _rest) = session.split(next)?;
        sample = kept;
    }

    report.push("did not converge".to_string());
    Ok(report)
}
