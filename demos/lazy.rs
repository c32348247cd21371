//! Laziness in action: nothing touches the board until a flush or an
//! attribute read forces realization.

use fluidic::board::grid::Grid;
use fluidic::runtime::session::{InputRequest, Session};
use fluidic::types::error::Result;

fn main() -> Result<()> {
    env_logger::init();

    let mut session = Session::new(Grid::rectangle(5, 9));

    let a = session.input(InputRequest::new().at((1, 1)).info("a"))?;
    let b = session.input(InputRequest::new().at((3, 1)).info("b"))?;
    let c = session.input(InputRequest::new().at((4, 3)).info("c"))?;

    let ab = session.mix(a, b)?;
    let (ab1, ab2) = session.split(ab)?;
    let abc = session.mix(ab1, c)?;
    let ababc = session.mix(abc, ab2)?;

    println!("queued {} commands; board is still empty:", session.pending_commands());
    print!("{}", session.board());

    // reading an attribute realizes the whole dependency chain
    println!("result lives at {}", session.location(ababc)?);
    println!("info: {}", session.info(ababc)?);
    print!("{}", session.board());
    Ok(())
}
