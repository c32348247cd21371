//! The smallest useful program: two inputs and a mix.

use fluidic::board::grid::Grid;
use fluidic::runtime::session::{InputRequest, Session};
use fluidic::types::error::Result;

fn main() -> Result<()> {
    env_logger::init();

    let mut session = Session::new(Grid::rectangle(5, 9));

    let a = session.input(InputRequest::new().at((1, 1)).info("a"))?;
    let b = session.input(InputRequest::new().at((3, 1)).info("b"))?;
    let ab = session.mix(a, b)?;

    session.flush()?;

    println!(
        "{} has volume {} at {}",
        session.info(ab)?,
        session.volume(ab)?,
        session.location(ab)?
    );
    print!("{}", session.board());
    Ok(())
}
