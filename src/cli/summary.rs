use crate::error::Result;
use crate::summary::summarize;

use super::load_with_progress;

pub fn run(archive: &str) -> Result<()> {
    let dataset = load_with_progress(archive)?;
    println!("{}", summarize(Some(&dataset)));
    Ok(())
}
