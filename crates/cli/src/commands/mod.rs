mod resolve;
mod skirmish;

pub use resolve::Resolve;
pub use skirmish::Skirmish;

use anyhow::Result;
use serde::Serialize;

/// Write `value` to stdout as JSON.
pub(crate) fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
