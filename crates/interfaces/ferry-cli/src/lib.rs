pub mod commands;
pub mod hooks;

use anyhow::bail;

/// Split a positional argument list into source paths and the trailing
/// destination folder: `upload <SOURCE>... <DEST>`.
pub fn split_sources_and_destination(
    mut args: Vec<String>,
) -> anyhow::Result<(Vec<String>, String)> {
    let dest = match args.pop() {
        Some(dest) => dest,
        None => bail!("Destination path must be specified"),
    };
    if args.is_empty() {
        bail!("Destination path must be specified");
    }
    Ok((args, dest))
}
