use std::{env, fs};

use anyhow::{bail, Context, Result};
use itertools::Itertools;

fn main() -> Result<()> {
    let input = env::args().nth(1).context("need an input filename")?;
    let output = env::args().nth(2).context("need an output name")?;

    let source = fs::read_to_string(&input)?;

    let image = match rvasm::assemble(&source) {
        Ok(image) => image,
        Err(diagnostics) => {
            eprintln!("{}", diagnostics.iter().join("\n"));
            bail!("assembly failed with {} error(s)", diagnostics.len());
        }
    };

    for section in image.sections() {
        let path = format!("{}{}.bin", output, section.name.replace('.', "_"));
        fs::write(&path, &section.data)
            .with_context(|| format!("writing section {}", section.name))?;
    }
    fs::write(format!("{output}.map.json"), image.source_map().to_json()?)?;

    Ok(())
}
