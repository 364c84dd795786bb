use simulacovid::runner::run;

fn main() -> anyhow::Result<()> {
    let outcome = run().map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
