fn main() -> anyhow::Result<()> {
    gate_seal_cli::run()?;
    Ok(())
}
