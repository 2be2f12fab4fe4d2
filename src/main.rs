mod cli;
mod core;
mod modules;
mod report;

fn main() -> anyhow::Result<()> {
    cli::run::entry()
}
