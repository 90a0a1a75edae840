use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::io;
use std::io::{IsTerminal, Read};
use tte::effects::binarypath::{BinaryPath, BinaryPathConfig};
use tte::effects::errorcorrect::{ErrorCorrect, ErrorCorrectConfig};
use tte::effects::rain::{Rain, RainConfig};
use tte::effects::scattered::{Scattered, ScatteredConfig};
use tte::rendering::renderer::DisplayRenderer;
use tte::terminal::{Terminal, TerminalConfig};
use tte::{Effect, FrameBufWriter, install_panic_handler, run_effect, terminal_cleanup, terminal_setup};

/// Apply animated effects to text piped into stdin.
#[derive(Parser)]
#[command(name = "tte", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    terminal: TerminalConfig,

    #[command(subcommand)]
    effect: EffectCommand,
}

#[derive(Subcommand)]
enum EffectCommand {
    /// Move the characters into place from random starting locations.
    Scattered(ScatteredConfig),
    /// Some characters start in the wrong position and are corrected in sequence.
    Errorcorrect(ErrorCorrectConfig),
    /// Binary representations of each character travel towards its home coordinate.
    Binarypath(BinaryPathConfig),
    /// Characters fall into place from the top, bottom rows first.
    Rain(RainConfig),
}

impl EffectCommand {
    fn into_effect(self) -> Box<dyn Effect> {
        match self {
            EffectCommand::Scattered(config) => Box::new(Scattered::new(config)),
            EffectCommand::Errorcorrect(config) => Box::new(ErrorCorrect::new(config)),
            EffectCommand::Binarypath(config) => Box::new(BinaryPath::new(config)),
            EffectCommand::Rain(config) => Box::new(Rain::new(config)),
        }
    }
}

fn read_input() -> anyhow::Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("no input, pipe some text into tte (e.g. `ls -l | tte rain`)");
    }
    let mut input = String::new();
    stdin
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = read_input()?;
    let mut terminal = Terminal::new(&input, cli.terminal).context("failed to lay out input")?;
    let mut effect = cli.effect.into_effect();
    let mut renderer = DisplayRenderer::new_with_sink(FrameBufWriter::new());

    terminal_setup()?;
    install_panic_handler();
    let result = run_effect(effect.as_mut(), &mut terminal, &mut renderer);
    terminal_cleanup()?;

    result.context("effect failed")?;
    Ok(())
}
