use std::path::PathBuf;
use std::process;

use chip8_vm::constants::DEFAULT_INSTRUCTIONS_PER_TICK;
use chip8_vm::{Config, Quirks};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod keymap;
mod run;

#[derive(Parser, Debug)]
#[command(
    name = "chip8",
    about = "Runs a CHIP-8 ROM headlessly, printing each new frame as text."
)]
pub struct Options {
    /// ROM image to load at 0x200.
    #[arg(value_name = "ROM")]
    pub rom: PathBuf,

    /// Use COSMAC VIP behaviour for shifts, OR/AND/XOR and FX55/FX65.
    #[arg(long)]
    pub cosmac: bool,

    /// Seed for RND; entropy from the OS when absent.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Halt after this many frames; runs until halted when absent.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Instructions executed per 60Hz frame.
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_TICK)]
    pub ipf: usize,

    /// Keyboard keys held for the whole run (1234/QWER/ASDF/ZXCV layout).
    #[arg(long, value_name = "CHARS", default_value = "")]
    pub keys: String,
}

impl Options {
    pub fn config(&self) -> Config {
        let quirks = if self.cosmac {
            Quirks::cosmac_vip()
        } else {
            Quirks::modern()
        };
        let config = Config::default()
            .with_quirks(quirks)
            .with_instructions_per_tick(self.ipf);
        match self.seed {
            Some(seed) => config.with_rng_seed(seed),
            None => config,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = Options::parse();
    if let Err(e) = run::run(options) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Options, clap::Error> {
        Options::try_parse_from(std::iter::once("chip8").chain(line.split_whitespace()))
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse("pong.ch8").unwrap();
        assert_eq!(options.rom, PathBuf::from("pong.ch8"));
        assert_eq!(options.config(), Config::default());
        assert_eq!(options.frames, None);
        assert_eq!(options.keys, "");
    }

    #[test]
    fn test_parse_all_flags() {
        let options =
            parse("--cosmac --seed 7 --frames 120 --ipf 11 --keys qw pong.ch8").unwrap();
        let config = options.config();
        assert_eq!(config.quirks, Quirks::cosmac_vip());
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.instructions_per_tick, 11);
        assert_eq!(options.frames, Some(120));
        assert_eq!(options.keys, "qw");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("pong.ch8 --frames").is_err());
        assert!(parse("pong.ch8 --frames many").is_err());
        assert!(parse("pong.ch8 --turbo").is_err());
        assert!(parse("pong.ch8 tetris.ch8").is_err());
    }
}
