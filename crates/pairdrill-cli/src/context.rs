//! Deck selection arguments and the state every interactive mode works on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pairdrill_core::config::{load_config_from, TrainerConfig};
use pairdrill_core::loader::{discover_default_deck, load_deck, LoadOptions};
use pairdrill_core::mistakes::MistakeBook;
use pairdrill_core::model::Deck;
use pairdrill_core::normalize::Matcher;

/// Which deck to open and how to read it.
#[derive(Args, Debug, Clone)]
pub struct DeckArgs {
    /// Deck file (.csv/.tsv/.txt/.json/.xlsx/.xlsm/.docx); defaults to dict.* in the current directory
    pub deck: Option<PathBuf>,

    /// 1-based column holding A
    #[arg(long, default_value = "1")]
    pub col: usize,

    /// 1-based column holding B (default: the column after A)
    #[arg(long)]
    pub col_b: Option<usize>,

    /// Field separator for delimited text (`\t` for tab); sniffed when omitted
    #[arg(long)]
    pub sep: Option<String>,

    /// Treat the first row as headers
    #[arg(long)]
    pub header: bool,

    /// Worksheet name for .xlsx/.xlsm files
    #[arg(long)]
    pub sheet: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed the random generator for a reproducible session
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for DeckArgs {
    fn default() -> Self {
        Self {
            deck: None,
            col: 1,
            col_b: None,
            sep: None,
            header: false,
            sheet: None,
            config: None,
            seed: None,
        }
    }
}

impl DeckArgs {
    pub fn load_options(&self) -> Result<LoadOptions> {
        anyhow::ensure!(self.col >= 1, "--col is 1-based and must be at least 1");
        if let Some(b) = self.col_b {
            anyhow::ensure!(b >= 1, "--col-b is 1-based and must be at least 1");
            anyhow::ensure!(b != self.col, "--col and --col-b must differ");
        }
        Ok(LoadOptions {
            column_a: self.col - 1,
            column_b: self.col_b.map(|b| b - 1),
            delimiter: self.sep.as_deref().map(parse_separator).transpose()?,
            has_header: self.header,
            sheet: self.sheet.clone(),
        })
    }

    /// The explicit deck path, or the first `dict.*` in the current directory.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        self.deck
            .clone()
            .or_else(|| discover_default_deck(Path::new(".")))
    }
}

/// `\t` (typed literally) or `tab` mean a tab; anything else must be one
/// ASCII character.
pub fn parse_separator(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "\t" | "tab" | "TAB" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => anyhow::bail!("separator must be a single ASCII character, got '{s}'"),
    }
}

/// The loaded deck with its mistake book and settings.
pub struct Trainer {
    pub config: TrainerConfig,
    pub deck: Deck,
    pub book: MistakeBook,
    pub rng: StdRng,
}

impl Trainer {
    /// Load config, then the requested deck (or a discovered one, or the
    /// built-in sample), then its mistake book.
    pub fn open(args: &DeckArgs) -> Result<Self> {
        let config = load_config_from(args.config.as_deref())?;
        let opts = args.load_options()?;

        let deck = match args.resolve_path() {
            Some(path) => load_deck(&path, &opts)
                .with_context(|| format!("failed to load deck: {}", path.display()))?,
            None => {
                tracing::debug!("no deck file found, using the built-in sample");
                Deck::builtin()
            }
        };

        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self::with_deck(config, deck, rng))
    }

    pub fn with_deck(config: TrainerConfig, deck: Deck, rng: StdRng) -> Self {
        let book = MistakeBook::open(&config.data_dir, &deck.id());
        Self {
            config,
            deck,
            book,
            rng,
        }
    }

    /// Replace the deck and open the matching mistake book.
    pub fn switch_deck(&mut self, deck: Deck) {
        self.book = MistakeBook::open(&self.config.data_dir, &deck.id());
        self.deck = deck;
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.config.ignore_case)
    }
}
