use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use obesity_check::app::{self, App};
use obesity_check::assets;
use obesity_check::config::Config;
use obesity_check::encoder::FeatureSchema;
use obesity_check::form::Prompter;
use obesity_check::predictor::Predictor;
use obesity_check::AppError;

#[derive(Debug, Parser)]
#[command(name = "obesity-check", version, about = "Predict obesity level from lifestyle habits")]
struct Cli {
    /// TOML config file (defaults to ./obesity-check.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model bundle path
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Training CSV path
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Do not write result reports to disk
    #[arg(long, global = true)]
    no_save: bool,

    /// Seed for the random forest
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long, global = true)]
    trees: Option<usize>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Single-page form using the saved model bundle
    Form,
    /// Start, form and result pages; trains from the CSV when no cached model exists
    Wizard {
        #[arg(long, value_enum, default_value_t = SchemaArg::Compact)]
        schema: SchemaArg,
    },
    /// Train a model from the CSV and save it as the model bundle
    Train {
        #[arg(long, value_enum, default_value_t = SchemaArg::Full)]
        schema: SchemaArg,
        /// Also delete models cached by dataset hash
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SchemaArg {
    Full,
    Compact,
}

impl From<SchemaArg> for FeatureSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Full => FeatureSchema::Full,
            SchemaArg::Compact => FeatureSchema::Compact,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.model {
        config.model_path = path.clone();
    }
    if let Some(path) = &cli.data {
        config.dataset_path = path.clone();
    }
    if let Some(dir) = &cli.results_dir {
        config.results_dir = dir.clone();
    }
    if cli.no_save {
        config.save_results = false;
    }
    if cli.seed.is_some() {
        config.forest.seed = cli.seed;
    }
    if let Some(trees) = cli.trees {
        config.forest.n_trees = trees;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli)?;
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    match cli.command.unwrap_or(Command::Wizard {
        schema: SchemaArg::Compact,
    }) {
        Command::Train { schema, force } => {
            app::train(&config, schema.into(), force, prompter.output()).map(|_| ())
        }
        Command::Form => match app::load_saved_model(&config, prompter.output())? {
            Some(bundle) => App::new(&config, Predictor::new(bundle)).run_form(&mut prompter),
            None => Ok(()),
        },
        Command::Wizard { schema } => {
            println!("Preparing model from {} ...", config.dataset_path.display());
            let bundle = assets::load_or_train(&config, schema.into())?;
            App::new(&config, Predictor::new(bundle))
                .run_wizard(&mut prompter)
                .map(|_| ())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => Ok(()),
        Err(AppError::InputClosed) => {
            println!();
            println!("Input closed, exiting.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
