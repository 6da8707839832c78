// ========================================================================================
//
//                        THE STRATEGIC ORCHESTRATOR: CLAIMCAST
//
// ========================================================================================
//
// The binary entry point. Its sole responsibility is lifecycle: parse the
// command line, load the trained artifact exactly once, and hand an immutable
// reference to whichever front end the user asked for. The artifact is never
// reloaded per request, and a load failure is fatal before any form is
// served.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use claimcast::batch::score_csv;
use claimcast::form::FormSession;
use claimcast::model::ClaimModel;

#[derive(Args)]
pub struct PredictArgs {
    /// Path to the trained model artifact (.toml)
    #[arg(long)]
    pub model: PathBuf,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Path to input CSV with age,sex,height,height_unit,weight,bmi,children,smoker,region columns
    pub input: PathBuf,

    /// Path to the trained model artifact (.toml)
    #[arg(long)]
    pub model: PathBuf,

    /// Path for the estimates CSV
    #[arg(long, default_value = "estimates.csv")]
    pub output: PathBuf,
}

#[derive(Parser)]
#[command(
    name = "claimcast",
    about = "Insurance claim amount estimation from personal attributes",
    long_about = "Estimates insurance claim amounts by encoding personal attributes \
                 into the feature vector a pre-trained gradient-boosted regression \
                 model was fitted against."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive estimation form
    #[command(about = "Run the interactive estimation form on the terminal")]
    Predict(PredictArgs),

    /// Score a CSV of raw-input records
    #[command(about = "Score raw-input records from a CSV (outputs: estimates.csv)")]
    Batch(BatchArgs),

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

pub fn predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let model = load_model(&args.model)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    FormSession::new(&model, stdin.lock(), stdout.lock()).run()?;
    Ok(())
}

pub fn batch(args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let model = load_model(&args.model)?;

    println!("Scoring records from: {}", args.input.display());
    let count = score_csv(&model, &args.input, &args.output)?;
    println!(
        "Estimates for {count} records saved to: {}",
        args.output.display()
    );
    Ok(())
}

/// The single startup load. A corrupt or missing artifact fails here, with
/// the form never served.
fn load_model(path: &PathBuf) -> Result<ClaimModel, Box<dyn std::error::Error>> {
    println!("Loading model from: {}", path.display());
    let model = ClaimModel::load(path)?;
    println!(
        "Model expects {} features ({} trees)",
        model.config.num_features,
        model.trees.len()
    );
    Ok(model)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Predict(args)) => predict(args),
        Some(Commands::Batch(args)) => batch(args),
        Some(Commands::Version) => {
            println!("claimcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
