use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;

use simplexify_lang::{Input, SolveRequest};
use simplexify_solver::{SolutionStatus, Solver, Tableau};

#[derive(Parser)]
#[command(name = "simplexify")]
#[command(about = "Solve linear programs written as plain algebra", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print the result as JSON
    Solve {
        #[command(flatten)]
        problem: ProblemArgs,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// Parse and standardize a problem without solving it
    Check {
        #[command(flatten)]
        problem: ProblemArgs,
    },
    /// Print the tableau before and after solving
    Tableau {
        #[command(flatten)]
        problem: ProblemArgs,
    },
}

#[derive(Args)]
struct ProblemArgs {
    /// Objective, e.g. "3x + 2y"
    objective: Option<String>,
    /// A constraint such as "x + y <= 4" (repeatable)
    #[arg(short, long = "constraint")]
    constraints: Vec<String>,
    /// Minimize instead of maximize
    #[arg(long)]
    minimize: bool,
    /// Read a JSON request {"type", "objective", "constraints"} instead
    #[arg(short, long, conflicts_with_all = ["objective", "constraints", "minimize"])]
    file: Option<PathBuf>,
    /// Pivot ceiling
    #[arg(long, default_value_t = 10000)]
    max_iterations: usize,
    /// Tolerance for zero and unit tests on tableau entries
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
}

impl ProblemArgs {
    fn request(&self) -> SolveRequest {
        let request = match &self.file {
            Some(file) => {
                let text = match std::fs::read_to_string(file) {
                    Ok(s) => s,
                    Err(e) => fail(format!("Error reading file: {}", e)),
                };
                match SolveRequest::from_json(&text) {
                    Ok(r) => r,
                    Err(e) => fail(format!("Invalid request: {}", e)),
                }
            }
            None => {
                let kind = if self.minimize { "minimize" } else { "maximize" };
                let objective = self.objective.clone().unwrap_or_default();
                SolveRequest::new(kind, objective, self.constraints.iter().cloned())
            }
        };
        request.without_blank_constraints()
    }

    fn input(&self) -> Input {
        let request = self.request();
        match Input::parse(&request.kind, &request.objective, request.constraints.as_slice()) {
            Ok(input) => input,
            Err(e) => fail(format!("Error: {}", e)),
        }
    }

    fn solver(&self) -> Solver {
        Solver::new()
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
    }
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve { problem, pretty } => {
            let request = problem.request();
            let solution = match simplexify_lang::solve_with(&request, &problem.solver()) {
                Ok(s) => s,
                Err(e) => fail(format!("Error: {}", e)),
            };

            let json = if pretty {
                serde_json::to_string_pretty(&solution)
            } else {
                serde_json::to_string(&solution)
            };
            match json {
                Ok(json) => println!("{}", json),
                Err(e) => fail(format!("Error: {}", e)),
            }
            if solution.status != SolutionStatus::Optimal {
                eprintln!("Status: {}", solution.status);
            }
        }
        Commands::Check { problem } => {
            let mut input = problem.input();
            println!("{}", input);
            input.convert_to_standard_form();
            println!();
            println!("Standard form:");
            for constraint in input.constraints() {
                println!("  {}", constraint);
            }
        }
        Commands::Tableau { problem } => {
            let mut input = problem.input();
            let lp = input.to_lp_problem();
            let mut tableau = match Tableau::new(&lp) {
                Ok(t) => t,
                Err(e) => fail(format!("Error: {}", e)),
            };

            println!("Initial tableau:");
            print!("{}", tableau);
            let solution = match problem.solver().run(&mut tableau) {
                Ok(s) => s,
                Err(e) => fail(format!("Error: {}", e)),
            };
            println!();
            println!("Final tableau:");
            print!("{}", tableau);
            println!();
            println!("Status: {}", solution.status);
            println!("Iterations: {}", solution.iterations);
            println!("z = {}", solution.objective_value);
        }
    }
}
