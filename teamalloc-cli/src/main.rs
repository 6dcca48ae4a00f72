use anyhow::{anyhow, Result};
use clap::{arg, Command};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{fs, path::PathBuf};
use teamalloc_core::{
    generate_instance, write_input_files, write_report, Allocation, GenConfig, Instance, Params,
};

fn cli() -> Command {
    Command::new("teamalloc")
        .about("Assigns preference-groups to fixed-size project groups on topics")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate")
                .about("Generates random roster and preference files")
                .arg(arg!(<ROSTER> "Output path for the roster file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<PREFERENCES> "Output path for the preference file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--people [PEOPLE] "Number of people to generate")
                    .default_value("150")
                    .value_parser(clap::value_parser!(usize)))
                .arg(arg!(--seed [SEED] "Seed for the random generator")
                    .default_value("0")
                    .value_parser(clap::value_parser!(u64))),
        )
        .subcommand(
            Command::new("solve")
                .about("Computes a project group allocation")
                .arg(arg!(<ROSTER> "Path to the roster file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<PREFERENCES> "Path to the preference file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--output [OUTPUT] "Write the allocation report to this file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--json [JSON] "Write the allocation as json to this file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--params [PARAMS] "Path to a json file with engine parameters")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--trials [TRIALS] "Number of randomized trials")
                    .value_parser(clap::value_parser!(usize)))
                .arg(arg!(--seed [SEED] "Seed for the random generator")
                    .default_value("0")
                    .value_parser(clap::value_parser!(u64))),
        )
        .subcommand(
            Command::new("verify")
                .about("Verifies an allocation json against the input files")
                .arg(arg!(<ROSTER> "Path to the roster file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<PREFERENCES> "Path to the preference file")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<ALLOCATION> "Path to the allocation json")
                    .value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(--params [PARAMS] "Path to a json file with engine parameters")
                    .value_parser(clap::value_parser!(PathBuf))),
        )
}

fn main() {
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("generate", sub_m)) => generate(
            sub_m.get_one::<PathBuf>("ROSTER").unwrap().clone(),
            sub_m.get_one::<PathBuf>("PREFERENCES").unwrap().clone(),
            *sub_m.get_one::<usize>("people").unwrap(),
            *sub_m.get_one::<u64>("seed").unwrap(),
        ),
        Some(("solve", sub_m)) => solve(
            sub_m.get_one::<PathBuf>("ROSTER").unwrap().clone(),
            sub_m.get_one::<PathBuf>("PREFERENCES").unwrap().clone(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            sub_m.get_one::<PathBuf>("json").cloned(),
            sub_m.get_one::<PathBuf>("params").cloned(),
            sub_m.get_one::<usize>("trials").copied(),
            *sub_m.get_one::<u64>("seed").unwrap(),
        ),
        Some(("verify", sub_m)) => verify(
            sub_m.get_one::<PathBuf>("ROSTER").unwrap().clone(),
            sub_m.get_one::<PathBuf>("PREFERENCES").unwrap().clone(),
            sub_m.get_one::<PathBuf>("ALLOCATION").unwrap().clone(),
            sub_m.get_one::<PathBuf>("params").cloned(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn seed_bytes(seed: u64) -> [u8; 32] {
    StdRng::seed_from_u64(seed).gen()
}

fn load_params(path: Option<PathBuf>) -> Result<Params> {
    let params = match path {
        Some(path) => serde_json::from_str(&fs::read_to_string(&path).map_err(|e| {
            anyhow!("Failed to read params file {}: {}", path.display(), e)
        })?)?,
        None => Params::default(),
    };
    Ok(params)
}

fn generate(roster: PathBuf, preferences: PathBuf, people: usize, seed: u64) -> Result<()> {
    let params = Params::default();
    let config = GenConfig {
        num_people: people,
        ..GenConfig::default()
    };
    let instance = generate_instance(&seed_bytes(seed), &config, &params)?;
    write_input_files(&roster, &preferences, &instance, &params)?;
    println!(
        "Generated {} people in {} preference-groups.",
        instance.num_people(),
        instance.groups.len()
    );
    Ok(())
}

fn solve(
    roster: PathBuf,
    preferences: PathBuf,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    params_path: Option<PathBuf>,
    trials: Option<usize>,
    seed: u64,
) -> Result<()> {
    let mut params = load_params(params_path)?;
    if let Some(trials) = trials {
        params.num_trials = trials;
    }
    params.validate()?;

    let instance = Instance::from_files(&roster, &preferences, &params)?;
    println!(
        "Allocating {} preference-groups over {} trials...",
        instance.groups.len(),
        params.num_trials
    );

    let allocation = teamalloc_solver::solve(&instance, &params, &seed_bytes(seed))?
        .ok_or_else(|| anyhow!("No valid group allocation found"))?;

    println!(
        "Optimal group allocation has an objective score of {}.",
        allocation.score
    );
    if let Some(path) = output {
        write_report(&path, &instance, &allocation)?;
        println!("Detailed group allocation written to {}.", path.display());
    }
    if let Some(path) = json {
        fs::write(&path, serde_json::to_string_pretty(&allocation)?)
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
        println!("Allocation json written to {}.", path.display());
    }
    Ok(())
}

fn verify(
    roster: PathBuf,
    preferences: PathBuf,
    allocation: PathBuf,
    params_path: Option<PathBuf>,
) -> Result<()> {
    let params = load_params(params_path)?;
    params.validate()?;
    let instance = Instance::from_files(&roster, &preferences, &params)?;
    let allocation: Allocation = serde_json::from_str(&fs::read_to_string(&allocation).map_err(
        |e| anyhow!("Failed to read allocation {}: {}", allocation.display(), e),
    )?)?;
    allocation.verify(&instance, &params)?;
    println!("Allocation is valid (score {}).", allocation.score);
    Ok(())
}
