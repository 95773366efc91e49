use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use stratus_aws::database::{DatabaseConfig, EngineProfile};
use stratus_aws::{DeployEnv, RoleStrategy, StackConfig, assemble};

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Synthesize the private-RDS analytics stack for the provisioning engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the stack and write the manifest
    Synth {
        /// Output path for the manifest
        #[arg(long, default_value = "stratus.out.json")]
        out: PathBuf,

        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Show the resource graph in dependency order
    Graph {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Assemble and validate without writing anything
    Validate {
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Database engine/authentication profile
    #[arg(long, value_enum, default_value_t)]
    engine_profile: EngineProfileArg,

    /// Function role provisioning strategy
    #[arg(long, value_enum, default_value_t)]
    role_strategy: RoleStrategyArg,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum EngineProfileArg {
    /// Pinned engine version with IAM authentication and encryption
    #[default]
    FixedIam,
    /// Latest engine version, credential-based authentication only
    LatestSecret,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum RoleStrategyArg {
    /// One shared execution role and runtime layer
    #[default]
    Shared,
    /// Each function provisions its own role
    SelfContained,
}

impl ProfileArgs {
    fn to_config(&self) -> StackConfig {
        let profile = match self.engine_profile {
            EngineProfileArg::FixedIam => EngineProfile::FixedVersionIamAuth,
            EngineProfileArg::LatestSecret => EngineProfile::LatestVersionSecretAuth,
        };
        let role_strategy = match self.role_strategy {
            RoleStrategyArg::Shared => RoleStrategy::Shared,
            RoleStrategyArg::SelfContained => RoleStrategy::SelfContained,
        };
        StackConfig {
            env: DeployEnv::from_env(),
            role_strategy,
            database: DatabaseConfig {
                profile,
                ..DatabaseConfig::default()
            },
            ..StackConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Synth { out, profile } => run_synth(&out, &profile.to_config()),
        Commands::Graph { profile } => run_graph(&profile.to_config()),
        Commands::Validate { profile } => run_validate(&profile.to_config()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_synth(out: &Path, config: &StackConfig) -> Result<(), String> {
    let stack = assemble(config).map_err(|e| e.to_string())?;
    let manifest = stack.manifest().map_err(|e| e.to_string())?;
    let json = manifest.to_json().map_err(|e| e.to_string())?;

    fs::write(out, json).map_err(|e| format!("Failed to write {}: {}", out.display(), e))?;

    println!(
        "{} {} ({} resources)",
        "Wrote".green().bold(),
        out.display(),
        manifest.resources.len()
    );
    Ok(())
}

fn run_graph(config: &StackConfig) -> Result<(), String> {
    let stack = assemble(config).map_err(|e| e.to_string())?;
    let order = stack.graph.topo_order().map_err(|e| e.to_string())?;

    for id in order {
        let descriptor = stack.graph.descriptor(id);
        let deps: Vec<String> = stack
            .graph
            .dependencies_of(id)
            .into_iter()
            .map(|dep| stack.graph.descriptor(dep).id.to_string())
            .collect();

        if deps.is_empty() {
            println!("+ {}", descriptor.id.to_string().bold());
        } else {
            println!(
                "+ {} {} {}",
                descriptor.id.to_string().bold(),
                "<-".dimmed(),
                deps.join(", ").dimmed()
            );
        }
    }
    Ok(())
}

fn run_validate(config: &StackConfig) -> Result<(), String> {
    let stack = assemble(config).map_err(|e| e.to_string())?;
    println!(
        "{} {} resources",
        "Valid:".green().bold(),
        stack.graph.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use stratus_core::synth::Manifest;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_profile_flags() {
        let cli = Cli::parse_from([
            "stratus",
            "synth",
            "--engine-profile",
            "latest-secret",
            "--role-strategy",
            "self-contained",
            "--out",
            "x.json",
        ]);
        let Commands::Synth { out, profile } = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(out, PathBuf::from("x.json"));
        assert!(matches!(profile.engine_profile, EngineProfileArg::LatestSecret));
        assert!(matches!(profile.role_strategy, RoleStrategyArg::SelfContained));
    }

    #[test]
    fn synth_writes_a_parseable_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("manifest.json");

        let config = StackConfig::default();
        run_synth(&out, &config).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let manifest: Manifest = serde_json::from_str(&content).unwrap();
        assert_eq!(manifest.format_version, Manifest::CURRENT_VERSION);
        assert!(!manifest.resources.is_empty());
    }

    #[test]
    fn validate_succeeds_for_both_profiles() {
        for args in [
            ProfileArgs {
                engine_profile: EngineProfileArg::FixedIam,
                role_strategy: RoleStrategyArg::Shared,
            },
            ProfileArgs {
                engine_profile: EngineProfileArg::LatestSecret,
                role_strategy: RoleStrategyArg::SelfContained,
            },
        ] {
            let mut config = args.to_config();
            // Keep tests independent of the process environment
            config.env = DeployEnv::default();
            assert!(run_validate(&config).is_ok());
        }
    }
}
