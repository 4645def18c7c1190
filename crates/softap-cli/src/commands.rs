//! Command dispatch: bridges CLI args into `softap_core`/`softap_config` calls.

use std::time::Duration;

use softap_core::testing::{FakeCapabilityProvider, FakeChannelPlanner, FakeCoexAdvisor, FakeNativeDriver};
use softap_core::{Capability, Collaborators, ConfigStore, Role, SoftApLifecycle};
use softap_config::FileConfigStore;
use tracing::info;

use crate::cli::{Command, ConfigArgs, ConfigCommand, GlobalOpts, RunArgs};
use crate::config as cli_config;
use crate::error::CliError;
use crate::observers::StdoutObservers;
use crate::output;

/// Dispatch a parsed top-level command.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run(args, global).await,
        Command::Config(args) => config_command(args, global),
        Command::Completions(args) => completions(args.shell),
    }
}

fn config_store(global: &GlobalOpts) -> FileConfigStore {
    match global.config_path {
        Some(ref path) => FileConfigStore::at(path.clone()),
        None => FileConfigStore::new(),
    }
}

/// Run a simulated lifecycle for `args.duration`, then stop it and report
/// the final state. The driver, channel planner, capability provider, and
/// coexistence advisor are all in-memory fakes from `softap_core::testing`
/// -- there is no real radio hardware behind this CLI.
async fn run(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = config_store(global);
    let base = store.default_config();
    let base = store.randomize_bssid_if_unset(base);
    let config = cli_config::apply_run_overrides(base, &args);

    let capability = Capability {
        max_supported_clients: args.capability_max_clients,
        mac_address_customization: true,
        client_force_disconnect: true,
        acs_offload: true,
    };

    let collaborators = Collaborators {
        driver: Box::new(FakeNativeDriver::new()),
        channel_planner: Box::new(FakeChannelPlanner::accepting()),
        capability_provider: Box::new(FakeCapabilityProvider::new()),
        coex: Box::new(FakeCoexAdvisor::new()),
        observers: Box::new(StdoutObservers::new(global.quiet)),
    };

    let role = if args.tethered { Role::Tethered } else { Role::Local };
    let duration = args.duration;
    let lifecycle = SoftApLifecycle::new("softap0", config, capability, role, args.requestor, collaborators);

    info!(?duration, "running simulated lifecycle");
    tokio::time::sleep(duration).await;

    lifecycle.stop()?;
    // Give the dispatcher a moment to process `Stop` before reporting.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut dump = String::new();
    let _ = lifecycle.dump(&mut dump);
    output::print_output(&dump, global.quiet);

    Ok(())
}

fn config_command(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = config_store(global);
    match args.command {
        ConfigCommand::Show => {
            let cfg = store.default_config();
            let out = output::render_single(&global.output, &cfg, cli_config::format_config_plain)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ConfigCommand::Init => {
            let cfg = store.default_config();
            store.save(&cfg).map_err(|source| CliError::ConfigStore { path: store.path().display().to_string(), source })?;
            if !global.quiet {
                println!("wrote default configuration to {}", store.path().display());
            }
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut cfg = store.default_config();
            cli_config::set_field(&mut cfg, &key, &value)?;
            store.save(&cfg).map_err(|source| CliError::ConfigStore { path: store.path().display().to_string(), source })?;
            if !global.quiet {
                println!("set {key} = {value}");
            }
            Ok(())
        }
    }
}

fn completions(shell: clap_complete::Shell) -> Result<(), CliError> {
    use clap::CommandFactory;
    let mut cmd = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut cmd, "softap", &mut std::io::stdout());
    Ok(())
}
