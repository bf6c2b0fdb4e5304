mod batch;
mod components;
mod core;
mod detector;
mod display;
mod execution;
mod menu;
mod resolver;
mod utils;

use std::env;
use std::process;

use crate::core::config::{
    APP_NAME, DEFAULT_BRANCH, DEFAULT_HANDLER_DIRS, EXIT_FAILURE, EXIT_SUCCESS,
    HANDLER_PATH_ENV, VERSION,
};
use crate::core::session::Session;
use crate::core::types::{ExecMode, Mode, Verb};
use crate::detector::LiveSystem;
use crate::display::banner::print_banner;
use crate::execution::dispatch;
use crate::resolver::{detect_exec_mode, HandlerStore};
use crate::utils::system::{is_root, is_supported_family, probe_environment};
use crate::utils::{env_or_defaults, log_message, LogLevel};

enum CliCommand {
    Menu,
    List,
    Status,
    BatchInstall,
    Run { component: String, verb: String },
}

fn print_help() {
    println!(
        r#"
{} - interactive setup for freshly provisioned servers

USAGE:
  vpskit [FLAGS]                 Launch the interactive menu
  vpskit [FLAGS] <COMMAND>

FLAGS:
  --branch <name>     Fetch handlers from the given branch (default: {})
  --force-update      Re-fetch cached handlers before use (alias: --refresh)
  -h, --help          Show this help and exit
  -v, --version       Print version and exit
  -b, --banner        Print the banner and exit

COMMANDS:
  list                       List available components and their verbs
  status                     Show component status (read-only, no root needed)
  batch-install              Install every missing component unattended
  run <component> <verb>     Run a single action, e.g. run firewall install

The interactive menu and all install commands must be run as root.
"#,
        APP_NAME, DEFAULT_BRANCH
    );
}

fn print_component_list() {
    println!("\n════════════════════════════════════════");
    println!("  AVAILABLE COMPONENTS");
    println!("══════════════════════════════════════════\n");

    for (category, comps) in components::categories() {
        println!("{}:", category);
        for component in comps {
            let verbs = component
                .verbs
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  • {:<20} {} (verbs: {})",
                component.id, component.description, verbs
            );
        }
        println!();
    }

    println!("════════════════════════════════════════\n");
}

/// Handles the "run" command for a single component/verb pair
/// Returns proper exit code based on execution result
fn run_single(component_id: &str, verb_name: &str, session: &Session, store: &HandlerStore) -> i32 {
    let component = match components::find(component_id) {
        Some(component) => component,
        None => {
            log_message(
                LogLevel::Error,
                &format!("Unknown component '{}'", component_id),
            );
            let ids: Vec<&str> = components::REGISTRY.iter().map(|c| c.id).collect();
            println!("Available components: {}", ids.join(", "));
            return EXIT_FAILURE;
        }
    };

    let verb = match Verb::parse(verb_name) {
        Some(verb) => verb,
        None => {
            log_message(LogLevel::Error, &format!("Unknown verb '{}'", verb_name));
            return EXIT_FAILURE;
        }
    };

    match dispatch(component, verb, Mode::Interactive, store, session) {
        Ok(status) if status.success() => EXIT_SUCCESS,
        Ok(status) => status.code().unwrap_or(EXIT_FAILURE),
        Err(e) => {
            log_message(LogLevel::Error, &e.to_string());
            EXIT_FAILURE
        }
    }
}

/// Everything past this point needs the full environment: root, a readable
/// OS identity and a fetch tool. Failures here are fatal and happen before
/// any menu is shown.
fn run_privileged(command: CliCommand, branch: String, force_refresh: bool) -> i32 {
    let environment = match probe_environment() {
        Ok(environment) => environment,
        Err(e) => {
            log_message(LogLevel::Error, &e.to_string());
            return EXIT_FAILURE;
        }
    };

    if !is_supported_family(&environment.os.family) {
        log_message(
            LogLevel::Warning,
            &format!(
                "OS family '{}' is not officially supported, proceeding anyway",
                environment.os.family
            ),
        );
    }

    let local_dirs = env_or_defaults(HANDLER_PATH_ENV, DEFAULT_HANDLER_DIRS);
    let exec_mode = detect_exec_mode(&local_dirs);

    let session = Session {
        os: environment.os,
        is_root: is_root(),
        exec_mode,
        branch,
        force_refresh,
        fetch_tool: environment.fetch_tool,
    };

    let store = HandlerStore::from_session(&session);
    let probe = LiveSystem;

    match command {
        CliCommand::Menu => {
            if atty::is(atty::Stream::Stdout) {
                print_banner();
            }
            let mode_name = match session.exec_mode {
                ExecMode::Local => "local",
                ExecMode::Remote => "remote",
            };
            log_message(
                LogLevel::Info,
                &format!(
                    "Detected {} {}, {} execution mode",
                    session.os.family, session.os.version, mode_name
                ),
            );
            menu::run_interactive(&session, &store)
        }
        CliCommand::BatchInstall => batch::install_everything(&session, &store, &probe),
        CliCommand::Run { component, verb } => run_single(&component, &verb, &session, &store),
        // Read-only commands never reach the privilege gate
        CliCommand::List | CliCommand::Status => EXIT_SUCCESS,
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut branch = DEFAULT_BRANCH.to_string();
    let mut force_refresh = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--branch" => {
                i += 1;
                match args.get(i) {
                    Some(name) => branch = name.clone(),
                    None => {
                        log_message(LogLevel::Error, "--branch requires a value");
                        process::exit(EXIT_FAILURE);
                    }
                }
            }
            "--force-update" | "--refresh" => force_refresh = true,
            "-h" | "--help" | "help" => {
                print_help();
                process::exit(EXIT_SUCCESS);
            }
            "-v" | "--version" | "version" => {
                println!("{} version {}", APP_NAME, VERSION);
                process::exit(EXIT_SUCCESS);
            }
            "-b" | "--banner" | "banner" => {
                print_banner();
                process::exit(EXIT_SUCCESS);
            }
            arg if arg.starts_with('-') => {
                log_message(LogLevel::Error, &format!("Unknown option: {}", arg));
                print_help();
                process::exit(EXIT_FAILURE);
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let command = match positional.len() {
        0 => CliCommand::Menu,
        1 => match positional[0].as_str() {
            "list" => CliCommand::List,
            "status" => CliCommand::Status,
            "batch-install" => CliCommand::BatchInstall,
            other => {
                log_message(LogLevel::Error, &format!("Unknown command: {}", other));
                print_help();
                process::exit(EXIT_FAILURE);
            }
        },
        3 if positional[0] == "run" => CliCommand::Run {
            component: positional[1].clone(),
            verb: positional[2].clone(),
        },
        _ => {
            log_message(LogLevel::Error, "Invalid number of arguments");
            print_help();
            process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = match command {
        CliCommand::List => {
            print_component_list();
            EXIT_SUCCESS
        }
        CliCommand::Status => {
            menu::status_overview(&LiveSystem);
            EXIT_SUCCESS
        }
        other => run_privileged(other, branch, force_refresh),
    };

    process::exit(exit_code);
}
