use std::io::{self, Write};
use std::process;

use crate::batch;
use crate::components::{self, Component};
use crate::core::config::EXIT_SUCCESS;
use crate::core::session::Session;
use crate::core::types::Mode;
use crate::detector::{component_status, LiveSystem, SystemProbe};
use crate::execution::dispatch;
use crate::resolver::HandlerStore;
use crate::utils::{log_message, LogLevel};

/// Read one trimmed line from stdin. I/O errors and EOF both map to an
/// empty selection so a closed stdin unwinds the menus instead of looping.
fn read_selection() -> String {
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(_) => input.trim().to_string(),
        Err(_) => String::new(),
    }
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_selection()
}

/// Top-level interactive loop. Blocks on one prompt at a time; every error
/// below this point is reported and the menu redisplays.
pub fn run_interactive(session: &Session, store: &HandlerStore) -> i32 {
    ctrlc::set_handler(|| {
        println!();
        log_message(LogLevel::Info, "Interrupted, exiting.");
        process::exit(EXIT_SUCCESS);
    })
    .expect("Error setting Ctrl+C handler");

    let probe = LiveSystem;
    let categories = components::categories();

    loop {
        println!("\n╔═══════════════════════════════════════╗");
        println!("║            VPSKIT MAIN MENU             ║");
        println!("╚═════════════════════════════════════════╝\n");

        for (i, (name, comps)) in categories.iter().enumerate() {
            println!("  {}) {:<18} ({} components)", i + 1, name, comps.len());
        }
        let batch_choice = categories.len() + 1;
        let status_choice = categories.len() + 2;
        println!("  {}) Install everything", batch_choice);
        println!("  {}) System status", status_choice);
        println!("  0) Exit\n");

        let choice = prompt(&format!(
            "Enter your selection [0-{}, Enter = exit]: ",
            status_choice
        ));

        if choice.is_empty() || choice == "0" {
            break;
        }

        match choice.parse::<usize>() {
            Ok(n) if n >= 1 && n <= categories.len() => {
                let (name, comps) = &categories[n - 1];
                category_menu(name, comps, session, store, &probe);
            }
            Ok(n) if n == batch_choice => {
                batch::install_everything(session, store, &probe);
            }
            Ok(n) if n == status_choice => {
                status_overview(&probe);
            }
            _ => {
                log_message(LogLevel::Warning, "Invalid selection, try again");
            }
        }
    }

    log_message(LogLevel::Info, "Goodbye.");
    EXIT_SUCCESS
}

fn category_menu(
    name: &str,
    comps: &[&'static Component],
    session: &Session,
    store: &HandlerStore,
    probe: &dyn SystemProbe,
) {
    loop {
        println!("\n▶ {}:\n", name.to_uppercase());
        for (i, component) in comps.iter().enumerate() {
            println!("  {}) {:<18} - {}", i + 1, component.name, component.description);
        }
        println!("  0) Back\n");

        let choice = prompt(&format!(
            "Enter your selection [0-{}, Enter = back]: ",
            comps.len()
        ));

        if choice.is_empty() || choice == "0" {
            return;
        }

        match choice.parse::<usize>() {
            Ok(n) if n >= 1 && n <= comps.len() => {
                component_menu(comps[n - 1], session, store, probe);
            }
            _ => {
                log_message(LogLevel::Warning, "Invalid selection, try again");
            }
        }
    }
}

fn component_menu(
    component: &Component,
    session: &Session,
    store: &HandlerStore,
    probe: &dyn SystemProbe,
) {
    loop {
        println!("\n▶ {}:\n", component.name.to_uppercase());

        // Delegates have no detectable state; everything else gets a fresh
        // probe on every redisplay.
        if !component.is_delegate() {
            let status = component_status(probe, component);
            println!("  Current state: {}\n", describe_status(&status));
        }

        for (i, verb) in component.verbs.iter().enumerate() {
            println!("  {}) {}", i + 1, verb);
        }
        println!("  0) Back\n");

        let hint = match component.default_verb {
            Some(verb) => format!("Enter = {}", verb),
            None => "Enter = back".to_string(),
        };
        let choice = prompt(&format!(
            "Enter your selection [0-{}, {}]: ",
            component.verbs.len(),
            hint
        ));

        let verb = if choice.is_empty() {
            match component.default_verb {
                Some(verb) => verb,
                None => return,
            }
        } else if choice == "0" {
            return;
        } else {
            match choice.parse::<usize>() {
                Ok(n) if n >= 1 && n <= component.verbs.len() => component.verbs[n - 1],
                _ => {
                    log_message(LogLevel::Warning, "Invalid selection, try again");
                    continue;
                }
            }
        };

        // Errors are local to this action; the menu redisplays either way.
        match dispatch(component, verb, Mode::Interactive, store, session) {
            Ok(_) => {}
            Err(e) => log_message(LogLevel::Error, &e.to_string()),
        }
    }
}

fn describe_status(status: &crate::core::types::Status) -> String {
    let (color, label) = if status.active {
        ("\x1b[32m", "active")
    } else if status.installed {
        ("\x1b[34m", "installed, inactive")
    } else {
        ("\x1b[31m", "not installed")
    };

    match &status.version {
        Some(version) => format!("{}{}\x1b[0m (version {})", color, label, version),
        None => format!("{}{}\x1b[0m", color, label),
    }
}

/// One-line-per-component state listing with colored markers.
pub fn status_overview(probe: &dyn SystemProbe) {
    println!("\n═══ COMPONENT STATUS ═══\n");

    for component in components::managed() {
        let status = component_status(probe, component);

        let (marker, label) = if status.active {
            ("\x1b[32m✓\x1b[0m", "[ACTIVE]")
        } else if status.installed {
            ("\x1b[34m○\x1b[0m", "[INSTALLED]")
        } else {
            ("\x1b[31m✗\x1b[0m", "[NOT INSTALLED]")
        };

        match &status.version {
            Some(version) => {
                println!("  {} {:<18} {} ({})", marker, component.name, label, version)
            }
            None => println!("  {} {:<18} {}", marker, component.name, label),
        }
    }

    println!();
}
