// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Interactive operator console for a TS-300 unit.
//!
//! Reads one command per line from stdin and prints session events as they
//! arrive. `--dry-run` prints the frames instead of opening a socket.

use std::collections::HashMap;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use ts300::agent::{FrameSink, RecordingSink, Ts300Bridge, Ts300Controller};
use ts300::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    validate_config, Ts300Config,
};
use ts300::io::{SessionEvent, SessionEventCallback};
use ts300::observability::{debug_flags_help, init_logging, parse_debug_flags};
use ts300::protocol::{MicOperation, MicRole, Topology};

const COMMANDS_HELP: &str = "\
Commands:
  mic on|off wired|wireless delegate|chairman <id>
  raw <id> <operate 1|0> <type 1=wireless|0=wired> <role 1=delegate|0=chairman>
  volume <0-31>
  mode wired|wireless <mode 1-4> <delegate-count 1-4>
  alloff
  text <ascii>
  diag on|off
  connect | disconnect | status
  help | quit";

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: ts300_console [--config <path>] [--host <addr>] [--port <port>]\n\
         \x20                    [--buffer <bytes>] [--reconnect-ms <ms>] [--log-level <level>]\n\
         \x20                    [--diagnostics] [--dry-run] [--debug-<crate>] [--debug-all]\n\n\
         Without --config the file is searched for as ts300_configuration.toml;\n\
         if none is found, --host and --port must be given.\n\n{}\n\n{}",
        COMMANDS_HELP,
        debug_flags_help()
    );
    process::exit(2);
}

struct Options {
    config_path: Option<PathBuf>,
    overrides: HashMap<String, String>,
    dry_run: bool,
}

fn parse_args() -> Options {
    let mut options = Options {
        config_path: None,
        overrides: HashMap::new(),
        dry_run: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let override_key = match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                options.config_path = Some(PathBuf::from(v));
                continue;
            }
            "--diagnostics" => {
                options.overrides.insert("diagnostics".to_string(), "true".to_string());
                continue;
            }
            "--dry-run" => {
                options.dry_run = true;
                continue;
            }
            "-h" | "--help" => usage_and_exit(),
            "--host" => "device_host",
            "--port" => "device_port",
            "--buffer" => "receive_buffer_size",
            "--reconnect-ms" => "reconnect_delay_ms",
            "--log-level" => "log_level",
            other if other.starts_with("--debug-") => continue,
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        };
        let v = args.next().unwrap_or_else(|| usage_and_exit());
        options.overrides.insert(override_key.to_string(), v);
    }

    options
}

fn resolve_config(options: &Options) -> Result<Ts300Config> {
    let path = match &options.config_path {
        Some(path) => Some(path.clone()),
        None => find_config_file().ok(),
    };
    let config = match path {
        Some(path) => load_config(Some(&path), Some(&options.overrides))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let mut config = Ts300Config::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &options.overrides);
            config
        }
    };
    validate_config(&config)?;
    Ok(config)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Mic {
        operation: MicOperation,
        topology: Topology,
        role: MicRole,
        id: u16,
    },
    Raw {
        id: u16,
        operate: u16,
        connection_type: u16,
        delegate_type: u16,
    },
    Volume(u16),
    Mode {
        topology: Topology,
        mode: u16,
        delegate_count: u16,
    },
    AllOff,
    Text(String),
    Diagnostics(bool),
    Connect,
    Disconnect,
    Status,
    Help,
    Quit,
}

fn parse_number(word: Option<&str>, what: &str) -> Result<u16> {
    let word = word.with_context(|| format!("missing {what}"))?;
    word.parse::<u16>()
        .with_context(|| format!("{what} must be a number, got '{word}'"))
}

fn parse_topology(word: Option<&str>) -> Result<Topology> {
    match word {
        Some("wired") => Ok(Topology::Wired),
        Some("wireless") => Ok(Topology::Wireless),
        other => bail!("expected wired|wireless, got {:?}", other),
    }
}

fn parse_command(line: &str) -> Result<ConsoleCommand> {
    let line = line.trim();
    if let Some(text) = line.strip_prefix("text ") {
        return Ok(ConsoleCommand::Text(text.to_string()));
    }

    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some("mic") => {
            let operation = match words.next() {
                Some("on") => MicOperation::On,
                Some("off") => MicOperation::Off,
                other => bail!("expected on|off, got {:?}", other),
            };
            let topology = parse_topology(words.next())?;
            let role = match words.next() {
                Some("delegate") => MicRole::Delegate,
                Some("chairman") => MicRole::Chairman,
                other => bail!("expected delegate|chairman, got {:?}", other),
            };
            let id = parse_number(words.next(), "id")?;
            ConsoleCommand::Mic {
                operation,
                topology,
                role,
                id,
            }
        }
        Some("raw") => ConsoleCommand::Raw {
            id: parse_number(words.next(), "id")?,
            operate: parse_number(words.next(), "operate")?,
            connection_type: parse_number(words.next(), "type")?,
            delegate_type: parse_number(words.next(), "role")?,
        },
        Some("volume") => ConsoleCommand::Volume(parse_number(words.next(), "volume")?),
        Some("mode") => ConsoleCommand::Mode {
            topology: parse_topology(words.next())?,
            mode: parse_number(words.next(), "mode")?,
            delegate_count: parse_number(words.next(), "delegate count")?,
        },
        Some("alloff") => ConsoleCommand::AllOff,
        Some("diag") => match words.next() {
            Some("on") => ConsoleCommand::Diagnostics(true),
            Some("off") => ConsoleCommand::Diagnostics(false),
            other => bail!("expected on|off, got {:?}", other),
        },
        Some("connect") => ConsoleCommand::Connect,
        Some("disconnect") => ConsoleCommand::Disconnect,
        Some("status") => ConsoleCommand::Status,
        Some("help") => ConsoleCommand::Help,
        Some("quit") | Some("exit") => ConsoleCommand::Quit,
        Some(other) => bail!("unknown command '{other}'"),
        None => bail!("empty line"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected '{extra}'");
    }
    Ok(command)
}

/// Run a device command; returns false for commands the controller does not handle
fn run_on_controller<S: FrameSink>(controller: &Ts300Controller<S>, command: &ConsoleCommand) -> bool {
    match command {
        ConsoleCommand::Mic {
            operation,
            topology,
            role,
            id,
        } => controller.mic_control(*id, *operation, *topology, *role),
        ConsoleCommand::Raw {
            id,
            operate,
            connection_type,
            delegate_type,
        } => controller.mic_control_raw(*id, *operate, *connection_type, *delegate_type),
        ConsoleCommand::Volume(volume) => controller.set_master_volume(*volume),
        ConsoleCommand::Mode {
            topology,
            mode,
            delegate_count,
        } => controller.set_conference_mode(*topology, *mode, *delegate_count),
        ConsoleCommand::AllOff => controller.all_wireless_units_off(),
        ConsoleCommand::Text(text) => controller.send_text(text),
        ConsoleCommand::Diagnostics(true) => controller.enable_diagnostics(),
        ConsoleCommand::Diagnostics(false) => controller.disable_diagnostics(),
        _ => return false,
    }
    true
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::ReceivedText(text) => println!("<< {:?}", text),
        SessionEvent::ConnectionStatus { label, code } => println!("** {} ({})", label, code),
        SessionEvent::Initialized(ok) => println!("** initialized: {}", ok),
    }
}

fn command_loop(mut handle: impl FnMut(ConsoleCommand)) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(ConsoleCommand::Help) => println!("{COMMANDS_HELP}"),
            Ok(command) => handle(command),
            Err(e) => eprintln!("!! {e}"),
        }
    }
    Ok(())
}

fn run_dry(config: &Ts300Config) -> Result<()> {
    let controller = Ts300Controller::new(RecordingSink::new());
    if config.logging.diagnostics {
        controller.enable_diagnostics();
    }
    println!("dry run: frames are printed, nothing is sent");
    command_loop(|command| {
        controller.sink().clear();
        if !run_on_controller(&controller, &command) {
            println!("!! '{:?}' needs a live session", command);
            return;
        }
        if matches!(command, ConsoleCommand::Diagnostics(_)) {
            return;
        }
        match controller.sink().last_write() {
            Some(bytes) => println!(
                ">> {}",
                bytes
                    .iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            None => println!("!! rejected"),
        }
    })
}

fn run_live(config: &Ts300Config) -> Result<()> {
    let callback: SessionEventCallback = Arc::new(print_event);
    let bridge = Ts300Bridge::from_config(config, Some(callback))?;
    bridge.connect();
    command_loop(|command| match command {
        ConsoleCommand::Connect => bridge.connect(),
        ConsoleCommand::Disconnect => bridge.disconnect(),
        ConsoleCommand::Status => println!("state: {:?}", bridge.state()),
        command => {
            run_on_controller(bridge.controller(), &command);
        }
    })?;
    bridge.disconnect();
    Ok(())
}

fn main() -> Result<()> {
    let options = parse_args();
    let config = resolve_config(&options)?;

    let flags = parse_debug_flags();
    let _logging = init_logging(&flags, &config.logging.level, config.logging.log_dir.as_deref())?;
    info!(
        "ts300_console {} targeting {}:{}",
        ts300::VERSION,
        config.device.host,
        config.device.port
    );

    if options.dry_run {
        run_dry(&config)
    } else {
        run_live(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mic_command() {
        assert_eq!(
            parse_command("mic on wireless delegate 12").unwrap(),
            ConsoleCommand::Mic {
                operation: MicOperation::On,
                topology: Topology::Wireless,
                role: MicRole::Delegate,
                id: 12
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command("mic maybe wired delegate 1").is_err());
        assert!(parse_command("volume loud").is_err());
        assert!(parse_command("alloff now").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn test_parse_text_keeps_spaces() {
        assert_eq!(
            parse_command("text SET  MODE 1").unwrap(),
            ConsoleCommand::Text("SET  MODE 1".to_string())
        );
    }

    #[test]
    fn test_controller_commands_produce_frames() {
        let controller = Ts300Controller::new(RecordingSink::new());
        assert!(run_on_controller(&controller, &parse_command("volume 5").unwrap()));
        assert!(run_on_controller(&controller, &parse_command("mode wired 2 3").unwrap()));
        assert!(!run_on_controller(&controller, &ConsoleCommand::Status));
        assert_eq!(controller.sink().writes().len(), 2);
    }
}
