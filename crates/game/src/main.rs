mod app;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use app::bootstrap::init_tracing;
use app::loop_runner::{run, LaunchOptions};

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage_text());
            return ExitCode::from(2);
        }
    };

    init_tracing();
    run(options)
}

/// `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<LaunchOptions>, String> {
    let mut snapshot_path = None;
    let mut script_path = None;
    let mut options = LaunchOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let flag = args[index].as_str();
        if flag == "-h" || flag == "--help" {
            return Ok(None);
        }
        let value = || {
            args.get(index + 1)
                .cloned()
                .ok_or_else(|| format!("missing value for {flag}"))
        };
        match flag {
            "--snapshot" => snapshot_path = Some(PathBuf::from(value()?)),
            "--script" => script_path = Some(PathBuf::from(value()?)),
            "--player" => options.player = Some(value()?),
            "--server" => options.server_addr = Some(value()?),
            other => return Err(format!("unknown argument '{other}'")),
        }
        index += 2;
    }

    options.snapshot_path = snapshot_path.ok_or_else(|| "--snapshot is required".to_string())?;
    options.script_path = script_path.ok_or_else(|| "--script is required".to_string())?;
    Ok(Some(options))
}

fn usage_text() -> String {
    [
        "valhalla_client - headless order client",
        "",
        "Usage:",
        "  valhalla_client --snapshot <file> --script <file> [--player <name>] [--server <host:port>]",
        "",
        "Without --server, order commands are written to stdout as JSON lines.",
        "--player overrides the VALHALLA_PLAYER environment variable.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_all_flags() {
        let options = parse_args(&args(&[
            "--snapshot",
            "world.json",
            "--script",
            "moves.txt",
            "--player",
            "Alice",
            "--server",
            "127.0.0.1:5000",
        ]))
        .expect("parse")
        .expect("options");

        assert_eq!(options.snapshot_path, PathBuf::from("world.json"));
        assert_eq!(options.script_path, PathBuf::from("moves.txt"));
        assert_eq!(options.player.as_deref(), Some("Alice"));
        assert_eq!(options.server_addr.as_deref(), Some("127.0.0.1:5000"));
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse_args(&args(&["--snapshot", "a", "-h"])), Ok(None));
    }

    #[test]
    fn reports_missing_and_unknown_arguments() {
        assert_eq!(
            parse_args(&args(&["--script", "moves.txt"])),
            Err("--snapshot is required".to_string())
        );
        assert_eq!(
            parse_args(&args(&["--snapshot"])),
            Err("missing value for --snapshot".to_string())
        );
        assert_eq!(
            parse_args(&args(&["--verbose"])),
            Err("unknown argument '--verbose'".to_string())
        );
    }
}
