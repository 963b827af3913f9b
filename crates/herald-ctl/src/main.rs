//! herald-ctl: command-line interface for the Herald daemon.

mod cmd;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 9101;

fn print_usage() {
    println!("herald-ctl: query a running heraldd");
    println!();
    println!("USAGE:");
    println!("  herald-ctl [--port N] <command>");
    println!();
    println!("COMMANDS:");
    println!("  status      Node settings and counts (default)");
    println!("  routes      Routes learned from peers");
    println!("  functions   Functions this node advertises");
    println!("  help        Show this message");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(port).await,
        ["routes"] => cmd::status::cmd_routes(port).await,
        ["functions"] => cmd::status::cmd_functions(port).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
