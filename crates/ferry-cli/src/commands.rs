use std::io::Write;

use anyhow::anyhow;
use colored::Colorize;
use ferry_remote::{Direction, Refspec, RemoteCallbacks, RemoteError, Repository};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let repo_path = cli.repo;
    match cli.command {
        Command::Init(args) => cmd_init(args.path.unwrap_or(repo_path)),
        Command::Remote(args) => cmd_remote(&repo_path, args),
        Command::Refspec(args) => cmd_refspec(args),
        Command::Fetch(args) => cmd_fetch(&repo_path, args),
        Command::Push(args) => cmd_push(&repo_path, args),
    }
}

/// Prefix the error with its kind so scripts can match on it.
fn report(e: RemoteError) -> anyhow::Error {
    anyhow!("[{}] {e}", e.kind())
}

fn open(path: &str) -> anyhow::Result<Repository> {
    Repository::open(path).map_err(report)
}

fn cmd_init(path: String) -> anyhow::Result<()> {
    Repository::init(&path).map_err(report)?;
    println!("{} Initialized ferry repository in {}", "✓".green().bold(), path.bold());
    Ok(())
}

fn cmd_remote(path: &str, args: RemoteArgs) -> anyhow::Result<()> {
    let repo = open(path)?;
    match args.action.unwrap_or(RemoteAction::List) {
        RemoteAction::List => {
            let names = repo.remote_names().map_err(report)?;
            if names.is_empty() {
                println!("No remotes configured.");
            }
            for name in names {
                println!("{}", name.bold());
            }
        }
        RemoteAction::Show { name } => {
            let remote = repo.open_remote(&name).map_err(report)?;
            println!("* remote {}", name.bold());
            println!("  Fetch URL: {}", remote.url().blue());
            println!("  Push  URL: {}", remote.effective_push_url().blue());
            for spec in remote.fetch_refspecs() {
                println!("  fetch {}", spec.as_str().cyan());
            }
            for spec in remote.push_refspecs() {
                println!("  push  {}", spec.as_str().cyan());
            }
        }
        RemoteAction::Add { name, url } => {
            repo.create_remote(&name, &url).map_err(report)?;
            println!("Added remote {} → {}", name.bold(), url.blue());
        }
        RemoteAction::Remove { name } => {
            repo.delete_remote(&name).map_err(report)?;
            println!("Removed remote {}", name.bold());
        }
        RemoteAction::Rename { old, new } => {
            let mut remote = repo.open_remote(&old).map_err(report)?;
            remote.rename(&new).map_err(report)?;
            println!("Renamed remote {} → {}", old.bold(), new.bold());
        }
        RemoteAction::SetUrl { name, url, push } => {
            let mut remote = repo.open_remote(&name).map_err(report)?;
            if push {
                remote.set_push_url(&url).map_err(report)?;
            } else {
                remote.set_url(&url).map_err(report)?;
            }
            remote.save().map_err(report)?;
            println!("{} {} URL set to {}", name.bold(), if push { "push" } else { "fetch" }, url.blue());
        }
        RemoteAction::AddFetch { name, refspec } => {
            let mut remote = repo.open_remote(&name).map_err(report)?;
            remote.add_fetch(&refspec).map_err(report)?;
            remote.save().map_err(report)?;
            println!("{} fetch {}", name.bold(), refspec.cyan());
        }
        RemoteAction::AddPush { name, refspec } => {
            let mut remote = repo.open_remote(&name).map_err(report)?;
            remote.add_push(&refspec).map_err(report)?;
            remote.save().map_err(report)?;
            println!("{} push {}", name.bold(), refspec.cyan());
        }
    }
    Ok(())
}

fn cmd_refspec(args: RefspecArgs) -> anyhow::Result<()> {
    let direction = if args.push { Direction::Push } else { Direction::Fetch };
    let spec = Refspec::parse(&args.spec, direction).map_err(|e| report(e.into()))?;
    let mapped = if args.reverse {
        spec.reverse_transform(&args.reference)
    } else {
        spec.transform(&args.reference)
    };
    println!("{}", mapped.map_err(|e| report(e.into()))?);
    Ok(())
}

fn progress_callbacks() -> RemoteCallbacks {
    let mut callbacks = RemoteCallbacks::new();
    callbacks
        .progress(|text| {
            eprint!("remote: {text}");
            Ok(())
        })
        .transfer_progress(|stats| {
            eprint!(
                "\rObjects: {}/{} ({} bytes)",
                stats.received_objects, stats.indexed_objects, stats.received_bytes
            );
            let _ = std::io::stderr().flush();
            Ok(())
        })
        .update_tips(|name, old, new| {
            let range = if old.is_null() {
                "[new]".green().to_string()
            } else if new.is_null() {
                "[deleted]".red().to_string()
            } else {
                format!("{}..{}", old.short_hex(), new.short_hex())
            };
            println!(" {range:>20}  {}", name.yellow());
            Ok(())
        });
    callbacks
}

fn cmd_fetch(path: &str, args: FetchArgs) -> anyhow::Result<()> {
    let repo = open(path)?;
    let name = args.remote.unwrap_or_else(|| "origin".into());
    let mut remote = repo.open_remote(&name).map_err(report)?;
    remote.set_callbacks(progress_callbacks());
    let stats = remote.fetch().map_err(report)?;
    eprintln!();
    println!(
        "{} Fetched from {}: {} objects, {} bytes",
        "✓".green().bold(),
        name.bold(),
        stats.received_objects,
        stats.received_bytes
    );
    Ok(())
}

fn cmd_push(path: &str, args: PushArgs) -> anyhow::Result<()> {
    let repo = open(path)?;
    let mut remote = repo.open_remote(&args.remote).map_err(report)?;
    remote.set_callbacks(progress_callbacks());
    remote.push(&args.refspec).map_err(report)?;
    eprintln!();
    println!(
        "{} Pushed {} to {}",
        "✓".green().bold(),
        args.refspec.yellow(),
        remote.effective_push_url().blue()
    );
    Ok(())
}
