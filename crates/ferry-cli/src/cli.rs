use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ferry",
    about = "Ferry: remotes, refspecs and object transfer between repositories",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository directory
    #[arg(long, global = true, default_value = ".")]
    pub repo: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new repository
    Init(InitArgs),
    /// Manage configured remotes
    Remote(RemoteArgs),
    /// Map a ref name through a refspec
    Refspec(RefspecArgs),
    /// Fetch objects and move tracking refs
    Fetch(FetchArgs),
    /// Push a refspec to a remote
    Push(PushArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<String>,
}

#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub action: Option<RemoteAction>,
}

#[derive(Subcommand)]
pub enum RemoteAction {
    /// List remote names
    List,
    /// Show a remote's URLs and refspecs
    Show { name: String },
    /// Add a remote with the default fetch refspec
    Add { name: String, url: String },
    /// Remove a remote and its tracking refs
    Remove { name: String },
    Rename { old: String, new: String },
    SetUrl {
        name: String,
        url: String,
        #[arg(long)]
        push: bool,
    },
    AddFetch { name: String, refspec: String },
    AddPush { name: String, refspec: String },
}

#[derive(Args)]
pub struct RefspecArgs {
    pub spec: String,
    #[arg(value_name = "REF")]
    pub reference: String,
    /// Parse as a push refspec
    #[arg(long)]
    pub push: bool,
    /// Map from the destination side back to the source side
    #[arg(long)]
    pub reverse: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    pub remote: Option<String>,
}

#[derive(Args)]
pub struct PushArgs {
    pub remote: String,
    pub refspec: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["ferry", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
        assert_eq!(cli.repo, ".");
    }

    #[test]
    fn parse_global_repo() {
        let cli = Cli::try_parse_from(["ferry", "fetch", "--repo", "/srv/r"]).unwrap();
        assert_eq!(cli.repo, "/srv/r");
        if let Command::Fetch(args) = cli.command {
            assert_eq!(args.remote, None);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_remote_add() {
        let cli = Cli::try_parse_from(["ferry", "remote", "add", "origin", "file:///srv/a"]).unwrap();
        if let Command::Remote(args) = cli.command {
            assert!(matches!(args.action, Some(RemoteAction::Add { ref name, .. }) if name == "origin"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_remote_bare_lists() {
        let cli = Cli::try_parse_from(["ferry", "remote"]).unwrap();
        if let Command::Remote(args) = cli.command {
            assert!(args.action.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_set_push_url() {
        let cli = Cli::try_parse_from(["ferry", "remote", "set-url", "origin", "file:///b", "--push"]).unwrap();
        if let Command::Remote(args) = cli.command {
            assert!(matches!(args.action, Some(RemoteAction::SetUrl { push: true, .. })));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_refspec_reverse() {
        let cli = Cli::try_parse_from([
            "ferry",
            "refspec",
            "+refs/heads/*:refs/remotes/origin/*",
            "refs/remotes/origin/main",
            "--reverse",
        ])
        .unwrap();
        if let Command::Refspec(args) = cli.command {
            assert!(args.reverse);
            assert!(!args.push);
            assert_eq!(args.reference, "refs/remotes/origin/main");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_push() {
        let cli = Cli::try_parse_from(["ferry", "push", "origin", "refs/heads/main"]).unwrap();
        if let Command::Push(args) = cli.command {
            assert_eq!(args.remote, "origin");
            assert_eq!(args.refspec, "refs/heads/main");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn push_requires_refspec() {
        assert!(Cli::try_parse_from(["ferry", "push", "origin"]).is_err());
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["ferry", "-v", "remote", "list"]).unwrap();
        assert!(cli.verbose);
    }
}
