use clap::Parser;
use passvault::cli::commands::edit::EditArgs;
use passvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics go to stderr so piped output stays clean.
    // Set PASSVAULT_LOG=debug for more detail.
    let filter = EnvFilter::try_from_env("PASSVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => passvault::cli::commands::init::execute(&cli),
        Commands::List => passvault::cli::commands::list::execute(&cli),
        Commands::Show { ref entry, reveal } => {
            passvault::cli::commands::show::execute(&cli, entry, reveal)
        }
        Commands::Add {
            ref title,
            ref username,
            ref generate,
        } => passvault::cli::commands::add::execute(&cli, title, username, generate.as_deref()),
        Commands::Edit {
            ref entry,
            ref title,
            ref username,
            password,
            ref generate,
        } => passvault::cli::commands::edit::execute(
            &cli,
            &EditArgs {
                query: entry,
                title: title.as_deref(),
                username: username.as_deref(),
                prompt_password: password,
                generate: generate.as_deref(),
            },
        ),
        Commands::Delete { ref entry, force } => {
            passvault::cli::commands::delete::execute(&cli, entry, force)
        }
        Commands::Copy {
            ref entry,
            clear_after,
        } => passvault::cli::commands::copy::execute(&cli, entry, clear_after),
        Commands::Generate(ref args) => passvault::cli::commands::generate::execute(&cli, args),
        Commands::Passwd => passvault::cli::commands::passwd::execute(&cli),
        Commands::Audit { last, ref since } => {
            passvault::cli::commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { shell } => passvault::cli::commands::completions::execute(shell),
        Commands::Version => passvault::cli::commands::version::execute(),
    };

    if let Err(e) = result {
        passvault::cli::output::report(&e);
        std::process::exit(1);
    }
}
