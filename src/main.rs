use clap::Parser;
use std::process::ExitCode;
use vdt::cli::{commands, Cli, Commands};

fn main() -> ExitCode {
    // Install miette's fancy error handler for readable diagnostics
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }));

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::run(args, dir),
        Commands::Batch(args) => commands::batch::run(args, dir),
        Commands::Validate(args) => commands::validate::run(args, dir),
        Commands::Serve(args) => commands::serve::run(args, dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
