mod cli;
mod exit_codes;
mod list;
mod logging;
mod output;
mod run;
mod run_error;
mod scenarios;

use clap::Parser;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    exit_codes::ExitCode::Success.as_i32()
                }
                _ => exit_codes::ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    if let Err(err) = logging::init(cli.log_format, cli.log_file.as_deref()) {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::ExitCode::RuntimeError.as_i32());
    }

    let res = match cli.command {
        cli::Command::Run(args) => run::run(args).await,
        cli::Command::List(args) => list::list(args).map(|()| exit_codes::ExitCode::Success),
    };

    let code = match res {
        Ok(code) => code.as_i32(),
        Err(err) => {
            eprintln!("{err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}
