use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rif-installer")]
#[command(version)]
#[command(
    about = "Install the Rapid Inquiry Facility database, web archives and startup properties",
    long_about = None
)]
struct Cli {
    /// Packaged install: development mode off, scripts and WAR files taken from the base directory
    #[arg(long, env = "RIF_INSTALLER_BUNDLED")]
    bundled: bool,
    /// Base directory holding install.toml (defaults to the executable's directory when bundled, else the working directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Transcript of everything shown on the console
    #[arg(long, default_value = "install.log")]
    log_file: PathBuf,
    /// Also print diagnostic log records
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let code = rif_installer::run(rif_installer::RunOptions {
        bundled: cli.bundled,
        base_dir: cli.base_dir,
        log_file: cli.log_file,
        verbose: cli.verbose,
    });
    std::process::exit(code);
}
