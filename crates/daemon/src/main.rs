// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Glob, Health, Lookup, Mkdir, Rm, Serve, WhichAccess};

command_enum! {
    (Serve, Serve),
    (Health, Health),
    (Lookup, Lookup),
    (Glob, Glob),
    (WhichAccess, WhichAccess),
    (Mkdir, Mkdir),
    (Rm, Rm),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let ctx = cli::op::OpContext::new(args.remote, args.user, args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
