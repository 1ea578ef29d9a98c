use crate::commands::get::{handle_get, GetArgs};
use crate::commands::post::{handle_post, PostArgs};
use crate::commands::put::{handle_put, PutArgs};
use crate::commands::version::handle_version;
use crate::display::{print_info, print_success};
use anyhow::Result;
use clap::{Parser, Subcommand};
use lims_cli::{Script, ScriptArgs, SessionArgs};
use lims_core::Element;

#[derive(Parser, Debug)]
#[command(name = "lims")]
#[command(about = "Query and update a LIMS through its REST API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Mail the outcome to the configured recipients
    #[arg(short, long)]
    pub email: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl ScriptArgs for Cli {
    fn session(&self) -> Option<&SessionArgs> {
        Some(&self.session)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource and print it
    Get(GetArgs),
    /// Send a resource back to its own URI
    Put(PutArgs),
    /// Create a new resource
    Post(PostArgs),
    /// Show the registered endpoint and API version
    Version,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Get(_) => "get",
            Commands::Put(_) => "put",
            Commands::Post(_) => "post",
            Commands::Version => "version",
        }
    }
}

pub fn run_cli(script: &Script, cli: &Cli) -> Result<()> {
    let client = script.require_client()?;

    match &cli.command {
        Commands::Get(args) => print_element(&handle_get(client, args)?),
        Commands::Put(args) => {
            let updated = handle_put(client, args)?;
            print_success(&format!("Updated {}", args.file.display()));
            print_element(&updated)
        }
        Commands::Post(args) => {
            let created = handle_post(client, args)?;
            print_success(&format!("Created {}", created.get("uri").unwrap_or("resource")));
            print_element(&created)
        }
        Commands::Version => {
            print_info(&handle_version(client));
            Ok(())
        }
    }
}

fn print_element(element: &Element) -> Result<()> {
    println!("{}", element.to_pretty_string()?);
    Ok(())
}
