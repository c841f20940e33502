//! Argument parsing for the pomsolve binary.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pomsolve",
    version,
    about = "Resolve a Maven POM's transitive dependency graph"
)]
pub struct Args {
    /// Path to the pom.xml to resolve.
    pub pom: PathBuf,

    /// Follow optional dependencies.
    #[arg(long)]
    pub optional: bool,

    /// Keep resolving when individual dependencies fail.
    #[arg(long)]
    pub keep_going: bool,

    /// Active profile ids.
    #[arg(long, value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Workspace cache store; omit to cache in memory only.
    #[arg(long)]
    pub cache: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
