//! pomsolve CLI binary.
//!
//! Parses a `pom.xml`, resolves its transitive dependency graph, and
//! prints the tree. Logging goes through `tracing` with the usual
//! `RUST_LOG` filtering.

mod cli;

use std::sync::Arc;

use miette::Result;

use pomsolve_fetch::cache;
use pomsolve_fetch::http::HttpDownloader;
use pomsolve_model::parse::parse_pom;
use pomsolve_resolver::graph::DependencyGraph;
use pomsolve_resolver::{ResolveOptions, Resolver};
use pomsolve_util::errors::PomError;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = cli::parse();

    let xml = std::fs::read_to_string(&args.pom).map_err(PomError::Io)?;
    let mut raw = parse_pom(&xml)?;
    raw.source = Some(args.pom.clone());

    let cache = cache::for_workspace(args.cache.as_deref())?;
    let downloader = Arc::new(HttpDownloader::new(cache, None)?);
    let mut resolver = Resolver::new(
        downloader,
        ResolveOptions {
            active_profiles: args.profiles,
            resolve_optional: args.optional,
            continue_on_error: args.keep_going,
            ..Default::default()
        },
    );

    let resolved = resolver.resolve(raw)?;
    print!("{}", DependencyGraph::from_pom(&resolved).print_tree());
    Ok(())
}
