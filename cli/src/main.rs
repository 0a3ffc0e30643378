use crate::cli::{Args, Command};
use anyhow::{Context, bail};
use clap::Parser;
use oxigraph::io::RdfFormat;
use oxigraph::store::Store;
use rdfwalk::http::DEFAULT_REDIRECTION_LIMIT;
use rdfwalk::remote::{ALL_TRIPLES_QUERY, book_update};
use rdfwalk::travel::{add_travel_stuff, dump, dump_query_result, prefixes, two_step_paths_query};
use rdfwalk::vocab::prov;
use rdfwalk::{Client, OntologyModel, Prefixes, ReasonerConfig, RemoteStore};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, IsTerminal, Write, stderr, stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    match args.command {
        Command::Local {
            ontology,
            ontology_file,
            ontology_format,
            individual,
            class,
            direct,
            timeout,
        } => {
            let source = match ontology_file {
                Some(path) => OntologySource::File {
                    format: if let Some(format) = ontology_format {
                        rdf_format_from_name(&format)?
                    } else {
                        rdf_format_from_path(&path)?
                    },
                    path,
                },
                None => OntologySource::Url(ontology.unwrap_or_else(|| prov::ONTOLOGY.into())),
            };
            local(&source, &individual, &class, direct, Duration::from_secs(timeout))
        }
        Command::Remote {
            query_endpoint,
            update_endpoint,
            id,
            timeout,
        } => {
            let client = Client::new(
                Some(Duration::from_secs(timeout)),
                DEFAULT_REDIRECTION_LIMIT,
            )?;
            let store = RemoteStore::new(client, query_endpoint, update_endpoint);
            remote(&store, &id.unwrap_or_else(|| Uuid::new_v4().to_string()))
        }
    }
}

/// Logs go to stderr so that they never mix with the printed graphs and tables.
///
/// Colors are only used when stderr is a terminal.
fn init_tracing(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("info"),
        Err(_) => EnvFilter::new("off"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_ansi(stderr().is_terminal())
        .with_target(false)
        .init();
}

enum OntologySource {
    Url(String),
    File { path: PathBuf, format: RdfFormat },
}

fn local(
    source: &OntologySource,
    individual: &str,
    class: &str,
    direct: bool,
    timeout: Duration,
) -> anyhow::Result<()> {
    let mut out = stdout().lock();

    let store = Store::new()?;
    add_travel_stuff(&store)?;
    let prefixes = prefixes();
    writeln!(out, "Our toy model:")?;
    let mut out = dump(&store, &prefixes, out)?;
    writeln!(out, "Find all paths from A to B in exactly two steps")?;
    let mut out = dump_query_result(&store, &two_step_paths_query(), &prefixes, out)?;

    let base = OntologyModel::new()?;
    match source {
        OntologySource::Url(url) => {
            let client = Client::new(Some(timeout), DEFAULT_REDIRECTION_LIMIT)?;
            base.read(&client, url)
                .with_context(|| format!("Failed to load the ontology from {url}"))?;
        }
        OntologySource::File { path, format } => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            base.read_from_reader(*format, BufReader::new(file), None)
                .with_context(|| format!("Failed to load the ontology from {}", path.display()))?;
        }
    }
    info!(triples = base.len()?, "ontology ready");
    let Some(class) = base.ont_class(class)? else {
        bail!("The class {class} is not declared by the ontology");
    };
    let individual = base.create_individual(individual, class.as_ref())?;
    let inf = base.with_inference(&ReasonerConfig::default())?;

    writeln!(out, "RDF types in the model without inference:")?;
    for rdf_type in base.list_rdf_types(individual.as_ref(), direct)? {
        writeln!(out, "  {} has type {}", individual.as_str(), rdf_type.as_str())?;
    }
    writeln!(out, "RDF types in the model with inference:")?;
    for rdf_type in inf.list_rdf_types(individual.as_ref(), direct)? {
        writeln!(out, "  {} has type {}", individual.as_str(), rdf_type.as_str())?;
    }
    out.flush()?;
    Ok(())
}

fn remote(store: &RemoteStore, id: &str) -> anyhow::Result<()> {
    let mut out = stdout().lock();
    writeln!(out, "Adding {id}")?;
    store
        .update(&book_update(id))
        .with_context(|| format!("Failed to update {}", store.update_endpoint()))?;
    let results = store
        .query(ALL_TRIPLES_QUERY)
        .with_context(|| format!("Failed to query {}", store.query_endpoint()))?;
    results.write(out, &Prefixes::new())?.flush()?;
    Ok(())
}

fn format_from_path<T>(
    path: &Path,
    from_extension: impl FnOnce(&str) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    if let Some(ext) = path.extension().and_then(OsStr::to_str) {
        from_extension(ext).map_err(|e| {
            e.context(format!(
                "Not able to guess the file format from file name extension '{ext}'"
            ))
        })
    } else {
        bail!(
            "The path {} has no extension to guess a file format from",
            path.display()
        )
    }
}

fn rdf_format_from_path(path: &Path) -> anyhow::Result<RdfFormat> {
    format_from_path(path, |ext| {
        RdfFormat::from_extension(ext)
            .with_context(|| format!("The file extension '{ext}' is unknown"))
    })
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}
