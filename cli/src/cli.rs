use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdfwalk")]
/// Walk through RDF graphs, SPARQL queries and OWL inference
pub struct Args {
    /// Print progress and diagnostics on stderr
    ///
    /// The RUST_LOG environment variable takes precedence when set.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query a toy travel graph, then list the types of an individual with and without inference
    ///
    /// The travel graph and the two-step paths found in it are printed first.
    /// The ontology is then loaded, an individual of the given class is created
    /// and its RDF types are listed, first as asserted, then with inference.
    Local {
        /// URL of the ontology to load
        ///
        /// By default, PROV-O is downloaded from http://www.w3.org/ns/prov-o.
        #[arg(long, conflicts_with = "ontology_file", value_hint = ValueHint::Url)]
        ontology: Option<String>,
        /// File containing the ontology to load, instead of downloading it
        #[arg(long, value_hint = ValueHint::FilePath)]
        ontology_file: Option<PathBuf>,
        /// The format of the ontology file
        ///
        /// It can be an extension like "ttl" or a MIME type like "text/turtle".
        ///
        /// By default, the format is guessed from the file extension.
        #[arg(long, requires = "ontology_file")]
        ontology_format: Option<String>,
        /// IRI of the individual to create
        #[arg(long, default_value = "http://people/elmerfudd", value_hint = ValueHint::Url)]
        individual: String,
        /// IRI of the ontology class of the individual
        #[arg(long, default_value = "http://www.w3.org/ns/prov#Person", value_hint = ValueHint::Url)]
        class: String,
        /// Only list the most specific types of the individual
        #[arg(long)]
        direct: bool,
        /// Timeout of the ontology download in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// Add a new book to a remote triple store, then print all its triples
    ///
    /// The store is reached through the SPARQL 1.1 protocol.
    /// By default, it targets the /ds dataset of a local Fuseki server
    /// (e.g. started with `fuseki-server --update --mem /ds`).
    Remote {
        /// URL of the SPARQL query endpoint
        #[arg(long, default_value = "http://localhost:3030/ds/query", value_hint = ValueHint::Url)]
        query_endpoint: String,
        /// URL of the SPARQL update endpoint
        #[arg(long, default_value = "http://localhost:3030/ds/update", value_hint = ValueHint::Url)]
        update_endpoint: String,
        /// Identifier of the new book
        ///
        /// By default, a random UUID is used.
        #[arg(long)]
        id: Option<String>,
        /// Timeout of each HTTP request in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
}

