//! A toy travel graph: how to get from London to Paris.

use crate::results::{Prefixes, Solutions};
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphNameRef, IriParseError, NamedNode, QuadRef};
use oxigraph::sparql::{QueryEvaluationError, QueryResults, SparqlEvaluator, SparqlSyntaxError};
use oxigraph::store::{SerializerError, StorageError, Store};
use std::io::{self, Write};
use tracing::debug;

/// Namespace of the toy example.
pub const TRAVEL_NAMESPACE: &str = "http://example.com/travel#";

/// Prefix bound to [`TRAVEL_NAMESPACE`] in dumps and result tables.
pub const TRAVEL_PREFIX: &str = "tr";

/// Builds the full IRI of a name of the toy example.
///
/// `uri("")` is the namespace itself.
pub fn uri(local_name: &str) -> Result<NamedNode, IriParseError> {
    NamedNode::new(format!("{TRAVEL_NAMESPACE}{local_name}"))
}

pub fn prefixes() -> Prefixes {
    Prefixes::new().with_prefix(TRAVEL_PREFIX, TRAVEL_NAMESPACE)
}

/// All paths from somewhere to somewhere else in exactly two steps.
pub fn two_step_paths_query() -> String {
    format!(
        "PREFIX {TRAVEL_PREFIX}: <{TRAVEL_NAMESPACE}> SELECT * WHERE {{?a ?firstleg ?stopover . ?stopover ?secondleg ?b}}"
    )
}

/// An error raised while building the toy graph.
#[derive(Debug, thiserror::Error)]
pub enum TravelError {
    #[error(transparent)]
    Iri(#[from] IriParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Populates the default graph of the store with a few flights and trains.
pub fn add_travel_stuff(store: &Store) -> Result<(), TravelError> {
    let by_train = uri("ByTrain")?;
    let british_airways = uri("BritishAirways")?;
    let air_france = uri("AirFrance")?;
    let paris = uri("Paris")?;
    let heathrow = uri("Heathrow")?;
    let gatwick = uri("Gatwick")?;
    let london = uri("London")?;

    for (subject, predicate, object) in [
        (&heathrow, &british_airways, &paris),
        (&heathrow, &air_france, &paris),
        (&gatwick, &british_airways, &paris),
        (&london, &by_train, &heathrow),
        (&london, &by_train, &gatwick),
    ] {
        store.insert(QuadRef::new(
            subject,
            predicate,
            object,
            GraphNameRef::DefaultGraph,
        ))?;
    }
    debug!(triples = store.len()?, "travel graph populated");
    Ok(())
}

/// An error raised while serializing a graph.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("Invalid prefix namespace: {0}")]
    Prefix(#[from] IriParseError),
    #[error(transparent)]
    Serializer(#[from] SerializerError),
}

/// Writes the default graph of the store as Turtle, declaring the given prefixes.
pub fn dump<W: Write>(store: &Store, prefixes: &Prefixes, writer: W) -> Result<W, DumpError> {
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
    for (name, namespace) in prefixes.iter() {
        serializer = serializer.with_prefix(name, namespace)?;
    }
    Ok(store.dump_graph_to_writer(GraphNameRef::DefaultGraph, serializer, writer)?)
}

/// An error raised by a local SELECT query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Only SELECT queries are supported here")]
    NotSelect,
}

/// Evaluates a SELECT query against the store and collects all its solutions.
///
/// Columns are listed in order of first appearance in the query.
pub fn select(store: &Store, query: &str) -> Result<Solutions, QueryError> {
    let results = SparqlEvaluator::new()
        .parse_query(query)?
        .on_store(store)
        .execute()?;
    let QueryResults::Solutions(solutions) = results else {
        return Err(QueryError::NotSelect);
    };
    let variables = solutions.variables().to_vec();
    let solutions = solutions.collect::<Result<Vec<_>, _>>()?;
    debug!(solutions = solutions.len(), "local query evaluated");
    Ok(Solutions {
        variables,
        solutions,
    }
    .in_query_order(query))
}

/// Evaluates a SELECT query against the store and writes the solutions as a table.
pub fn dump_query_result<W: Write>(
    store: &Store,
    query: &str,
    prefixes: &Prefixes,
    writer: W,
) -> Result<W, QueryError> {
    Ok(select(store, query)?.write_table(writer, prefixes)?)
}
