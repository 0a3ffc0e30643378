//! A minimal [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/) client.

use crate::http::{Client, HttpError};
use crate::results::{Prefixes, Solutions};
use oxigraph::sparql::results::{
    QueryResultsFormat, QueryResultsParseError, QueryResultsParser, ReaderQueryResultsParserOutput,
};
use oxigraph::sparql::{SparqlEvaluator, SparqlSyntaxError};
use std::io::{self, Write};
use tracing::{debug, info};

/// Query endpoint of a local Fuseki server started with `fuseki-server --update --mem /ds`.
pub const DEFAULT_QUERY_ENDPOINT: &str = "http://localhost:3030/ds/query";
/// Update endpoint of a local Fuseki server started with `fuseki-server --update --mem /ds`.
pub const DEFAULT_UPDATE_ENDPOINT: &str = "http://localhost:3030/ds/update";

/// Returns every triple of the default graph.
pub const ALL_TRIPLES_QUERY: &str = "SELECT * WHERE {?x ?r ?y}";

const RESULTS_ACCEPT: &str = "application/sparql-results+json, application/sparql-results+xml;q=0.9, text/tab-separated-values;q=0.8";

/// IRI of the book added by [`book_update`].
pub fn book_iri(id: &str) -> String {
    format!("http://example/{id}")
}

/// A SPARQL update adding a new book to the collection.
pub fn book_update(id: &str) -> String {
    format!(
        "PREFIX dc: <http://purl.org/dc/elements/1.1/> INSERT DATA {{ <{}> dc:title \"A new book\" ; dc:creator \"A.N.Other\" . }}",
        book_iri(id)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    #[error(transparent)]
    Results(#[from] QueryResultsParseError),
    #[error("The server returned an unsupported query results media type: {0}")]
    UnsupportedMediaType(String),
}

/// The results of a remote query.
#[derive(Debug)]
pub enum RemoteResults {
    Solutions(Solutions),
    Boolean(bool),
}

impl RemoteResults {
    /// Writes the solutions as a table, or the boolean on its own line.
    pub fn write<W: Write>(&self, mut writer: W, prefixes: &Prefixes) -> io::Result<W> {
        match self {
            Self::Solutions(solutions) => solutions.write_table(writer, prefixes),
            Self::Boolean(value) => {
                writeln!(writer, "{value}")?;
                Ok(writer)
            }
        }
    }
}

/// A triple store reachable through its SPARQL query and update endpoints.
#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    query_endpoint: String,
    update_endpoint: String,
}

impl RemoteStore {
    pub fn new(
        client: Client,
        query_endpoint: impl Into<String>,
        update_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            query_endpoint: query_endpoint.into(),
            update_endpoint: update_endpoint.into(),
        }
    }

    pub fn query_endpoint(&self) -> &str {
        &self.query_endpoint
    }

    pub fn update_endpoint(&self) -> &str {
        &self.update_endpoint
    }

    /// Sends a SPARQL update to the update endpoint.
    ///
    /// The update is parsed first so that syntax errors are reported without any network exchange.
    pub fn update(&self, update: &str) -> Result<(), RemoteError> {
        SparqlEvaluator::new().parse_update(update).map(drop)?;
        info!(endpoint = self.update_endpoint.as_str(), "sending SPARQL update");
        self.client.post(
            &self.update_endpoint,
            update.as_bytes().to_vec(),
            "application/sparql-update",
            "*/*",
        )?;
        Ok(())
    }

    /// Sends a SPARQL SELECT or ASK query to the query endpoint and reads all the results.
    ///
    /// Columns are listed in order of first appearance in the query, whatever order the server uses.
    pub fn query(&self, query: &str) -> Result<RemoteResults, RemoteError> {
        SparqlEvaluator::new().parse_query(query).map(drop)?;
        info!(endpoint = self.query_endpoint.as_str(), "sending SPARQL query");
        let (content_type, body) = self.client.post(
            &self.query_endpoint,
            query.as_bytes().to_vec(),
            "application/sparql-query",
            RESULTS_ACCEPT,
        )?;
        let format = QueryResultsFormat::from_media_type(&content_type)
            .ok_or(RemoteError::UnsupportedMediaType(content_type))?;
        match QueryResultsParser::from_format(format).for_reader(body)? {
            ReaderQueryResultsParserOutput::Solutions(solutions) => {
                let variables = solutions.variables().to_vec();
                let solutions = solutions.collect::<Result<Vec<_>, _>>()?;
                debug!(
                    solutions = solutions.len(),
                    format = format.name(),
                    "remote query results read"
                );
                Ok(RemoteResults::Solutions(
                    Solutions {
                        variables,
                        solutions,
                    }
                    .in_query_order(query),
                ))
            }
            ReaderQueryResultsParserOutput::Boolean(value) => Ok(RemoteResults::Boolean(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DEFAULT_REDIRECTION_LIMIT;

    #[test]
    fn book_update_is_valid_sparql() -> Result<(), SparqlSyntaxError> {
        SparqlEvaluator::new()
            .parse_update(&book_update("1234"))
            .map(drop)
    }

    #[test]
    fn book_update_targets_book_iri() {
        assert!(book_update("abc").contains("<http://example/abc> dc:title \"A new book\""));
    }

    #[test]
    fn invalid_update_is_rejected_locally() -> Result<(), HttpError> {
        // Nothing listens on the discard port: reaching the network would be an HTTP error.
        let store = RemoteStore::new(
            Client::new(None, DEFAULT_REDIRECTION_LIMIT)?,
            "http://localhost:9/query",
            "http://localhost:9/update",
        );
        assert!(matches!(
            store.update(&book_update("not an iri")),
            Err(RemoteError::Syntax(_))
        ));
        assert!(matches!(
            store.query("SELECT WHERE"),
            Err(RemoteError::Syntax(_))
        ));
        Ok(())
    }
}
