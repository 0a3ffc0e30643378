//! An in-memory ontology model: load an ontology, assert individuals, list their types.

use crate::http::{Client, HttpError};
use crate::inference::{ReasonerConfig, ReasoningError, materialize};
use crate::vocab::owl;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{
    Graph, GraphNameRef, IriParseError, NamedNode, NamedNodeRef, QuadRef, Term, Triple,
};
use oxigraph::store::{LoaderError, StorageError, Store};
use std::io::Read;
use tracing::{debug, info};

/// Media types asked for when fetching an ontology, by order of preference.
const ONTOLOGY_ACCEPT: &str =
    "text/turtle, application/rdf+xml;q=0.9, application/n-triples;q=0.8, application/ld+json;q=0.5";

#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Iri(#[from] IriParseError),
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
    #[error("The server returned an unsupported RDF media type: {0}")]
    UnsupportedMediaType(String),
}

/// RDF data about classes and individuals, kept in the default graph of an in-memory [`Store`].
#[derive(Clone)]
pub struct OntologyModel {
    store: Store,
}

impl OntologyModel {
    pub fn new() -> Result<Self, OntologyError> {
        Ok(Self {
            store: Store::new()?,
        })
    }

    /// The underlying store, e.g. to run SPARQL queries on the model.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn len(&self) -> Result<usize, OntologyError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, OntologyError> {
        Ok(self.store.is_empty()?)
    }

    /// Parses an RDF document into the model.
    pub fn read_from_reader(
        &self,
        format: RdfFormat,
        reader: impl Read,
        base_iri: Option<&str>,
    ) -> Result<(), OntologyError> {
        let mut parser = RdfParser::from_format(format).without_named_graphs();
        if let Some(base_iri) = base_iri {
            parser = parser.with_base_iri(base_iri)?;
        }
        self.store.load_from_reader(parser, reader)?;
        Ok(())
    }

    /// Fetches an ontology document and loads it into the model.
    ///
    /// The parser is chosen from the response `Content-Type` and the URL is used as base IRI.
    pub fn read(&self, client: &Client, url: &str) -> Result<(), OntologyError> {
        info!(url, "fetching ontology");
        let (content_type, body) = client.get(url, ONTOLOGY_ACCEPT)?;
        let format = RdfFormat::from_media_type(&content_type)
            .ok_or(OntologyError::UnsupportedMediaType(content_type))?;
        self.read_from_reader(format, body, Some(url))?;
        info!(url, %format, triples = self.store.len()?, "ontology loaded");
        Ok(())
    }

    /// Returns the class if the model declares it as an OWL or RDFS class.
    pub fn ont_class(&self, iri: &str) -> Result<Option<NamedNode>, OntologyError> {
        let class = NamedNode::new(iri)?;
        for meta_class in [owl::CLASS, rdfs::CLASS] {
            if self.store.contains(QuadRef::new(
                &class,
                rdf::TYPE,
                meta_class,
                GraphNameRef::DefaultGraph,
            ))? {
                return Ok(Some(class));
            }
        }
        Ok(None)
    }

    /// Asserts that `iri` is an instance of `class`.
    pub fn create_individual(
        &self,
        iri: &str,
        class: NamedNodeRef<'_>,
    ) -> Result<NamedNode, OntologyError> {
        let individual = NamedNode::new(iri)?;
        self.store.insert(QuadRef::new(
            &individual,
            rdf::TYPE,
            class,
            GraphNameRef::DefaultGraph,
        ))?;
        debug!(individual = individual.as_str(), class = class.as_str(), "individual created");
        Ok(individual)
    }

    /// Lists the named types of the individual, sorted by IRI.
    ///
    /// With `direct` only the most specific types are returned,
    /// i.e. the ones that are not a strict super class of another type of the individual.
    pub fn list_rdf_types(
        &self,
        individual: NamedNodeRef<'_>,
        direct: bool,
    ) -> Result<Vec<NamedNode>, OntologyError> {
        let mut types = Vec::new();
        for quad in self.store.quads_for_pattern(
            Some(individual.into()),
            Some(rdf::TYPE),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            if let Term::NamedNode(class) = quad?.object {
                types.push(class);
            }
        }
        types.sort();
        if direct {
            let mut direct_types = Vec::with_capacity(types.len());
            for class in &types {
                let mut is_direct = true;
                for other in &types {
                    if other != class
                        && self.is_sub_class_of(other.as_ref(), class.as_ref())?
                        && !self.is_sub_class_of(class.as_ref(), other.as_ref())?
                    {
                        is_direct = false;
                        break;
                    }
                }
                if is_direct {
                    direct_types.push(class.clone());
                }
            }
            types = direct_types;
        }
        Ok(types)
    }

    fn is_sub_class_of(
        &self,
        sub: NamedNodeRef<'_>,
        sup: NamedNodeRef<'_>,
    ) -> Result<bool, StorageError> {
        self.store.contains(QuadRef::new(
            sub,
            rdfs::SUB_CLASS_OF,
            sup,
            GraphNameRef::DefaultGraph,
        ))
    }

    /// Builds a new model containing this model content and everything the inference rules derive from it.
    ///
    /// The new model is a snapshot: later changes to `self` are not reflected in it.
    pub fn with_inference(&self, config: &ReasonerConfig) -> Result<Self, OntologyError> {
        let mut graph = Graph::new();
        for quad in self.store.quads_for_pattern(
            None,
            None,
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            graph.insert(&Triple::from(quad?));
        }
        let inference = materialize(&graph, config)?;
        info!(
            inferred = inference.inferred,
            rounds = inference.rounds,
            "inference done"
        );
        let inferred = Self::new()?;
        for triple in &inference.graph {
            inferred
                .store
                .insert(triple.in_graph(GraphNameRef::DefaultGraph))?;
        }
        Ok(inferred)
    }
}
