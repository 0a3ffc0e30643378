//! A small forward chainer implementing a "micro" subset of the OWL 2 RL rules.
//!
//! It covers what is needed to see inference at work on a published ontology:
//! class and property hierarchies, domains and ranges, inverse, symmetric and
//! transitive properties. Restrictions, equality and consistency checking are
//! left out.
//!
//! ```
//! use oxigraph::model::vocab::{rdf, rdfs};
//! use oxigraph::model::{Graph, NamedNodeRef, TripleRef};
//! use rdfwalk::inference::{materialize, ReasonerConfig};
//!
//! let person = NamedNodeRef::new("http://example.com/Person")?;
//! let agent = NamedNodeRef::new("http://example.com/Agent")?;
//! let bob = NamedNodeRef::new("http://example.com/bob")?;
//! let mut graph = Graph::new();
//! graph.insert(TripleRef::new(person, rdfs::SUB_CLASS_OF, agent));
//! graph.insert(TripleRef::new(bob, rdf::TYPE, person));
//!
//! let inference = materialize(&graph, &ReasonerConfig::default())?;
//! assert!(inference.graph.contains(TripleRef::new(bob, rdf::TYPE, agent)));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::vocab::owl;
use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{
    Graph, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, Term, TermRef, Triple, TripleRef,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;
use tracing::{debug, warn};

/// Bounds on the work done by [`materialize`].
#[derive(Debug, Clone)]
pub struct ReasonerConfig {
    /// Maximum number of rule application rounds.
    pub max_iterations: usize,
    /// Maximum number of inferred triples (None = unlimited).
    pub max_inferred_triples: Option<usize>,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            max_inferred_triples: Some(1_000_000),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("Materialization limit exceeded ({0} triples)")]
    TooManyInferredTriples(usize),
}

/// The outcome of [`materialize`].
#[derive(Debug, Clone)]
pub struct Inference {
    /// The input graph and everything inferred from it.
    pub graph: Graph,
    /// Number of triples added to the input graph.
    pub inferred: usize,
    /// Number of rounds run.
    pub rounds: usize,
    /// If no rule produced anything new in the last round.
    pub saturated: bool,
}

/// Computes the closure of `graph` under the micro rule set.
pub fn materialize(graph: &Graph, config: &ReasonerConfig) -> Result<Inference, ReasoningError> {
    let mut graph = graph.clone();
    let mut inferred = 0;
    let mut rounds = 0;
    let mut saturated = false;
    while rounds < config.max_iterations {
        rounds += 1;
        let schema = Schema::new(&graph);
        let mut new_triples = Vec::new();
        for triple in schema.closure_triples() {
            push_if_new(&graph, &mut new_triples, triple);
        }
        for triple in &graph {
            for derived in schema.apply(&graph, triple) {
                push_if_new(&graph, &mut new_triples, derived);
            }
        }
        let mut added = 0;
        for triple in &new_triples {
            if graph.insert(triple) {
                added += 1;
            }
        }
        inferred += added;
        debug!(round = rounds, added, "inference round");
        if let Some(limit) = config.max_inferred_triples {
            if inferred > limit {
                return Err(ReasoningError::TooManyInferredTriples(limit));
            }
        }
        if added == 0 {
            saturated = true;
            break;
        }
    }
    if !saturated {
        warn!(rounds, "inference stopped before reaching a fixpoint");
    }
    Ok(Inference {
        graph,
        inferred,
        rounds,
        saturated,
    })
}

fn push_if_new(graph: &Graph, new_triples: &mut Vec<Triple>, triple: Triple) {
    if !graph.contains(&triple) {
        new_triples.push(triple);
    }
}

/// The terminological part of a graph, with hierarchies already closed.
#[derive(Default)]
struct Schema {
    super_classes: FxHashMap<Term, FxHashSet<Term>>,
    super_properties: FxHashMap<NamedNode, FxHashSet<NamedNode>>,
    domains: FxHashMap<NamedNode, FxHashSet<Term>>,
    ranges: FxHashMap<NamedNode, FxHashSet<Term>>,
    inverses: FxHashMap<NamedNode, FxHashSet<NamedNode>>,
    symmetric: FxHashSet<NamedNode>,
    transitive: FxHashSet<NamedNode>,
    owl_classes: FxHashSet<Term>,
}

impl Schema {
    fn new(graph: &Graph) -> Self {
        let mut schema = Self::default();
        let mut sub_class_of = FxHashMap::<Term, FxHashSet<Term>>::default();
        let mut sub_property_of = FxHashMap::<NamedNode, FxHashSet<NamedNode>>::default();
        for triple in graph {
            let subject = TermRef::from(triple.subject);
            let predicate = triple.predicate;
            let object = triple.object;
            if predicate == rdfs::SUB_CLASS_OF {
                add_edge(&mut sub_class_of, subject.into_owned(), object.into_owned());
            } else if predicate == owl::EQUIVALENT_CLASS {
                add_edge(&mut sub_class_of, subject.into_owned(), object.into_owned());
                add_edge(&mut sub_class_of, object.into_owned(), subject.into_owned());
            } else if predicate == rdf::TYPE && object == TermRef::from(owl::CLASS) {
                schema.owl_classes.insert(subject.into_owned());
            }
            let (Some(subject), Some(object)) = (as_property(subject), as_property(object)) else {
                continue;
            };
            if predicate == rdfs::SUB_PROPERTY_OF {
                add_edge(&mut sub_property_of, subject.into_owned(), object.into_owned());
            } else if predicate == owl::EQUIVALENT_PROPERTY {
                add_edge(&mut sub_property_of, subject.into_owned(), object.into_owned());
                add_edge(&mut sub_property_of, object.into_owned(), subject.into_owned());
            } else if predicate == owl::INVERSE_OF {
                add_edge(&mut schema.inverses, subject.into_owned(), object.into_owned());
                add_edge(&mut schema.inverses, object.into_owned(), subject.into_owned());
            } else if predicate == rdf::TYPE && object == owl::SYMMETRIC_PROPERTY {
                schema.symmetric.insert(subject.into_owned());
            } else if predicate == rdf::TYPE && object == owl::TRANSITIVE_PROPERTY {
                schema.transitive.insert(subject.into_owned());
            }
        }
        for triple in graph.triples_for_predicate(rdfs::DOMAIN) {
            if let Some(property) = as_property(triple.subject.into()) {
                add_edge(
                    &mut schema.domains,
                    property.into_owned(),
                    triple.object.into_owned(),
                );
            }
        }
        for triple in graph.triples_for_predicate(rdfs::RANGE) {
            if let Some(property) = as_property(triple.subject.into()) {
                add_edge(
                    &mut schema.ranges,
                    property.into_owned(),
                    triple.object.into_owned(),
                );
            }
        }
        schema.super_classes = transitive_closure(&sub_class_of);
        let super_properties = transitive_closure(&sub_property_of);
        // Domains and ranges are inherited by sub-properties.
        for (property, supers) in &super_properties {
            for sup in supers {
                let domains = schema.domains.get(sup).cloned().unwrap_or_default();
                schema
                    .domains
                    .entry(property.clone())
                    .or_default()
                    .extend(domains);
                let ranges = schema.ranges.get(sup).cloned().unwrap_or_default();
                schema
                    .ranges
                    .entry(property.clone())
                    .or_default()
                    .extend(ranges);
            }
        }
        schema.super_properties = super_properties;
        schema
    }

    /// scm-sco and scm-spo: the closed hierarchies as triples.
    fn closure_triples(&self) -> Vec<Triple> {
        let mut triples = Vec::new();
        for (class, supers) in &self.super_classes {
            let Some(class) = as_resource(class.as_ref()) else {
                continue;
            };
            for sup in supers {
                triples.push(Triple::new(class.into_owned(), rdfs::SUB_CLASS_OF, sup.clone()));
            }
        }
        // scm-cls, plus rdfs8 since every OWL class is an RDFS class
        for class in &self.owl_classes {
            let Some(class) = as_resource(class.as_ref()) else {
                continue;
            };
            for top in [owl::THING, rdfs::RESOURCE] {
                if class != NamedOrBlankNodeRef::from(top) {
                    triples.push(Triple::new(
                        class.into_owned(),
                        rdfs::SUB_CLASS_OF,
                        top.into_owned(),
                    ));
                }
            }
        }
        for (property, supers) in &self.super_properties {
            for sup in supers {
                triples.push(Triple::new(
                    property.clone(),
                    rdfs::SUB_PROPERTY_OF,
                    sup.clone(),
                ));
            }
        }
        triples
    }

    /// Applies the instance level rules to one triple.
    fn apply(&self, graph: &Graph, triple: TripleRef<'_>) -> Vec<Triple> {
        let mut derived = Vec::new();
        let subject = triple.subject;
        let predicate = triple.predicate;
        let object = triple.object;

        if predicate == rdf::TYPE {
            // cax-sco
            if let Some(supers) = self.super_classes.get(&object.into_owned()) {
                for sup in supers {
                    derived.push(Triple::new(subject.into_owned(), rdf::TYPE, sup.clone()));
                }
            }
            if self.owl_classes.contains(&object.into_owned()) {
                derived.push(Triple::new(
                    subject.into_owned(),
                    rdf::TYPE,
                    owl::THING.into_owned(),
                ));
            }
            derived.push(Triple::new(
                subject.into_owned(),
                rdf::TYPE,
                rdfs::RESOURCE.into_owned(),
            ));
        }

        // prp-spo1
        if let Some(supers) = self.super_properties.get(&predicate.into_owned()) {
            for sup in supers {
                derived.push(Triple::new(subject.into_owned(), sup.clone(), object.into_owned()));
            }
        }
        // prp-dom
        if let Some(domains) = self.domains.get(&predicate.into_owned()) {
            for domain in domains {
                derived.push(Triple::new(subject.into_owned(), rdf::TYPE, domain.clone()));
            }
        }

        let Some(object) = as_resource(object) else {
            return derived;
        };
        // prp-rng
        if let Some(ranges) = self.ranges.get(&predicate.into_owned()) {
            for range in ranges {
                derived.push(Triple::new(object.into_owned(), rdf::TYPE, range.clone()));
            }
        }
        // prp-inv1 and prp-inv2
        if let Some(inverses) = self.inverses.get(&predicate.into_owned()) {
            for inverse in inverses {
                derived.push(Triple::new(
                    object.into_owned(),
                    inverse.clone(),
                    subject.into_owned(),
                ));
            }
        }
        // prp-symp
        if self.symmetric.contains(&predicate.into_owned()) {
            derived.push(Triple::new(
                object.into_owned(),
                predicate.into_owned(),
                subject.into_owned(),
            ));
        }
        // prp-trp
        if self.transitive.contains(&predicate.into_owned()) {
            for next in graph.objects_for_subject_predicate(object, predicate) {
                derived.push(Triple::new(
                    subject.into_owned(),
                    predicate.into_owned(),
                    next.into_owned(),
                ));
            }
        }
        derived
    }
}

fn add_edge<K: Eq + Hash, V: Eq + Hash>(edges: &mut FxHashMap<K, FxHashSet<V>>, from: K, to: V) {
    edges.entry(from).or_default().insert(to);
}

/// For each node, every node reachable through at least one edge, the node itself excluded.
fn transitive_closure<T: Clone + Eq + Hash>(
    edges: &FxHashMap<T, FxHashSet<T>>,
) -> FxHashMap<T, FxHashSet<T>> {
    let mut closure = FxHashMap::default();
    for start in edges.keys() {
        let mut reached = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in edges.get(node).into_iter().flatten() {
                if next != start && reached.insert(next.clone()) {
                    stack.push(next);
                }
            }
        }
        closure.insert(start.clone(), reached);
    }
    closure
}

fn as_resource(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node.into()),
        TermRef::BlankNode(node) => Some(node.into()),
        _ => None,
    }
}

fn as_property(term: TermRef<'_>) -> Option<NamedNodeRef<'_>> {
    if let TermRef::NamedNode(node) = term {
        Some(node)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn materialized(triples: &[(NamedNode, NamedNodeRef<'_>, NamedNode)]) -> Graph {
        let mut graph = Graph::new();
        for (subject, predicate, object) in triples {
            graph.insert(TripleRef::new(subject, *predicate, object));
        }
        materialize(&graph, &ReasonerConfig::default())
            .map(|inference| inference.graph)
            .unwrap_or_default()
    }

    #[test]
    fn class_hierarchy_is_transitive() {
        let graph = materialized(&[
            (node("Student"), rdfs::SUB_CLASS_OF, node("Person")),
            (node("Person"), rdfs::SUB_CLASS_OF, node("Agent")),
            (node("alice"), rdf::TYPE, node("Student")),
        ]);
        assert!(graph.contains(TripleRef::new(
            &node("Student"),
            rdfs::SUB_CLASS_OF,
            &node("Agent")
        )));
        assert!(graph.contains(TripleRef::new(&node("alice"), rdf::TYPE, &node("Agent"))));
        assert!(graph.contains(TripleRef::new(&node("alice"), rdf::TYPE, rdfs::RESOURCE)));
    }

    #[test]
    fn equivalent_classes_share_instances() {
        let graph = materialized(&[
            (node("Human"), owl::EQUIVALENT_CLASS, node("Person")),
            (node("bob"), rdf::TYPE, node("Person")),
        ]);
        assert!(graph.contains(TripleRef::new(&node("bob"), rdf::TYPE, &node("Human"))));
    }

    #[test]
    fn owl_class_instances_are_things() {
        let graph = materialized(&[
            (node("Person"), rdf::TYPE, owl::CLASS.into_owned()),
            (node("bob"), rdf::TYPE, node("Person")),
        ]);
        assert!(graph.contains(TripleRef::new(&node("bob"), rdf::TYPE, owl::THING)));
        assert!(!graph.contains(TripleRef::new(&node("Person"), rdf::TYPE, owl::THING)));
        assert!(graph.contains(TripleRef::new(&node("Person"), rdfs::SUB_CLASS_OF, owl::THING)));
    }

    #[test]
    fn domain_and_range_type_both_ends() {
        let graph = materialized(&[
            (node("wasAttributedTo"), rdfs::DOMAIN, node("Entity")),
            (node("wasAttributedTo"), rdfs::RANGE, node("Agent")),
            (node("report"), node("wasAttributedTo").as_ref(), node("bob")),
        ]);
        assert!(graph.contains(TripleRef::new(&node("report"), rdf::TYPE, &node("Entity"))));
        assert!(graph.contains(TripleRef::new(&node("bob"), rdf::TYPE, &node("Agent"))));
    }

    #[test]
    fn sub_properties_inherit_values_and_domains() {
        let graph = materialized(&[
            (node("wasQuotedFrom"), rdfs::SUB_PROPERTY_OF, node("wasDerivedFrom")),
            (node("wasDerivedFrom"), rdfs::DOMAIN, node("Entity")),
            (node("quote"), node("wasQuotedFrom").as_ref(), node("speech")),
        ]);
        assert!(graph.contains(TripleRef::new(
            &node("quote"),
            &node("wasDerivedFrom"),
            &node("speech")
        )));
        assert!(graph.contains(TripleRef::new(&node("quote"), rdf::TYPE, &node("Entity"))));
    }

    #[test]
    fn inverse_symmetric_and_transitive_properties() {
        let graph = materialized(&[
            (node("generated"), owl::INVERSE_OF, node("wasGeneratedBy")),
            (node("knows"), rdf::TYPE, owl::SYMMETRIC_PROPERTY.into_owned()),
            (node("partOf"), rdf::TYPE, owl::TRANSITIVE_PROPERTY.into_owned()),
            (node("run"), node("generated").as_ref(), node("file")),
            (node("alice"), node("knows").as_ref(), node("bob")),
            (node("a"), node("partOf").as_ref(), node("b")),
            (node("b"), node("partOf").as_ref(), node("c")),
            (node("c"), node("partOf").as_ref(), node("d")),
        ]);
        assert!(graph.contains(TripleRef::new(
            &node("file"),
            &node("wasGeneratedBy"),
            &node("run")
        )));
        assert!(graph.contains(TripleRef::new(&node("bob"), &node("knows"), &node("alice"))));
        assert!(graph.contains(TripleRef::new(&node("a"), &node("partOf"), &node("d"))));
    }

    #[test]
    fn cyclic_hierarchies_terminate() {
        let mut graph = Graph::new();
        graph.insert(TripleRef::new(&node("A"), rdfs::SUB_CLASS_OF, &node("B")));
        graph.insert(TripleRef::new(&node("B"), rdfs::SUB_CLASS_OF, &node("A")));
        graph.insert(TripleRef::new(&node("x"), rdf::TYPE, &node("A")));
        let inference = materialize(&graph, &ReasonerConfig::default());
        assert!(inference.as_ref().is_ok_and(|inference| inference.saturated));
    }

    #[test]
    fn materialization_limit_is_enforced() {
        let mut graph = Graph::new();
        graph.insert(TripleRef::new(&node("A"), rdfs::SUB_CLASS_OF, &node("B")));
        graph.insert(TripleRef::new(&node("x"), rdf::TYPE, &node("A")));
        let config = ReasonerConfig {
            max_inferred_triples: Some(1),
            ..ReasonerConfig::default()
        };
        assert!(matches!(
            materialize(&graph, &config),
            Err(ReasoningError::TooManyInferredTriples(1))
        ));
    }
}
