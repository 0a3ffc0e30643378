#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use oxhttp::model::header::ACCEPT;
use oxhttp::model::{Method, StatusCode};
use oxigraph::io::RdfFormat;
use oxigraph::model::NamedNode;
use oxigraph::model::vocab::rdfs;
use rdfwalk::http::{Client, DEFAULT_REDIRECTION_LIMIT, HttpError};
use rdfwalk::vocab::{owl, prov};
use rdfwalk::{OntologyError, OntologyModel, ReasonerConfig};
use std::error::Error;
use std::time::Duration;
use support::TestServer;

mod support;

const PROV_EXCERPT: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix prov: <http://www.w3.org/ns/prov#> .

<http://www.w3.org/ns/prov-o#> a owl:Ontology .
prov:Agent a owl:Class ; rdfs:label "Agent" .
prov:Person a owl:Class ; rdfs:label "Person" ; rdfs:subClassOf prov:Agent .
prov:Organization a owl:Class ; rdfs:subClassOf prov:Agent .
prov:actedOnBehalfOf a owl:ObjectProperty ; rdfs:domain prov:Agent ; rdfs:range prov:Agent .
"#;

const JOHN: &str = "http://example.org/john";

fn prov_model() -> Result<OntologyModel, OntologyError> {
    let model = OntologyModel::new()?;
    model.read_from_reader(RdfFormat::Turtle, PROV_EXCERPT.as_bytes(), None)?;
    Ok(model)
}

#[test]
fn inference_adds_super_types() -> Result<(), Box<dyn Error>> {
    let model = prov_model()?;
    let person = model
        .ont_class(prov::PERSON.as_str())?
        .ok_or("prov:Person should be declared")?;
    let john = model.create_individual(JOHN, person.as_ref())?;

    let asserted = model.list_rdf_types(john.as_ref(), false)?;
    assert_eq!(asserted, vec![prov::PERSON.into_owned()]);

    let inferred = model
        .with_inference(&ReasonerConfig::default())?
        .list_rdf_types(john.as_ref(), false)?;
    for class in [prov::PERSON, prov::AGENT, owl::THING, rdfs::RESOURCE] {
        assert!(inferred.contains(&class.into_owned()), "missing {class}");
    }
    assert!(asserted.iter().all(|class| inferred.contains(class)));
    assert!(inferred.len() > asserted.len());
    Ok(())
}

#[test]
fn direct_types_only_keep_the_most_specific() -> Result<(), Box<dyn Error>> {
    let model = prov_model()?;
    let john = model.create_individual(JOHN, prov::PERSON)?;
    let inferred = model.with_inference(&ReasonerConfig::default())?;
    assert_eq!(
        inferred.list_rdf_types(john.as_ref(), true)?,
        vec![prov::PERSON.into_owned()]
    );
    Ok(())
}

#[test]
fn inference_model_is_a_snapshot() -> Result<(), Box<dyn Error>> {
    let model = prov_model()?;
    let inferred = model.with_inference(&ReasonerConfig::default())?;
    let john = model.create_individual(JOHN, prov::PERSON)?;
    assert!(inferred.list_rdf_types(john.as_ref(), false)?.is_empty());
    assert!(inferred.len()? > model.len()?);
    Ok(())
}

#[test]
fn unknown_class_is_not_found() -> Result<(), Box<dyn Error>> {
    let model = prov_model()?;
    assert_eq!(
        model.ont_class("http://www.w3.org/ns/prov#Robot")?,
        None::<NamedNode>
    );
    // Properties are not classes.
    assert_eq!(
        model.ont_class("http://www.w3.org/ns/prov#actedOnBehalfOf")?,
        None::<NamedNode>
    );
    Ok(())
}

#[test]
fn relative_iris_are_resolved_against_the_base() -> Result<(), Box<dyn Error>> {
    let model = OntologyModel::new()?;
    model.read_from_reader(
        RdfFormat::Turtle,
        "<#Thing> a <http://www.w3.org/2002/07/owl#Class> .".as_bytes(),
        Some("http://example.org/onto"),
    )?;
    assert!(model.ont_class("http://example.org/onto#Thing")?.is_some());
    Ok(())
}

#[test]
fn read_fetches_and_negotiates_the_format() -> Result<(), Box<dyn Error>> {
    let server = TestServer::spawn(|request| {
        let accepts_turtle = request
            .headers()
            .get(ACCEPT)
            .and_then(|accept| accept.to_str().ok())
            .is_some_and(|accept| accept.contains("text/turtle"));
        if request.method() == Method::GET && accepts_turtle {
            support::ok("text/turtle; charset=utf-8", PROV_EXCERPT)
        } else {
            support::error(StatusCode::NOT_ACCEPTABLE, "Not Acceptable")
        }
    })?;
    let client = Client::new(Some(Duration::from_secs(10)), DEFAULT_REDIRECTION_LIMIT)?;
    let model = OntologyModel::new()?;
    model.read(&client, &server.url("/ns/prov-o"))?;
    assert!(model.ont_class(prov::AGENT.as_str())?.is_some());
    Ok(())
}

#[test]
fn read_reports_unsupported_media_types() -> Result<(), Box<dyn Error>> {
    let server = TestServer::spawn(|_| support::ok("text/html", "<html></html>"))?;
    let client = Client::new(Some(Duration::from_secs(10)), DEFAULT_REDIRECTION_LIMIT)?;
    let model = OntologyModel::new()?;
    assert!(matches!(
        model.read(&client, &server.url("/ns/prov-o")),
        Err(OntologyError::UnsupportedMediaType(media_type)) if media_type == "text/html"
    ));
    Ok(())
}

#[test]
fn read_reports_http_errors() -> Result<(), Box<dyn Error>> {
    let server = TestServer::spawn(|_| support::error(StatusCode::NOT_FOUND, "no such ontology"))?;
    let client = Client::new(Some(Duration::from_secs(10)), DEFAULT_REDIRECTION_LIMIT)?;
    let model = OntologyModel::new()?;
    match model.read(&client, &server.url("/missing")) {
        Err(OntologyError::Http(HttpError::Status {
            status, payload, ..
        })) => {
            assert_eq!(status, 404);
            assert_eq!(payload, "no such ontology");
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }
    Ok(())
}
