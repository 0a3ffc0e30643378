#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod http;
pub mod inference;
pub mod ontology;
pub mod remote;
pub mod results;
pub mod travel;
pub mod vocab;

pub use http::{Client, HttpError};
pub use inference::{Inference, ReasonerConfig, ReasoningError};
pub use ontology::{OntologyError, OntologyModel};
pub use remote::{RemoteError, RemoteResults, RemoteStore};
pub use results::{Prefixes, Solutions};
