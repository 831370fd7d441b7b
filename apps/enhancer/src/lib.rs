//! Resume Enhancer.
//!
//! A web service that scores a resume against a job description and rewrites it
//! with hosted language models, plus a CLI for managing a vector-document
//! collection store. See the `enhancer` and `collections` binaries.

pub mod analysis;
pub mod collections;
pub mod config;
pub mod documents;
pub mod enhance;
pub mod errors;
pub mod llm_client;
pub mod routes;
pub mod session;
pub mod state;
