//! Matching module containing the similarity scorer and candidate resolver

pub mod resolver;
pub mod similarity;

pub use resolver::*;
