//! XSLT 1.0 subset processor for the xflow filter.
//!
//! The filter core treats the transformation engine as a collaborator: it
//! compiles a stylesheet once and applies it to parsed documents. This crate
//! is that collaborator. It supports the template-rule subset the filter's
//! deployments use: `xsl:template` with simple match patterns,
//! `xsl:apply-templates`, `xsl:value-of`, `xsl:for-each`, `xsl:if`,
//! `xsl:text`, literal result elements with attribute value templates, and
//! `xsl:output` (method, media-type, encoding).

pub mod ast;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod pattern;

pub use ast::{CompiledStylesheet, OutputSpec};
pub use compiler::{compile, compile_bytes};
pub use error::XsltError;
