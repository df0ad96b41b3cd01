use thiserror::Error;
use xflow_xml::XmlError;

#[derive(Error, Debug)]
pub enum XsltError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] XmlError),

    #[error("Stylesheet compilation error: {0}")]
    Compilation(String),

    #[error("Transform execution error: {0}")]
    Execution(String),
}
