//! Reading and writing the MathML 2 content subset used by SBML.

pub mod reader;
pub mod stream;
pub mod writer;

pub use reader::{read_math_from_str, MathMLReader};
pub use stream::{XmlInputStream, XmlOutputStream, XmlStreamError, XmlToken};
pub use writer::{format_real, write_math_to_string, write_node_to_string, MathMLWriter};
