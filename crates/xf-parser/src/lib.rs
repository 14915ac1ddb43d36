mod emit;
mod xml;

pub use emit::{write_document, WriteOptions};
pub use xml::{
    parse_document, parse_markup, MarkupDocument, MarkupElement, MarkupNode, MarkupText,
};
