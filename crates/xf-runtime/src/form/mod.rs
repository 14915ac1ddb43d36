mod actions;
mod binder;
mod builder;
mod expand;
mod model;
mod reader;

pub use actions::{FieldView, GroupKind, GroupView, RemovalOutcome, RemovalPrompt};
pub use expand::{initialize_form, initialize_form_with_options, InitializeOptions};
pub use model::LiveForm;
pub use reader::{collect_values, serialize_form, ValuePair};

#[cfg(test)]
mod tests;
