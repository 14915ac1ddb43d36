mod form;

pub use form::{
    collect_values, initialize_form, initialize_form_with_options, serialize_form, FieldView,
    GroupKind, GroupView, InitializeOptions, LiveForm, RemovalOutcome, RemovalPrompt, ValuePair,
};
