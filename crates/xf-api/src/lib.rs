use log::debug;
use xf_compiler::compile_form_template;
use xf_core::{FormTemplate, XformError};
use xf_parser::{parse_document, write_document};
use xf_runtime::{initialize_form_with_options, serialize_form};

pub use xf_parser::WriteOptions;
pub use xf_runtime::{InitializeOptions, LiveForm, RemovalOutcome};

#[derive(Debug, Clone, Default)]
pub struct InitializeFormFromXmlOptions {
    pub template_xml: String,
    /// Document to load; `None` starts from the reset form.
    pub document_xml: Option<String>,
    pub initialize: InitializeOptions,
}

pub fn load_template(template_xml: &str) -> Result<FormTemplate, XformError> {
    compile_form_template(template_xml)
}

pub fn initialize_form_from_xml(
    options: InitializeFormFromXmlOptions,
) -> Result<LiveForm, XformError> {
    let template = load_template(&options.template_xml)?;
    match options.document_xml.as_deref() {
        Some(document_xml) => {
            let document = parse_document(document_xml)?;
            initialize_form_with_options(&document, &template, &options.initialize)
        }
        None => {
            debug!("no document given; starting from the reset form");
            Ok(LiveForm::new(template))
        }
    }
}

pub fn serialize_form_to_xml(form: &LiveForm, options: &WriteOptions) -> Result<String, XformError> {
    let document = serialize_form(form)?;
    write_document(&document, options)
}

/// Loads `document_xml` through `template_xml` and writes it straight back.
pub fn roundtrip_xml(
    template_xml: &str,
    document_xml: Option<&str>,
    options: &WriteOptions,
) -> Result<String, XformError> {
    let form = initialize_form_from_xml(InitializeFormFromXmlOptions {
        template_xml: template_xml.to_string(),
        document_xml: document_xml.map(str::to_string),
        initialize: InitializeOptions::default(),
    })?;
    serialize_form_to_xml(&form, options)
}
