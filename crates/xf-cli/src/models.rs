use serde::{Deserialize, Serialize};
use xf_api::LiveForm;

pub(crate) const FORM_STATE_SCHEMA: &str = "form-state.v1";

/// Template and document text read from disk for one command.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSource {
    pub(crate) template_path: String,
    pub(crate) template_xml: String,
    pub(crate) document_xml: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormStateV1 {
    pub(crate) schema_version: String,
    pub(crate) template_path: String,
    pub(crate) form: LiveForm,
}
