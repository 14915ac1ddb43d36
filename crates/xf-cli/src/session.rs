use std::fs;
use std::path::Path;

use log::info;
use xf_api::{
    initialize_form_from_xml, serialize_form_to_xml, InitializeFormFromXmlOptions,
    InitializeOptions, LiveForm, RemovalOutcome, WriteOptions,
};
use xf_core::XformError;
use xf_runtime::GroupKind;

use crate::{
    load_form_state, load_source, map_cli_output_write, save_form_state, FormStateV1,
    GroupArgs, RemoveArgs, SaveArgs, SelectArgs, SessionArgs, SessionCommand, SetArgs, ShowArgs,
    StartArgs, FORM_STATE_SCHEMA,
};

pub(crate) fn run_session(args: SessionArgs) -> Result<i32, XformError> {
    match args.command {
        SessionCommand::Start(args) => run_start(args),
        SessionCommand::Set(args) => run_set(args),
        SessionCommand::Add(args) => run_add(args),
        SessionCommand::Remove(args) => run_remove(args),
        SessionCommand::Select(args) => run_select(args),
        SessionCommand::Show(args) => run_show(args),
        SessionCommand::Save(args) => run_save(args),
    }
}

pub(crate) fn run_start(args: StartArgs) -> Result<i32, XformError> {
    let source = load_source(&args.template, args.document.as_deref())?;
    let form = initialize_form_from_xml(InitializeFormFromXmlOptions {
        template_xml: source.template_xml,
        document_xml: source.document_xml,
        initialize: InitializeOptions::default(),
    })?;
    info!("session started from {}", source.template_path);
    emit_form_with_saved_state(&form, &source.template_path, &args.state_out, Vec::new())
}

fn run_set(args: SetArgs) -> Result<i32, XformError> {
    run_state_transition(&args.state_in, &args.state_out, |form| {
        if args.fill {
            form.fill(&args.path, &args.value)?;
        } else {
            form.set_value(&args.path, &args.value)?;
        }
        Ok(Vec::new())
    })
}

fn run_add(args: GroupArgs) -> Result<i32, XformError> {
    run_state_transition(&args.state_in, &args.state_out, |form| {
        let added = form.add_instance(&args.group)?;
        Ok(vec![format!("ADDED:{}", added)])
    })
}

fn run_remove(args: RemoveArgs) -> Result<i32, XformError> {
    run_state_transition(&args.state_in, &args.state_out, |form| {
        let mut prompt_line = None;
        let outcome = form.remove_instance(&args.group, |prompt| {
            let action = if prompt.clears_only { "clear" } else { "remove" };
            prompt_line = Some(format!(
                "PROMPT:{}|{}@{}|{}",
                action, prompt.group_id, prompt.group_path, prompt.instance
            ));
            args.yes
        })?;
        let mut notes = prompt_line.into_iter().collect::<Vec<_>>();
        notes.push(format!("OUTCOME:{}", outcome_label(outcome)));
        Ok(notes)
    })
}

fn run_select(args: SelectArgs) -> Result<i32, XformError> {
    run_state_transition(&args.state_in, &args.state_out, |form| {
        match args.alternative.as_deref() {
            Some(name) => form.select_alternative(&args.group, args.instance, name)?,
            None => form.clear_selection(&args.group, args.instance)?,
        }
        Ok(Vec::new())
    })
}

fn run_show(args: ShowArgs) -> Result<i32, XformError> {
    let state = load_form_state(Path::new(&args.state_in))?;
    emit_form(&state.form, Vec::new(), None);
    Ok(0)
}

fn run_save(args: SaveArgs) -> Result<i32, XformError> {
    let state = load_form_state(Path::new(&args.state_in))?;
    let xml = serialize_form_to_xml(
        &state.form,
        &WriteOptions {
            indent: args.indent,
            declaration: args.out.is_some(),
        },
    )?;
    if let Some(out) = args.out.as_deref() {
        fs::write(out, &xml).map_err(map_cli_output_write)?;
        info!("document written to {}", out);
    }
    emit_xml(&xml);
    Ok(0)
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut LiveForm) -> Result<Vec<String>, XformError>,
) -> Result<i32, XformError> {
    let mut state = load_form_state(Path::new(state_in))?;
    let notes = transition(&mut state.form)?;
    emit_form_with_saved_state(&state.form, &state.template_path, state_out, notes)
}

pub(crate) fn emit_form_with_saved_state(
    form: &LiveForm,
    template_path: &str,
    state_out: &str,
    notes: Vec<String>,
) -> Result<i32, XformError> {
    let state = FormStateV1 {
        schema_version: FORM_STATE_SCHEMA.to_string(),
        template_path: template_path.to_string(),
        form: form.clone(),
    };
    save_form_state(Path::new(state_out), &state)?;
    emit_form(form, notes, Some(state_out));
    Ok(0)
}

fn outcome_label(outcome: RemovalOutcome) -> &'static str {
    match outcome {
        RemovalOutcome::Cancelled => "CANCELLED",
        RemovalOutcome::Removed => "REMOVED",
        RemovalOutcome::Cleared => "CLEARED",
    }
}

pub(crate) fn emit_xml(xml: &str) {
    println!("RESULT:OK");
    println!(
        "XML_JSON:{}",
        serde_json::to_string(xml).unwrap_or_else(|_| "\"\"".to_string())
    );
}

pub(crate) fn emit_form(form: &LiveForm, notes: Vec<String>, state_out: Option<&str>) {
    println!("RESULT:OK");
    for note in notes {
        println!("{}", note);
    }

    for group in form.groups() {
        let selections = group
            .selections
            .iter()
            .map(|selection| selection.as_deref().unwrap_or("-"))
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "GROUP:{}|{}|{}|{}",
            group.key,
            match group.kind {
                GroupKind::Repeat => "repeat",
                GroupKind::Choice => "choice",
            },
            group.instances,
            selections
        );
    }

    for field in form.fields() {
        println!(
            "FIELD:{}|{}|{}|{}",
            field.path,
            field.control,
            if field.visible { "visible" } else { "hidden" },
            serde_json::to_string(&field.value).unwrap_or_else(|_| "\"\"".to_string())
        );
    }

    println!("STATE_OUT:{}", state_out.unwrap_or("NONE"));
}
