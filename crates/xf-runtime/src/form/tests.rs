use super::model::{for_each_bound_field_mut, renumber, FormNode};
use super::*;
use pretty_assertions::assert_eq;
use xf_core::{Document, FormTemplate, AMBIGUOUS_CHOICE};
use xf_parser::{parse_document, write_document, WriteOptions};

fn template(source: &str) -> FormTemplate {
    xf_compiler::compile_form_template(source).expect("template should compile")
}

fn document(source: &str) -> Document {
    parse_document(source).expect("document should parse")
}

fn load(template_source: &str, document_source: &str) -> LiveForm {
    initialize_form(&document(document_source), &template(template_source))
        .expect("form should initialize")
}

fn output(form: &LiveForm) -> String {
    let document = serialize_form(form).expect("form should serialize");
    write_document(&document, &WriteOptions::default()).expect("document should write")
}

fn assert_round_trip(template_source: &str, document_source: &str) {
    let form = load(template_source, document_source);
    let produced = serialize_form(&form).expect("serialize");
    assert!(
        produced.structurally_eq(&document(document_source)),
        "round trip changed the document: {}",
        output(&form)
    );
}

fn visible_values(form: &LiveForm) -> Vec<(String, String)> {
    form.fields()
        .into_iter()
        .filter(|field| field.visible)
        .map(|field| (field.path.to_string(), field.value))
        .collect()
}

/// Sets the `n`th bound field directly, bypassing path lookup.
fn set_nth_field(form: &mut LiveForm, n: usize, value: &str) {
    let mut position = 0;
    for_each_bound_field_mut(&mut form.nodes, &mut |field| {
        if position == n {
            field.set(value);
        }
        position += 1;
    });
}

const ITEMS: &str = r#"
<form root="/form">
  <repeat group="items" path="/form/item">
    <field path="/form/item" label="Item"/>
  </repeat>
</form>
"#;

const AB_CHOICE: &str = r#"
<form root="/form">
  <choice group="ab" path="/form">
    <alternative name="A"><field path="/form/A"/></alternative>
    <alternative name="B"><field path="/form/B"/></alternative>
  </choice>
</form>
"#;

const SECTIONS: &str = r#"
<form root="/form">
  <repeat group="sections" path="/form/sec">
    <field path="/form/sec/@title" role="attribute"/>
    <repeat group="rows" path="/form/sec/row">
      <field path="/form/sec/row"/>
    </repeat>
  </repeat>
</form>
"#;

#[test]
fn items_expand_to_document_rows_and_accept_a_new_row() {
    let mut form = load(ITEMS, "<form><item>x</item><item>y</item></form>");
    assert_eq!(
        visible_values(&form),
        vec![
            ("/form/item[1]".to_string(), "x".to_string()),
            ("/form/item[2]".to_string(), "y".to_string()),
        ]
    );

    let added = form.add_instance("/form/item").expect("add row");
    assert_eq!(added, 3);
    form.set_value("/form/item[3]", "z").expect("set row");
    assert_eq!(
        output(&form),
        "<form><item>x</item><item>y</item><item>z</item></form>"
    );
}

#[test]
fn choice_selects_the_alternative_found_in_the_document() {
    let form = load(AB_CHOICE, "<form><B>v</B></form>");
    let groups = form.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kind, GroupKind::Choice);
    assert_eq!(groups[0].selections, vec![Some("B".to_string())]);
    assert_eq!(
        visible_values(&form),
        vec![("/form/B".to_string(), "v".to_string())]
    );
    assert_eq!(output(&form), "<form><B>v</B></form>");
}

#[test]
fn attribute_is_kept_and_empty_text_is_pruned() {
    let mut form = load(
        r#"
<form root="/form">
  <field path="/form/@lang" role="attribute"/>
  <field path="/form/text()" role="text"/>
</form>
"#,
        "<form/>",
    );
    form.set_value("/form/@lang", "en").expect("set lang");
    assert_eq!(output(&form), r#"<form lang="en"/>"#);
}

#[test]
fn fields_sharing_a_path_merge_with_a_space() {
    let source = r#"
<form root="/form">
  <field path="/form/tag"/>
  <field path="/form/tag"/>
</form>
"#;
    let mut form = load(source, "<form/>");
    set_nth_field(&mut form, 0, "a");
    set_nth_field(&mut form, 1, "b");
    assert_eq!(output(&form), "<form><tag>a b</tag></form>");

    let reloaded = load(source, "<form><tag>a b</tag></form>");
    let values = reloaded
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn a_single_field_keeps_values_with_spaces() {
    let form = load(ITEMS, "<form><item>hello big world</item></form>");
    assert_eq!(output(&form), "<form><item>hello big world</item></form>");
}

#[test]
fn last_consumer_keeps_remaining_tokens() {
    let source = r#"
<form root="/form">
  <field path="/form/tag"/>
  <field path="/form/tag"/>
</form>
"#;
    let form = load(source, "<form><tag>a b c</tag></form>");
    let values = form
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["a".to_string(), "b c".to_string()]);
    assert_eq!(output(&form), "<form><tag>a b c</tag></form>");
}

#[test]
fn list_field_takes_tokens_left_by_later_consumers() {
    let source = r#"
<form root="/form">
  <field path="/form/tag" role="multiple-value"/>
  <field path="/form/tag"/>
</form>
"#;
    let form = load(source, "<form><tag>a b c d</tag></form>");
    let values = form
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["a b c".to_string(), "d".to_string()]);
    assert_eq!(output(&form), "<form><tag>a b c d</tag></form>");
}

#[test]
fn list_field_serializes_a_normalized_token_list() {
    let source = r#"
<form root="/form">
  <field path="/form/keywords" role="multiple-value" control="textarea"/>
  <field path="/form/title"/>
</form>
"#;
    let mut form = load(source, "<form/>");
    form.set_value("/form/keywords", "  rust\nxml   forms ").expect("set keywords");
    form.set_value("/form/title", " spaced  title ").expect("set title");
    assert_eq!(
        output(&form),
        "<form><keywords>rust xml forms</keywords><title> spaced  title </title></form>"
    );
}

#[test]
fn empty_form_serializes_to_the_root_only() {
    let source = r#"
<form root="/form">
  <field path="/form/@id" role="attribute"/>
  <repeat group="sections" path="/form/sec" min="2">
    <field path="/form/sec/head"/>
    <repeat group="rows" path="/form/sec/row">
      <field path="/form/sec/row/cell"/>
    </repeat>
  </repeat>
  <choice group="ab" path="/form">
    <alternative name="A"><field path="/form/A/x"/></alternative>
    <alternative name="B"><field path="/form/B"/></alternative>
  </choice>
</form>
"#;
    let form = load(source, "<form/>");
    assert_eq!(output(&form), "<form/>");
    assert_eq!(form.groups()[0].instances, 2);
}

#[test]
fn nested_repeats_are_indexed_densely() {
    let source = r#"<form><sec title="a"><row>1</row><row>2</row></sec><sec title="b"><row>3</row></sec></form>"#;
    let form = load(SECTIONS, source);

    let groups = form
        .groups()
        .into_iter()
        .map(|group| (group.key, group.instances))
        .collect::<Vec<_>>();
    assert_eq!(
        groups,
        vec![
            ("sections@/form/sec".to_string(), 2),
            ("rows@/form/sec[1]/row".to_string(), 2),
            ("rows@/form/sec[2]/row".to_string(), 1),
        ]
    );

    let paths = form
        .fields()
        .into_iter()
        .map(|field| field.path.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        paths,
        vec![
            "/form/sec[1]/@title",
            "/form/sec[1]/row[1]",
            "/form/sec[1]/row[2]",
            "/form/sec[2]/@title",
            "/form/sec[2]/row[1]",
        ]
    );
    assert_eq!(output(&form), source);
}

#[test]
fn loading_leaves_every_path_as_a_full_renumber_would() {
    let source = r#"
<form root="/form">
  <repeat group="sections" path="/form/sec">
    <field path="/form/sec/@title" role="attribute"/>
    <choice group="kind" path="/form/sec" repeatable="true">
      <alternative name="p"><field path="/form/sec/p"/></alternative>
      <alternative name="list">
        <repeat group="items" path="/form/sec/list/li">
          <field path="/form/sec/list/li"/>
        </repeat>
      </alternative>
    </choice>
  </repeat>
</form>
"#;
    let xml = concat!(
        r#"<form><sec title="a"><p>1</p><list><li>x</li><li>y</li></list><p>2</p></sec>"#,
        r#"<sec title="b"><list><li>z</li></list><list><li>u</li><li>v</li></list></sec></form>"#,
    );
    let form = load(source, xml);
    let mut renumbered = form.clone();
    renumber(&mut renumbered.nodes, &[]);
    assert_eq!(form, renumbered);
    assert_eq!(output(&form), xml);
}

#[test]
fn adding_an_outer_instance_renumbers_nested_groups() {
    let mut form = load(SECTIONS, r#"<form><sec title="a"><row>1</row></sec></form>"#);
    form.add_instance("sections@/form/sec").expect("add section");
    form.add_instance("/form/sec[2]/row").expect("add row");
    form.set_value("/form/sec[2]/row[2]", "late").expect("set");
    form.set_value("/form/sec[2]/@title", "b").expect("set title");
    assert_eq!(
        output(&form),
        r#"<form><sec title="a"><row>1</row></sec><sec title="b"><row>late</row></sec></form>"#
    );
}

#[test]
fn repeatable_choice_keeps_a_running_count_per_alternative() {
    let source = r#"
<form root="/form">
  <choice group="ab" path="/form" repeatable="true">
    <alternative name="A"><field path="/form/A"/></alternative>
    <alternative name="B"><field path="/form/B"/></alternative>
  </choice>
</form>
"#;
    let xml = "<form><A>1</A><B>two words</B><A>3</A></form>";
    let form = load(source, xml);
    assert_eq!(
        form.groups()[0].selections,
        vec![
            Some("A".to_string()),
            Some("B".to_string()),
            Some("A".to_string())
        ]
    );
    assert_eq!(
        visible_values(&form),
        vec![
            ("/form/A[1]".to_string(), "1".to_string()),
            ("/form/B[1]".to_string(), "two words".to_string()),
            ("/form/A[2]".to_string(), "3".to_string()),
        ]
    );
    assert_eq!(output(&form), xml);
}

#[test]
fn repeatable_choice_instances_can_be_added_and_selected() {
    let source = r#"
<form root="/form">
  <choice group="ab" path="/form" repeatable="true">
    <alternative name="A"><field path="/form/A"/></alternative>
    <alternative name="B"><field path="/form/B"/></alternative>
  </choice>
</form>
"#;
    let mut form = load(source, "<form><A>1</A></form>");
    assert_eq!(form.add_instance("/form").expect("add"), 2);
    form.select_alternative("/form", 2, "A").expect("select");
    form.set_value("/form/A[2]", "2").expect("set");
    assert_eq!(output(&form), "<form><A>1</A><A>2</A></form>");

    let outcome = form.remove_instance("/form", |_| true).expect("remove");
    assert_eq!(outcome, RemovalOutcome::Removed);
    assert_eq!(output(&form), "<form><A>1</A></form>");
}

#[test]
fn selecting_another_alternative_clears_the_previous_one() {
    let mut form = load(AB_CHOICE, "<form><B>v</B></form>");
    form.select_alternative("/form", 1, "A").expect("select A");
    assert_eq!(output(&form), "<form/>");
    form.select_alternative("ab@/form", 1, "B").expect("select B");
    assert_eq!(
        visible_values(&form),
        vec![("/form/B".to_string(), String::new())]
    );

    form.clear_selection("/form", 1).expect("clear");
    assert_eq!(form.groups()[0].selections, vec![None]);
    assert!(visible_values(&form).is_empty());
}

#[test]
fn choice_actions_report_bad_targets() {
    let mut form = load(AB_CHOICE, "<form/>");
    assert_eq!(
        form.select_alternative("/form", 1, "C")
            .expect_err("unknown alternative")
            .code,
        "CHOICE_UNKNOWN_ALTERNATIVE"
    );
    assert_eq!(
        form.select_alternative("/form", 2, "A")
            .expect_err("out of range")
            .code,
        "CHOICE_INSTANCE_OUT_OF_RANGE"
    );
    assert_eq!(
        form.select_alternative("/form", 0, "A")
            .expect_err("zero")
            .code,
        "CHOICE_INSTANCE_OUT_OF_RANGE"
    );
    assert_eq!(
        form.add_instance("/form").expect_err("not repeatable").code,
        "GROUP_NOT_REPEATABLE"
    );
    assert_eq!(
        form.add_instance("/form/none").expect_err("missing").code,
        "GROUP_NOT_FOUND"
    );
    assert_eq!(
        form.set_value("/form/A", "x").expect_err("hidden").code,
        "FIELD_NOT_FOUND"
    );
}

#[test]
fn group_keys_disambiguate_with_ids() {
    let mut form = load(
        r#"
<form root="/form">
  <choice group="ab" path="/form">
    <alternative name="A"><field path="/form/A"/></alternative>
    <alternative name="B"><field path="/form/B"/></alternative>
  </choice>
  <choice group="cd" path="/form">
    <alternative name="C"><field path="/form/C"/></alternative>
    <alternative name="D"><field path="/form/D"/></alternative>
  </choice>
</form>
"#,
        "<form><B>1</B><C>2</C></form>",
    );
    assert_eq!(
        form.clear_selection("/form", 1).expect_err("ambiguous").code,
        "GROUP_AMBIGUOUS"
    );
    form.clear_selection("cd@/form", 1).expect("clear cd");
    assert_eq!(output(&form), "<form><B>1</B></form>");
}

#[test]
fn remove_instance_confirms_and_respects_the_minimum() {
    let mut form = load(ITEMS, "<form><item>x</item><item>y</item></form>");

    let mut asked = None;
    let outcome = form
        .remove_instance("/form/item", |prompt| {
            asked = Some(prompt.clone());
            false
        })
        .expect("cancel");
    assert_eq!(outcome, RemovalOutcome::Cancelled);
    let prompt = asked.expect("prompt");
    assert_eq!(prompt.group_id, "items");
    assert_eq!(prompt.instance, 2);
    assert!(!prompt.clears_only);
    assert_eq!(form.groups()[0].instances, 2);

    assert_eq!(
        form.remove_instance("/form/item", |_| true).expect("remove"),
        RemovalOutcome::Removed
    );
    assert_eq!(output(&form), "<form><item>x</item></form>");

    assert_eq!(
        form.remove_instance("/form/item", |prompt| prompt.clears_only)
            .expect("clear"),
        RemovalOutcome::Cleared
    );
    assert_eq!(form.groups()[0].instances, 1);
    assert_eq!(output(&form), "<form/>");
}

#[test]
fn checkboxes_sharing_a_path_split_and_merge_tokens() {
    let source = r#"
<form root="/form">
  <field path="/form/color" role="multiple-value" control="checkbox" value="red"/>
  <field path="/form/color" role="multiple-value" control="checkbox" value="blue"/>
  <field path="/form/color" role="multiple-value" control="checkbox" value="green"/>
</form>
"#;
    let form = load(source, "<form><color>red blue</color></form>");
    let checked = form
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(
        checked,
        vec!["red".to_string(), "blue".to_string(), String::new()]
    );
    assert_eq!(output(&form), "<form><color>red blue</color></form>");

    let single = load(source, "<form><color>green</color></form>");
    assert_eq!(output(&single), "<form><color>green</color></form>");
}

#[test]
fn radios_and_selects_bind_option_values() {
    let source = r#"
<form root="/form">
  <field path="/form/size" control="radio" value="S"/>
  <field path="/form/size" control="radio" value="M"/>
  <field path="/form/kind" control="select" multiple="true">
    <option value="a"/><option value="b"/><option value="c"/>
  </field>
  <field path="/form/mode" control="select">
    <option value="on"/><option value="off"/>
  </field>
</form>
"#;
    assert_round_trip(
        source,
        "<form><size>M</size><kind>a c</kind><mode>off</mode></form>",
    );

    let form = load(source, "<form><mode>unknown</mode></form>");
    assert_eq!(output(&form), "<form/>");
}

#[test]
fn option_dependent_region_follows_its_controlling_field() {
    let source = r#"
<form root="/form">
  <field path="/form/@type" role="attribute" control="select">
    <option value="book"/><option value="article"/>
  </field>
  <when path="/form/@type" equals="book">
    <field path="/form/isbn"/>
  </when>
</form>
"#;
    let mut form = load(source, r#"<form type="book"><isbn>1</isbn></form>"#);
    assert_eq!(output(&form), r#"<form type="book"><isbn>1</isbn></form>"#);

    form.set_value("/form/@type", "article").expect("switch type");
    assert_eq!(output(&form), r#"<form type="article"/>"#);
    let isbn = form
        .fields()
        .into_iter()
        .find(|field| field.path.to_string() == "/form/isbn")
        .expect("isbn field");
    assert!(!isbn.visible);
    assert_eq!(isbn.value, "1");
}

#[test]
fn hidden_controlling_field_does_not_keep_a_region_live() {
    let source = r#"
<form root="/form">
  <field path="/form/@type" role="attribute" control="select">
    <option value="book"/><option value="article"/>
  </field>
  <when path="/form/@type" equals="book">
    <field path="/form/@format" role="attribute" control="select">
      <option value="print"/><option value="ebook"/>
    </field>
  </when>
  <when path="/form/@format" equals="ebook">
    <field path="/form/url"/>
  </when>
</form>
"#;
    let mut form = load(source, r#"<form type="book" format="ebook"><url>U</url></form>"#);
    assert_eq!(
        output(&form),
        r#"<form type="book" format="ebook"><url>U</url></form>"#
    );

    form.set_value("/form/@type", "article").expect("switch type");
    assert_eq!(output(&form), r#"<form type="article"/>"#);
    assert_eq!(form.value("/form/@format").expect("value"), "");
    let url = form
        .fields()
        .into_iter()
        .find(|field| field.path.to_string() == "/form/url")
        .expect("url field");
    assert!(!url.visible);

    form.set_value("/form/@type", "book").expect("switch back");
    assert_eq!(
        output(&form),
        r#"<form type="book" format="ebook"><url>U</url></form>"#
    );
}

#[test]
fn region_controlled_from_inside_itself_stays_hidden() {
    let form = load(
        r#"
<form root="/form">
  <when path="/form/@mode" equals="on">
    <field path="/form/@mode" role="attribute"/>
    <field path="/form/extra"/>
  </when>
</form>
"#,
        r#"<form mode="on"><extra>x</extra></form>"#,
    );
    assert_eq!(output(&form), "<form/>");
}

#[test]
fn disabled_fields_never_serialize() {
    let form = load(
        r#"
<form root="/form">
  <field path="/form/id" disabled="true"/>
  <field path="/form/name"/>
</form>
"#,
        "<form><id>7</id><name>n</name></form>",
    );
    assert_eq!(output(&form), "<form><name>n</name></form>");
}

#[test]
fn different_control_families_on_one_path_conflict() {
    let form = load(
        r#"
<form root="/form">
  <field path="/form/a"/>
  <field path="/form/a" control="select"><option value="x"/></field>
</form>
"#,
        "<form/>",
    );
    let error = serialize_form(&form).expect_err("conflict");
    assert_eq!(error.code, "FIELD_PATH_CONFLICT");
}

#[test]
fn several_selected_alternatives_are_reported() {
    let mut form = load(AB_CHOICE, "<form><A>1</A></form>");
    if let FormNode::Choice(choice) = &mut form.nodes[0] {
        for alternative in &mut choice.instances[0].alternatives {
            alternative.selected = true;
        }
    }
    let error = serialize_form(&form).expect_err("ambiguous");
    assert_eq!(error.code, AMBIGUOUS_CHOICE);
}

#[test]
fn namespaced_documents_bind_by_uri() {
    let source = r#"
<form root="/rec">
  <namespace prefix="dc" uri="urn:dc"/>
  <field path="/rec/dc:title"/>
  <field path="/rec/dc:title/@xml:lang" role="attribute"/>
</form>
"#;
    let form = load(
        source,
        r#"<rec xmlns:d="urn:dc" xmlns:o="urn:other"><d:title xml:lang="en">T</d:title><o:skip>1</o:skip></rec>"#,
    );
    assert_eq!(
        output(&form),
        r#"<rec xmlns:dc="urn:dc"><dc:title xml:lang="en">T</dc:title></rec>"#
    );
}

#[test]
fn unknown_content_is_skipped_silently() {
    let form = load(ITEMS, "<form><item>x</item><junk><deep>1</deep></junk></form>");
    assert_eq!(output(&form), "<form><item>x</item></form>");

    let other_root = load(ITEMS, "<other><item>x</item></other>");
    assert_eq!(output(&other_root), "<form/>");
}

#[test]
fn line_break_markers_decode_for_multiline_controls() {
    let source = r#"
<form root="/form">
  <field path="/form/note" control="textarea"/>
  <field path="/form/title"/>
</form>
"#;
    let xml = "<form><note>a&lt;br/&gt;b&lt;BR&gt;c</note><title>x&lt;br/&gt;y</title></form>";
    let form = load(source, xml);
    let values = form
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(values, vec!["a\nb\nc".to_string(), "x<br/>y".to_string()]);

    let raw = initialize_form_with_options(
        &document(xml),
        &template(source),
        &InitializeOptions {
            decode_line_breaks: false,
        },
    )
    .expect("initialize");
    assert_eq!(raw.fields()[0].value, "a<br/>b<BR>c");
}

#[test]
fn surrounding_whitespace_of_text_survives_a_round_trip() {
    let source = r#"
<form root="/form">
  <field path="/form/note" control="textarea"/>
  <field path="/form/title"/>
</form>
"#;
    let xml = "<form>\n  <note>  indented\nline two\n</note>\n  <title> t </title>\n</form>";
    let form = load(source, xml);
    let values = form
        .fields()
        .into_iter()
        .map(|field| field.value)
        .collect::<Vec<_>>();
    assert_eq!(
        values,
        vec!["  indented\nline two\n".to_string(), " t ".to_string()]
    );
    assert_eq!(
        output(&form),
        "<form><note>  indented\nline two\n</note><title> t </title></form>"
    );

    let blank = load(source, "<form><note>  \n </note></form>");
    assert_eq!(blank.fields()[0].value, "");
}

#[test]
fn fill_creates_missing_instances_along_the_path() {
    let mut form = load(SECTIONS, "<form/>");
    form.fill("/form/sec[2]/row[3]", "x").expect("fill");
    let counts = form
        .groups()
        .into_iter()
        .map(|group| group.instances)
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![2, 1, 3]);
    assert_eq!(form.value("/form/sec[2]/row[3]").expect("value"), "x");
    assert_eq!(output(&form), "<form><sec><row>x</row></sec></form>");
}

#[test]
fn fill_reveals_the_alternative_holding_the_field() {
    let mut form = load(AB_CHOICE, "<form><A>1</A></form>");
    form.fill("/form/B", "v").expect("fill");
    assert_eq!(form.groups()[0].selections, vec![Some("B".to_string())]);
    assert_eq!(output(&form), "<form><B>v</B></form>");

    assert_eq!(
        form.fill("/form/C", "v").expect_err("no field").code,
        "FIELD_NOT_FOUND"
    );
}

#[test]
fn reloading_resets_previous_state() {
    let mut form = load(ITEMS, "<form><item>x</item><item>y</item></form>");
    form.load(&document("<form><item>only</item></form>"))
        .expect("reload");
    assert_eq!(form.groups()[0].instances, 1);
    assert_eq!(output(&form), "<form><item>only</item></form>");
}

#[test]
fn live_form_survives_a_json_round_trip() {
    let mut form = load(SECTIONS, r#"<form><sec title="a"><row>1</row></sec></form>"#);
    form.add_instance("/form/sec[1]/row").expect("add");
    let json = serde_json::to_string(&form).expect("to json");
    let restored: LiveForm = serde_json::from_str(&json).expect("from json");
    assert_eq!(restored, form);
    assert_eq!(output(&restored), output(&form));
}

#[test]
fn composite_documents_round_trip() {
    let source = r#"
<form root="/rec">
  <namespace prefix="dc" uri="http://purl.org/dc/elements/1.1/"/>
  <field path="/rec/@id" role="attribute"/>
  <field path="/rec/dc:title"/>
  <repeat group="authors" path="/rec/author">
    <field path="/rec/author/@role" role="attribute"/>
    <field path="/rec/author/name"/>
    <choice group="contact" path="/rec/author">
      <alternative name="email"><field path="/rec/author/email"/></alternative>
      <alternative name="phone"><field path="/rec/author/phone"/></alternative>
    </choice>
  </repeat>
  <field path="/rec/note" control="textarea"/>
</form>
"#;
    assert_round_trip(
        source,
        r#"<rec xmlns:dc="http://purl.org/dc/elements/1.1/" id="r1">
  <dc:title>Title</dc:title>
  <author role="lead"><name>Ann</name><phone>123</phone></author>
  <author><name>Bob</name><email>b@x</email></author>
  <note>line</note>
</rec>"#,
    );
}

#[test]
fn collect_values_reports_pairs_in_field_order() {
    let form = load(SECTIONS, r#"<form><sec title="a"><row>1</row></sec></form>"#);
    let pairs = collect_values(&form)
        .expect("collect")
        .into_iter()
        .map(|pair| format!("{}={}", pair.path, pair.value))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec!["/form/sec[1]/@title=a", "/form/sec[1]/row[1]=1"]);
}

#[test]
fn recursive_blocks_bind_nested_documents_up_to_their_depth() {
    let source = r#"
<form root="/form">
  <define name="part">
    <repeat group="parts" path="/part">
      <field path="/part/@title" role="attribute"/>
      <ref block="part" path="/part"/>
    </repeat>
  </define>
  <ref block="part" path="/form" max-depth="2"/>
</form>
"#;
    let xml = r#"<form><part title="a"><part title="b"/><part title="c"/></part><part title="d"/></form>"#;
    let mut form = load(source, xml);
    assert_eq!(output(&form), xml);
    assert_eq!(
        form.groups()
            .into_iter()
            .map(|group| (group.key, group.instances))
            .collect::<Vec<_>>(),
        vec![
            ("parts@/form/part".to_string(), 2),
            ("parts@/form/part[1]/part".to_string(), 2),
            ("parts@/form/part[2]/part".to_string(), 1),
        ]
    );

    let too_deep = load(source, r#"<form><part title="a"><part title="b"><part title="x"/></part></part></form>"#);
    assert_eq!(
        output(&too_deep),
        r#"<form><part title="a"><part title="b"/></part></form>"#
    );

    form.fill("/form/part[2]/part[2]/@title", "e").expect("fill nested");
    assert_eq!(
        output(&form),
        r#"<form><part title="a"><part title="b"/><part title="c"/></part><part title="d"><part title="e"/></part></form>"#
    );
}
