//! Rendering tests: substitutions, format functions, and markup
//! attribute events.

use skein_markup::{
    AttributedString, MarkupError, StringTable, StringTableError, StringTableRow,
};
use skein_runtime::Line;

fn line(id: &str, substitutions: &[&str]) -> Line {
    Line {
        id: id.to_string(),
        substitutions: substitutions.iter().map(|s| s.to_string()).collect(),
    }
}

fn render_with(lang: &str, text: &str, substs: &[&str]) -> Result<AttributedString, StringTableError> {
    let mut table = StringTable::new(lang).unwrap();
    table.add_row(StringTableRow::new("t", text, "test.dlg", "Start", 1).unwrap());
    table.render(&line("t", substs))
}

fn render(text: &str, substs: &[&str]) -> AttributedString {
    render_with("en", text, substs).unwrap()
}

#[test]
fn substitution_interpolates() {
    assert_eq!(render("Hello, {0}!", &["world"]).text(), "Hello, world!");
    assert_eq!(
        render("{1} and {0}", &["first", "second"]).text(),
        "second and first"
    );
}

#[test]
fn substitution_out_of_range_passes_through() {
    assert_eq!(render("Hello, {2}!", &["world"]).text(), "Hello, {2}!");
    assert_eq!(render("{0}", &[]).text(), "{0}");
    // An index too large for usize also passes through.
    assert_eq!(
        render("{99999999999999999999999}", &["x"]).text(),
        "{99999999999999999999999}"
    );
}

#[test]
fn pure_text_renders_to_itself() {
    let text = "Nothing special here. Punctuation: )(*&^%$#]}";
    // ('%' is special only inside format-function branches.)
    let rendered = render(text, &[]);
    assert_eq!(rendered.text(), text);
    assert!(rendered.attributes().is_empty());
}

#[test]
fn escapes_unescape() {
    assert_eq!(
        render(r#"\[b\]not markup \{0\} \"quote\" back\\slash"#, &["x"]).text(),
        r#"[b]not markup {0} "quote" back\slash"#
    );
}

#[test]
fn plural_english_cardinal() {
    let text = r#"You have [plural value={0} one="% apple" other="% apples"]."#;
    assert_eq!(render(text, &["1"]).text(), "You have 1 apple.");
    assert_eq!(render(text, &["3"]).text(), "You have 3 apples.");
    assert_eq!(render(text, &["0"]).text(), "You have 0 apples.");
}

#[test]
fn ordinal_english() {
    let text = r#"You came [ordinal value={0} one="%st" two="%nd" few="%rd" other="%th"]!"#;
    assert_eq!(render(text, &["1"]).text(), "You came 1st!");
    assert_eq!(render(text, &["2"]).text(), "You came 2nd!");
    assert_eq!(render(text, &["3"]).text(), "You came 3rd!");
    assert_eq!(render(text, &["11"]).text(), "You came 11th!");
    assert_eq!(render(text, &["21"]).text(), "You came 21st!");
}

#[test]
fn select_uses_input_as_branch_key() {
    let text = r#"[select value={0} m="bro" f="sis" nb="doc" /]"#;
    assert_eq!(render(text, &["m"]).text(), "bro");
    assert_eq!(render(text, &["nb"]).text(), "doc");
}

#[test]
fn select_missing_branch_is_an_error() {
    let err = render_with("en", r#"[select value={0} m="bro" /]"#, &["x"]).unwrap_err();
    assert!(matches!(
        err,
        StringTableError::Markup {
            source: MarkupError::BranchKeyMissing(key),
            ..
        } if key == "x"
    ));
}

#[test]
fn plural_with_non_numeric_input_is_an_error() {
    let err =
        render_with("en", r#"[plural value={0} other="% things"]"#, &["banana"]).unwrap_err();
    assert!(matches!(
        err,
        StringTableError::Markup {
            source: MarkupError::FormatInputNotNumber(_),
            ..
        }
    ));
}

#[test]
fn closing_an_unopened_tag_is_an_error() {
    let err = render_with("en", "[/b]", &[]).unwrap_err();
    assert!(matches!(
        err,
        StringTableError::Markup {
            source: MarkupError::UnopenedTag(name),
            ..
        } if name == "b"
    ));
}

#[test]
fn markup_props_render() {
    let rendered = render(r#"[wave size="big" who={0}]hi[/wave]"#, &["you"]);
    assert_eq!(rendered.text(), "hi");
    let atts = rendered.attributes();
    assert_eq!(atts.len(), 1);
    assert_eq!(atts[0].name, "wave");
    assert_eq!(atts[0].start, 0);
    assert_eq!(atts[0].end, 2);
    assert_eq!(atts[0].props.get("size").map(String::as_str), Some("big"));
    assert_eq!(atts[0].props.get("who").map(String::as_str), Some("you"));
}

#[test]
fn markup_inside_format_branch_spans_output() {
    let rendered = render(
        r#"[plural value={0} one="[b]%[/b] thing" other="% things"]"#,
        &["1"],
    );
    assert_eq!(rendered.text(), "1 thing");
    let atts = rendered.attributes();
    assert_eq!(atts.len(), 1);
    assert_eq!((atts[0].start, atts[0].end), (0, 1));
    assert_eq!(atts[0].name, "b");
}

#[test]
fn attribute_event_scan_order() {
    let rendered = render(
        "[a]Hello A[/a] [b]Hello B[/b] [c][d][/c]No C, [e/]only D[/d]",
        &[],
    );
    assert_eq!(rendered.text(), "Hello A Hello B No C, only D");

    let mut events: Vec<(usize, Vec<String>)> = Vec::new();
    rendered.scan_events(|pos, atts| {
        events.push((pos, atts.iter().map(|a| a.name.clone()).collect()));
    });
    let expected: Vec<(usize, Vec<String>)> = vec![
        (0, vec!["a".to_string()]),
        (7, vec!["a".to_string()]),
        (8, vec!["b".to_string()]),
        (15, vec!["b".to_string()]),
        (16, vec!["c".to_string(), "d".to_string()]),
        (22, vec!["e".to_string()]),
        (28, vec!["d".to_string()]),
    ];
    assert_eq!(events, expected);

    // Span endpoints, for good measure.
    let spans: Vec<(usize, usize, &str)> = rendered
        .attributes()
        .iter()
        .map(|a| (a.start, a.end, a.name.as_str()))
        .collect();
    assert_eq!(
        spans,
        vec![
            (0, 7, "a"),
            (8, 15, "b"),
            (16, 16, "c"),
            (16, 28, "d"),
            (22, 22, "e"),
        ]
    );
}

#[test]
fn close_all_closes_in_reverse_open_order() {
    let rendered = render("[a][b]x[/]y", &[]);
    assert_eq!(rendered.text(), "xy");
    let mut at_one: Vec<String> = Vec::new();
    rendered.scan_events(|pos, atts| {
        if pos == 1 {
            at_one = atts.iter().map(|a| a.name.clone()).collect();
        }
    });
    assert_eq!(at_one, vec!["b".to_string(), "a".to_string()]);
}

#[test]
fn unclosed_tags_close_at_end_of_line() {
    let rendered = render("[a]xyz", &[]);
    assert_eq!(rendered.text(), "xyz");
    let atts = rendered.attributes();
    assert_eq!(atts.len(), 1);
    assert_eq!((atts[0].start, atts[0].end), (0, 3));
}

#[test]
fn every_close_position_follows_its_open() {
    let rendered = render(
        r#"[a]one [b]two[/b] [c/]three[/a] [d]tail"#,
        &[],
    );
    for att in rendered.attributes() {
        assert!(att.end >= att.start, "span {att:?}");
    }
}

#[test]
fn substitution_inside_quoted_prop_value() {
    let rendered = render(r#"[shake amount="very {0}"]x[/shake]"#, &["hard"]);
    assert_eq!(
        rendered.attributes()[0].props.get("amount").map(String::as_str),
        Some("very hard")
    );
}
