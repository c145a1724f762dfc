//! Evaluation of parsed line templates into attributed strings.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::attributed::{Attribute, AttributedString};
use crate::error::MarkupError;
use crate::parser::{Fragment, MarkupTag, ParsedString, Prop, PropValue};
use crate::plural::{PluralKind, PluralRuleSet};

/// Per-render builder. Substitutions and plural rules are borrowed; all
/// other state is created fresh, which is what keeps rendering pure.
pub(crate) struct LineRenderer<'a> {
    out: String,
    attributes: Vec<Attribute>,
    events: BTreeMap<usize, Vec<usize>>,
    /// name -> stack of open attribute ids with that name.
    open_by_name: FxHashMap<String, Vec<usize>>,
    /// All open attribute ids in open order; `[/]` closes these in
    /// reverse, so close-all order is the nesting order.
    open_order: Vec<usize>,
    substs: &'a [String],
    rules: &'a PluralRuleSet,
}

impl<'a> LineRenderer<'a> {
    pub(crate) fn new(substs: &'a [String], rules: &'a PluralRuleSet) -> Self {
        LineRenderer {
            out: String::new(),
            attributes: Vec::new(),
            events: BTreeMap::new(),
            open_by_name: FxHashMap::default(),
            open_order: Vec::new(),
            substs,
            rules,
        }
    }

    pub(crate) fn render(mut self, parsed: &ParsedString) -> Result<AttributedString, MarkupError> {
        self.render_string(parsed)?;
        // Spans left open run to the end of the line.
        self.close_all();
        Ok(AttributedString {
            text: self.out,
            attributes: self.attributes,
            events: self.events,
        })
    }

    fn render_string(&mut self, parsed: &ParsedString) -> Result<(), MarkupError> {
        for fragment in &parsed.fragments {
            self.render_fragment(fragment)?;
        }
        Ok(())
    }

    fn render_fragment(&mut self, fragment: &Fragment) -> Result<(), MarkupError> {
        match fragment {
            Fragment::Escaped(c) => self.out.push(*c),
            Fragment::Text(s) => self.out.push_str(s),
            Fragment::Subst(digits) => {
                let s = self.eval_subst(digits);
                self.out.push_str(&s);
            }
            Fragment::Markup(tag) => return self.render_markup(tag),
        }
        Ok(())
    }

    /// Resolves a substitution token. Out-of-range or unparseable indices
    /// pass through as the literal token.
    fn eval_subst(&self, digits: &str) -> String {
        match digits.parse::<usize>() {
            Ok(n) if n < self.substs.len() => self.substs[n].clone(),
            _ => format!("{{{digits}}}"),
        }
    }

    fn render_markup(&mut self, tag: &MarkupTag) -> Result<(), MarkupError> {
        match tag.name.as_deref() {
            // [select value={0} m="bro" f="sis" nb="doc" /]
            Some("select") => self.render_select(tag),
            // [plural value={0} one="an apple" other="% apples" /]
            Some("plural") => self.render_plural(tag, PluralKind::Cardinal),
            // [ordinal value={0} one="%st" two="%nd" ... /]
            Some("ordinal") => self.render_plural(tag, PluralKind::Ordinal),
            None if tag.opening_slash => {
                self.close_all();
                Ok(())
            }
            Some(name) if tag.opening_slash => self.close_tag(name),
            Some(name) if tag.closing_slash => {
                self.open_tag(name, &tag.props)?;
                self.close_tag(name)
            }
            Some(name) => self.open_tag(name, &tag.props),
            None => {
                // [] means nothing; emit it back.
                self.out.push_str("[]");
                Ok(())
            }
        }
    }

    fn open_tag(&mut self, name: &str, props: &[Prop]) -> Result<(), MarkupError> {
        let mut rendered_props = FxHashMap::default();
        for prop in props {
            rendered_props.insert(prop.key.clone(), self.eval_prop_value(&prop.value)?);
        }
        let start = self.out.len();
        let id = self.attributes.len();
        self.attributes.push(Attribute {
            start,
            end: start,
            name: name.to_string(),
            props: rendered_props,
        });
        self.events.entry(start).or_default().push(id);
        self.open_by_name
            .entry(name.to_string())
            .or_default()
            .push(id);
        self.open_order.push(id);
        Ok(())
    }

    /// Closes the most recently opened span with this name.
    fn close_tag(&mut self, name: &str) -> Result<(), MarkupError> {
        let id = self
            .open_by_name
            .get_mut(name)
            .and_then(Vec::pop)
            .ok_or_else(|| MarkupError::UnopenedTag(name.to_string()))?;
        if let Some(pos) = self.open_order.iter().rposition(|&open| open == id) {
            self.open_order.remove(pos);
        }
        self.close_attribute(id);
        Ok(())
    }

    fn close_attribute(&mut self, id: usize) {
        let end = self.out.len();
        let attribute = &mut self.attributes[id];
        attribute.end = end;
        // A zero-length span is already in the event list at its open
        // position.
        if attribute.start != end {
            self.events.entry(end).or_default().push(id);
        }
    }

    /// Closes every open span, innermost first.
    fn close_all(&mut self) {
        while let Some(id) = self.open_order.pop() {
            if let Some(stack) = self.open_by_name.get_mut(&self.attributes[id].name) {
                stack.retain(|&open| open != id);
            }
            self.close_attribute(id);
        }
        self.open_by_name.clear();
    }

    /// Renders a property value into its own string. Markup inside a
    /// quoted value renders but does not produce spans over the output.
    fn eval_prop_value(&self, value: &PropValue) -> Result<String, MarkupError> {
        match value {
            PropValue::Subst(digits) => Ok(self.eval_subst(digits)),
            PropValue::String(parsed) => {
                let inner = LineRenderer::new(self.substs, self.rules);
                Ok(inner.render(parsed)?.text)
            }
        }
    }

    /// Finds the property with the given key.
    fn prop_value<'t>(
        &self,
        tag: &'t MarkupTag,
        key: &str,
    ) -> Result<&'t PropValue, MarkupError> {
        tag.props
            .iter()
            .find(|prop| prop.key == key)
            .map(|prop| &prop.value)
            .ok_or_else(|| MarkupError::BranchKeyMissing(key.to_string()))
    }

    fn render_select(&mut self, tag: &MarkupTag) -> Result<(), MarkupError> {
        let input = self.eval_prop_value(self.prop_value(tag, "value")?)?;
        let branch = self.prop_value(tag, &input)?;
        self.render_format_value(branch, &input)
    }

    fn render_plural(&mut self, tag: &MarkupTag, kind: PluralKind) -> Result<(), MarkupError> {
        let input = self.eval_prop_value(self.prop_value(tag, "value")?)?;
        let key = self.rules.branch_key(kind, &input)?;
        let branch = self.prop_value(tag, key)?;
        self.render_format_value(branch, &input)
    }

    /// Renders a format-function branch value. A bare `%` in the branch
    /// emits the input string.
    fn render_format_value(&mut self, value: &PropValue, input: &str) -> Result<(), MarkupError> {
        match value {
            PropValue::Subst(digits) => {
                let s = self.eval_subst(digits);
                self.out.push_str(&s);
                Ok(())
            }
            PropValue::String(parsed) => {
                for fragment in &parsed.fragments {
                    if matches!(fragment, Fragment::Text(t) if t == "%") {
                        self.out.push_str(input);
                        continue;
                    }
                    self.render_fragment(fragment)?;
                }
                Ok(())
            }
        }
    }
}
